use super::{Expression, Part, Term};
use crate::error::ParseError;
use regex::Regex;
use std::sync::LazyLock;

static VALID_NAME: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^(?:[A-Za-z0-9_.]|%[0-9A-Fa-f]{2})+$").expect("variable name pattern compiles")
});

/// Split a raw template into alternating literal and expression parts.
///
/// The result always starts and ends with a literal, so a template with `n`
/// expressions yields `2n + 1` parts.
pub(super) fn parse_parts(raw: &str) -> Result<Vec<Part>, ParseError> {
	let mut segments = raw.split('{');
	let leading = segments.next().unwrap_or_default();
	check_leading_literal(leading)?;

	let mut parts = vec![Part::Literal(leading.to_string())];
	for segment in segments {
		let (expression, literal) = split_expression(segment)?;
		parts.push(Part::Expression(parse_expression(expression)?));
		parts.push(Part::Literal(literal.to_string()));
	}

	Ok(parts)
}

/// Reject a stray `}` and a `:` after a `/` before the first expression.
fn check_leading_literal(literal: &str) -> Result<(), ParseError> {
	if literal.contains('}') {
		return Err(ParseError::UnexpectedClosingBrace);
	}
	if let Some((before, _)) = literal.split_once(':')
		&& before.contains('/')
	{
		return Err(ParseError::UnexpectedColon {
			literal: literal.to_string(),
		});
	}
	Ok(())
}

/// Split `expr}literal` at its only closing brace.
fn split_expression(segment: &str) -> Result<(&str, &str), ParseError> {
	let Some((expression, literal)) = segment.split_once('}') else {
		return Err(ParseError::UnclosedExpression {
			expression: segment.to_string(),
		});
	};
	if literal.contains('}') {
		return Err(ParseError::UnexpectedClosingBrace);
	}
	Ok((expression, literal))
}

/// Parse the inside of a `{...}` expression.
pub(super) fn parse_expression(expression: &str) -> Result<Expression, ParseError> {
	let operator = match expression.chars().next() {
		Some(c @ ('+' | '.' | '/' | ';' | '?' | '&' | '#')) => Some(c),
		_ => None,
	};
	let body = match operator {
		Some(op) => &expression[op.len_utf8()..],
		None => expression,
	};

	let terms = body
		.split(',')
		.map(parse_term)
		.collect::<Result<Vec<_>, _>>()?;

	Ok(Expression::new(operator, terms))
}

/// Parse one variable specification: `name`, `name*` or `name:N`.
pub(super) fn parse_term(raw: &str) -> Result<Term, ParseError> {
	let (body, explode) = match raw.strip_suffix('*') {
		Some(body) => (body, true),
		None => (raw, false),
	};

	let (name, prefix) = match body.split_once(':') {
		None => (body, 0),
		Some((_, rest)) if rest.contains(':') => {
			return Err(ParseError::MultipleColons {
				term: raw.to_string(),
			});
		}
		Some((name, digits)) => {
			let prefix = digits
				.parse::<usize>()
				.map_err(|source| ParseError::InvalidPrefix {
					term: raw.to_string(),
					source,
				})?;
			(name, prefix)
		}
	};

	if !VALID_NAME.is_match(name) {
		return Err(ParseError::InvalidName {
			name: name.to_string(),
		});
	}

	if explode && prefix > 0 {
		return Err(ParseError::ExplodeWithPrefix {
			name: name.to_string(),
		});
	}

	Ok(Term {
		name: name.to_string(),
		explode,
		prefix,
	})
}

impl Expression {
	/// Build an expression, deriving the rendering rules from its operator.
	pub fn new(operator: Option<char>, terms: Vec<Term>) -> Self {
		let (lead, separator, named, if_empty, allow_reserved) = match operator {
			Some('+') => ("", ",", false, "", true),
			Some('.') => (".", ".", false, "", false),
			Some('/') => ("/", "/", false, "", false),
			Some(';') => (";", ";", true, "", false),
			Some('?') => ("?", "&", true, "=", false),
			Some('&') => ("&", "&", true, "=", false),
			Some('#') => ("#", ",", false, "", true),
			_ => ("", ",", false, "", false),
		};

		Expression {
			operator,
			lead,
			separator,
			named,
			if_empty,
			allow_reserved,
			terms,
		}
	}
}
