//! RFC 6570 URI Templates.
//!
//! This module handles:
//! - Parsing template strings into literal and expression parts
//! - Expanding parsed templates with a set of variables
//! - Matching concrete URIs back against a template (unexpansion)

mod expand;
mod matcher;
mod parser;

use crate::error::{ExpandError, MatchError, ParseError};
use crate::value::Variables;
use std::fmt;
use std::str::FromStr;

pub use expand::escape;

/// A parsed URI template.
///
/// Immutable once parsed; [`expand`](UriTemplate::expand) and
/// [`unexpand`](UriTemplate::unexpand) only read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
	raw: String,
	parts: Vec<Part>,
}

/// One piece of a template, in left-to-right order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
	/// Text copied verbatim. May be empty between adjacent expressions.
	Literal(String),

	/// A `{...}` expression.
	Expression(Expression),
}

/// A `{...}` expression with the rendering rules of its operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
	/// Operator character, if any.
	pub operator: Option<char>,

	/// Inserted once before the first rendered term.
	pub lead: &'static str,

	/// Joins rendered terms, and the items of exploded values.
	pub separator: &'static str,

	/// Whether items render as `name=value`.
	pub named: bool,

	/// Appended to the name when a named value is empty.
	pub if_empty: &'static str,

	/// Whether reserved characters pass through unescaped.
	pub allow_reserved: bool,

	pub terms: Vec<Term>,
}

/// A variable specification inside an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
	pub name: String,

	/// `*` modifier.
	pub explode: bool,

	/// `:N` modifier. Zero means no truncation.
	pub prefix: usize,
}

impl UriTemplate {
	/// Parse a template string.
	pub fn parse(raw: &str) -> Result<Self, ParseError> {
		let parts = parser::parse_parts(raw)?;
		Ok(UriTemplate {
			raw: raw.to_string(),
			parts,
		})
	}

	/// The template string this was parsed from.
	pub fn as_str(&self) -> &str {
		&self.raw
	}

	pub fn parts(&self) -> &[Part] {
		&self.parts
	}

	/// Iterate over every term of every expression, in order.
	pub fn terms(&self) -> impl Iterator<Item = &Term> {
		self.parts
			.iter()
			.filter_map(|part| match part {
				Part::Literal(_) => None,
				Part::Expression(expr) => Some(expr.terms.iter()),
			})
			.flatten()
	}

	/// Expand the template with the given variables.
	///
	/// Variables missing from `values` are skipped silently.
	pub fn expand(&self, values: &Variables) -> Result<String, ExpandError> {
		let mut result = String::new();
		for part in &self.parts {
			match part {
				Part::Literal(text) => result.push_str(text),
				Part::Expression(expr) => result.push_str(&expr.expand(values)?),
			}
		}
		Ok(result)
	}

	/// The anchored regular expression that [`unexpand`](UriTemplate::unexpand) matches against.
	pub fn pattern(&self) -> String {
		matcher::build_pattern(&self.parts)
	}

	/// Recover variable values from a URI produced by this template.
	pub fn unexpand(&self, uri: &str) -> Result<Variables, MatchError> {
		matcher::unexpand(&self.parts, uri)
	}
}

impl FromStr for UriTemplate {
	type Err = ParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		UriTemplate::parse(s)
	}
}

impl fmt::Display for UriTemplate {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.raw)
	}
}

impl fmt::Display for Term {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.name)?;
		if self.explode {
			f.write_str("*")?;
		}
		if self.prefix > 0 {
			write!(f, ":{}", self.prefix)?;
		}
		Ok(())
	}
}

impl fmt::Display for Expression {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("{")?;
		if let Some(op) = self.operator {
			write!(f, "{op}")?;
		}
		for (i, term) in self.terms.iter().enumerate() {
			if i > 0 {
				f.write_str(",")?;
			}
			write!(f, "{term}")?;
		}
		f.write_str("}")
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::value::Value;

	fn vars(pairs: &[(&str, Value)]) -> Variables {
		pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.clone()))
			.collect()
	}

	#[test]
	fn test_parse_is_deterministic() {
		let raw = "http://example.com/{user}{/path*}{?q,lang:2}#x";
		assert_eq!(UriTemplate::parse(raw).unwrap(), UriTemplate::parse(raw).unwrap());
	}

	#[test]
	fn test_display_roundtrips_raw() {
		let raw = "/repos{/owner,repo}{?page}";
		let template: UriTemplate = raw.parse().unwrap();
		assert_eq!(template.to_string(), raw);
		assert_eq!(template.as_str(), raw);
	}

	#[test]
	fn test_expression_display() {
		let template = UriTemplate::parse("{;list*,var:3}").unwrap();
		match &template.parts()[1] {
			Part::Expression(expr) => assert_eq!(expr.to_string(), "{;list*,var:3}"),
			other => panic!("Expected expression, got {other:?}"),
		}
	}

	#[test]
	fn test_terms_iterates_all_expressions() {
		let template = UriTemplate::parse("a{x}b{/y,z*}").unwrap();
		let names: Vec<_> = template.terms().map(|t| t.name.as_str()).collect();
		assert_eq!(names, vec!["x", "y", "z"]);
	}

	#[test]
	fn test_literal_only_expands_to_itself() {
		let template = UriTemplate::parse("http://example.com/static/path").unwrap();
		let values = vars(&[("var", Value::from("value"))]);
		assert_eq!(template.expand(&values).unwrap(), "http://example.com/static/path");
		assert_eq!(template.expand(&Variables::new()).unwrap(), "http://example.com/static/path");
	}

	#[test]
	fn test_missing_variable_expands_empty() {
		let template = UriTemplate::parse("{name}").unwrap();
		assert_eq!(template.expand(&Variables::new()).unwrap(), "");
	}

	#[test]
	fn test_template_is_reusable() {
		let template = UriTemplate::parse("{/list*}").unwrap();
		let values = vars(&[("list", Value::from(["red", "green", "blue"]))]);
		let expanded = template.expand(&values).unwrap();
		assert_eq!(expanded, "/red/green/blue");
		assert_eq!(template.expand(&values).unwrap(), expanded);
		assert_eq!(template.unexpand(&expanded).unwrap(), values);
		assert_eq!(template.unexpand(&expanded).unwrap(), values);
	}

	#[test]
	fn test_template_is_send_and_sync() {
		fn assert_send_sync<T: Send + Sync>() {}
		assert_send_sync::<UriTemplate>();
	}
}
