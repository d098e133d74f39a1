use super::{Expression, Part, Term};
use crate::error::MatchError;
use crate::value::{Value, Variables};
use regex::Regex;

const UNRESERVED: &str = r"(?:[A-Za-z0-9\-._~]|%[0-9A-Fa-f]{2})";
const UNRESERVED_NO_DOT: &str = r"(?:[A-Za-z0-9\-_~]|%[0-9A-Fa-f]{2})";
const RESERVED: &str = r"(?:[A-Za-z0-9\-._~:/?#\[\]@!$&'()*+,;=]|%[0-9A-Fa-f]{2})";

/// Build the anchored pattern for a whole template.
///
/// Each term contributes exactly one capturing group, in template order.
pub(super) fn build_pattern(parts: &[Part]) -> String {
	let mut pattern = String::from("^");
	for part in parts {
		match part {
			Part::Literal(text) => pattern.push_str(&regex::escape(text)),
			Part::Expression(expr) => pattern.push_str(&expr.pattern()),
		}
	}
	pattern.push('$');
	pattern
}

/// Match `uri` against the template and decode the captured values.
pub(super) fn unexpand(parts: &[Part], uri: &str) -> Result<Variables, MatchError> {
	let pattern = build_pattern(parts);
	let regex = Regex::new(&pattern).map_err(|source| MatchError::InvalidPattern {
		pattern: pattern.clone(),
		source,
	})?;

	tracing::debug!(pattern = %pattern, uri = %uri, "Matching URI against template");

	let captures = regex.captures(uri).ok_or_else(|| MatchError::NoMatch {
		uri: uri.to_string(),
	})?;
	let mut groups = captures.iter().skip(1).map(|m| m.map(|m| m.as_str()));

	let mut values = Variables::new();
	for part in parts {
		let Part::Expression(expr) = part else {
			continue;
		};
		for term in &expr.terms {
			// Groups that did not participate leave the variable undefined.
			if let Some(captured) = groups.next().flatten() {
				expr.decode(term, captured, &mut values);
			}
		}
	}

	tracing::debug!(variables = values.len(), "Decoded URI");
	Ok(values)
}

/// Percent-decode, replacing invalid UTF-8 rather than failing.
fn percent_decode(s: &str) -> String {
	match urlencoding::decode(s) {
		Ok(decoded) => decoded.into_owned(),
		Err(_) => String::from_utf8_lossy(&urlencoding::decode_binary(s.as_bytes())).into_owned(),
	}
}

impl Expression {
	/// Whether terms decode by splitting on `name=value` pairs.
	fn decodes_pairs(&self) -> bool {
		!self.allow_reserved && matches!(self.separator, ";" | "&")
	}

	/// Non-greedy pattern for a single item of this expression.
	fn item_pattern(&self) -> String {
		if self.allow_reserved {
			return format!("{RESERVED}*?");
		}
		match self.separator {
			"." => format!("{UNRESERVED_NO_DOT}*?"),
			";" => format!("{UNRESERVED}*?=?{UNRESERVED}*?"),
			"&" => format!("{UNRESERVED}*?={UNRESERVED}*?"),
			_ => format!("{UNRESERVED}*?"),
		}
	}

	/// Pattern for the whole expression. An expression that rendered nothing
	/// (no lead character either) matches the empty string.
	fn pattern(&self) -> String {
		let item = self.item_pattern();
		let separator = regex::escape(self.separator);
		let groups = self
			.terms
			.iter()
			.map(|term| {
				if term.explode {
					format!("({item}(?:{separator}{item})*)?")
				} else {
					format!("({item})?")
				}
			})
			.collect::<Vec<_>>()
			.join(&separator);

		format!("(?:{}{groups})?", regex::escape(self.lead))
	}

	/// Decode one captured group into `values`.
	fn decode(&self, term: &Term, captured: &str, values: &mut Variables) {
		if !self.decodes_pairs() {
			let value = if term.explode && !captured.is_empty() {
				Value::List(captured.split(self.separator).map(percent_decode).collect())
			} else {
				Value::String(percent_decode(captured))
			};
			values.insert(term.name.clone(), value);
			return;
		}

		if captured.is_empty() {
			return;
		}

		if !term.explode {
			// The captured key wins over the declared term name.
			let (key, value) = captured.split_once('=').unwrap_or((captured, ""));
			values.insert(percent_decode(key), Value::String(percent_decode(value)));
			return;
		}

		let pairs: Vec<(String, String)> = captured
			.split(self.separator)
			.map(|piece| match piece.split_once('=') {
				Some((key, value)) => (percent_decode(key), percent_decode(value)),
				None => (percent_decode(piece), String::new()),
			})
			.collect();

		// `name=a;name=b` is an exploded list, anything else a map.
		let value = if pairs.iter().all(|(key, _)| *key == term.name) {
			Value::List(pairs.into_iter().map(|(_, value)| value).collect())
		} else {
			Value::Map(pairs.into_iter().collect())
		};
		values.insert(term.name.clone(), value);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::template::UriTemplate;

	fn unexpand(template: &str, uri: &str) -> Variables {
		UriTemplate::parse(template).unwrap().unexpand(uri).unwrap()
	}

	fn vars(pairs: Vec<(&str, Value)>) -> Variables {
		pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
	}

	#[test]
	fn test_pattern_compiles_for_every_operator() {
		for raw in [
			"{x}", "{+x}", "{#x}", "{.x}", "{/x}", "{;x}", "{?x}", "{&x}", "{x*}", "{+x*}",
			"{.x*}", "{/x*}", "{;x*}", "{?x*}", "{&x*}", "a.b(c)[d]{x}$",
		] {
			let pattern = UriTemplate::parse(raw).unwrap().pattern();
			assert!(Regex::new(&pattern).is_ok(), "pattern for {raw}: {pattern}");
		}
	}

	#[test]
	fn test_pattern_escapes_literals() {
		let pattern = UriTemplate::parse("a.b?c").unwrap().pattern();
		assert_eq!(pattern, r"^a\.b\?c$");
	}

	#[test]
	fn test_unexpand_simple() {
		assert_eq!(
			unexpand("start~{contentType}", "start~vod"),
			vars(vec![("contentType", Value::from("vod"))])
		);
		assert_eq!(
			unexpand("{var}", "value"),
			vars(vec![("var", Value::from("value"))])
		);
		assert_eq!(
			unexpand("{hello}", "Hello%20World%21")["hello"].as_str(),
			Some("Hello World!")
		);
	}

	#[test]
	fn test_unexpand_exploded_lists() {
		assert_eq!(
			unexpand("X{.list*}", "X.a.b.c"),
			vars(vec![("list", Value::from(["a", "b", "c"]))])
		);
		assert_eq!(
			unexpand("{/list*}", "/red/green/blue"),
			vars(vec![("list", Value::from(["red", "green", "blue"]))])
		);
		assert_eq!(
			unexpand("{path*}Taa", "a,cb,cTaa"),
			vars(vec![("path", Value::from(["a", "cb", "c"]))])
		);
		assert_eq!(
			unexpand("{+list*}", "a/b,c%20d"),
			vars(vec![("list", Value::from(["a/b", "c d"]))])
		);
	}

	#[test]
	fn test_unexpand_named_list() {
		assert_eq!(
			unexpand("{;list*}", ";list=red;list=green;list=blue"),
			vars(vec![("list", Value::from(["red", "green", "blue"]))])
		);
		assert_eq!(
			unexpand("{?list*}", "?list=red&list=green"),
			vars(vec![("list", Value::from(["red", "green"]))])
		);
	}

	#[test]
	fn test_unexpand_named_map() {
		assert_eq!(
			unexpand("{;keys*}", ";a=red;b=green;c"),
			vars(vec![(
				"keys",
				[("a", "red"), ("b", "green"), ("c", "")].into_iter().collect()
			)])
		);
		assert_eq!(
			unexpand("/a{/path*}{?events*}", "/a/b/c/d?123=start~one&342=asd"),
			vars(vec![
				("path", Value::from(["b", "c", "d"])),
				(
					"events",
					[("123", "start~one"), ("342", "asd")].into_iter().collect()
				),
			])
		);
	}

	#[test]
	fn test_unexpand_named_scalars_use_captured_key() {
		assert_eq!(
			unexpand("{;x,y,empty}", ";x=10;y=34;empty"),
			vars(vec![
				("empty", Value::from("")),
				("x", Value::from("10")),
				("y", Value::from("34")),
			])
		);
		// The declared name `x` is replaced by the key found in the URI.
		assert_eq!(
			unexpand("{;x}", ";other=5"),
			vars(vec![("other", Value::from("5"))])
		);
		assert_eq!(
			unexpand("?fixed=yes{&x}", "?fixed=yes&x=1024"),
			vars(vec![("x", Value::from("1024"))])
		);
	}

	#[test]
	fn test_unexpand_absent_expression_is_undefined() {
		assert_eq!(unexpand("/a{/path*}{?q}", "/a/b"), vars(vec![("path", Value::from(["b"]))]));
		assert_eq!(unexpand("/a{?q}", "/a"), Variables::new());
	}

	#[test]
	fn test_unexpand_no_match() {
		let template = UriTemplate::parse("/users/{id}").unwrap();
		match template.unexpand("/groups/42").unwrap_err() {
			MatchError::NoMatch { uri } => assert_eq!(uri, "/groups/42"),
			other => panic!("Expected NoMatch error, got {other:?}"),
		}
		// The whole string has to match, not a prefix.
		assert!(matches!(
			template.unexpand("/users/42/extra"),
			Err(MatchError::NoMatch { .. })
		));
	}

	#[test]
	fn test_roundtrip_unnamed_operators() {
		let printable: String = (0x20u8..0x7f).map(char::from).collect();
		let samples = ["value", "Hello World!", "50%", "a/b?c#d", "é~x", printable.as_str()];

		for raw in ["{x}", "{+x}", "{#x}", "{.x}", "{/x}", "{x,y}", "{/x,y}", "{.x,y}"] {
			let template = UriTemplate::parse(raw).unwrap();
			let separator = match &template.parts()[1] {
				Part::Expression(expr) => expr.separator,
				other => panic!("Expected expression, got {other:?}"),
			};

			for sample in samples {
				let value: String = sample.chars().filter(|c| !separator.contains(*c)).collect();
				let values: Variables = template
					.terms()
					.map(|term| (term.name.clone(), Value::from(value.as_str())))
					.collect();

				let expanded = template.expand(&values).unwrap();
				assert_eq!(
					template.unexpand(&expanded).unwrap(),
					values,
					"{raw} with {value:?} expanded to {expanded:?}"
				);
			}
		}
	}

	#[test]
	fn test_percent_decode_lossy() {
		assert_eq!(percent_decode("a%20b"), "a b");
		assert_eq!(percent_decode("a+b"), "a+b");
		assert_eq!(percent_decode("%FF"), "\u{FFFD}");
	}
}
