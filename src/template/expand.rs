use super::{Expression, Term};
use crate::error::ExpandError;
use crate::value::{Value, Variables};
use std::collections::BTreeMap;

const HEX: &[u8; 16] = b"0123456789ABCDEF";

/// `A-Za-z0-9-._~`
fn is_unreserved(b: u8) -> bool {
	b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~')
}

/// Unreserved plus gen-delims and sub-delims.
fn is_reserved(b: u8) -> bool {
	is_unreserved(b)
		|| matches!(
			b,
			b':' | b'/' | b'?' | b'#' | b'[' | b']' | b'@' // gen-delims
				| b'!' | b'$' | b'&' | b'\'' | b'(' | b')'
				| b'*' | b'+' | b',' | b';' | b'='
		)
}

/// Percent-encode every byte of `s` outside the allowed class.
///
/// The class is the reserved set when `allow_reserved` is true, otherwise the
/// unreserved set. Multi-byte characters are encoded byte by byte.
pub fn escape(s: &str, allow_reserved: bool) -> String {
	let allowed = if allow_reserved {
		is_reserved
	} else {
		is_unreserved
	};

	let mut escaped = String::with_capacity(s.len());
	for &b in s.as_bytes() {
		if allowed(b) {
			escaped.push(b as char);
		} else {
			escaped.push('%');
			escaped.push(HEX[(b >> 4) as usize] as char);
			escaped.push(HEX[(b & 0x0f) as usize] as char);
		}
	}
	escaped
}

/// Keep the first `prefix` characters of `s`. Zero keeps everything.
fn truncate(s: &str, prefix: usize) -> &str {
	if prefix == 0 {
		return s;
	}
	match s.char_indices().nth(prefix) {
		Some((end, _)) => &s[..end],
		None => s,
	}
}

impl Expression {
	/// Render this expression, or the empty string if no term produced output.
	pub(super) fn expand(&self, values: &Variables) -> Result<String, ExpandError> {
		let mut rendered = Vec::with_capacity(self.terms.len());

		for term in &self.terms {
			let Some(value) = values.get(&term.name) else {
				continue;
			};

			let next = match value {
				Value::String(s) => self.expand_string(term, s),
				Value::List(items) => self.expand_list(term, items),
				Value::Map(pairs) => {
					if term.prefix > 0 {
						return Err(ExpandError::TruncatedMap {
							name: term.name.clone(),
						});
					}
					self.expand_map(term, pairs)
				}
			};

			if !next.is_empty() {
				rendered.push(next);
			}
		}

		if rendered.is_empty() {
			return Ok(String::new());
		}
		Ok(format!("{}{}", self.lead, rendered.join(self.separator)))
	}

	/// `name=` prefix for named operators, empty otherwise.
	fn expand_name(&self, name: &str, empty: bool) -> String {
		if !self.named {
			String::new()
		} else if empty {
			format!("{name}{}", self.if_empty)
		} else {
			format!("{name}=")
		}
	}

	fn expand_string(&self, term: &Term, s: &str) -> String {
		let s = truncate(s, term.prefix);
		self.expand_name(&term.name, s.is_empty()) + &escape(s, self.allow_reserved)
	}

	fn expand_list(&self, term: &Term, items: &[String]) -> String {
		if term.explode {
			return items
				.iter()
				.map(|item| self.expand_string(term, item))
				.collect::<Vec<_>>()
				.join(self.separator);
		}

		let joined = items
			.iter()
			.map(|item| escape(truncate(item, term.prefix), self.allow_reserved))
			.collect::<Vec<_>>()
			.join(",");
		self.expand_name(&term.name, items.is_empty()) + &joined
	}

	fn expand_map(&self, term: &Term, pairs: &BTreeMap<String, String>) -> String {
		let escaped = pairs
			.iter()
			.map(|(k, v)| (escape(k, self.allow_reserved), escape(v, self.allow_reserved)));

		if term.explode {
			return escaped
				.map(|(k, v)| format!("{k}={v}"))
				.collect::<Vec<_>>()
				.join(self.separator);
		}

		let joined = escaped
			.map(|(k, v)| format!("{k},{v}"))
			.collect::<Vec<_>>()
			.join(",");
		self.expand_name(&term.name, pairs.is_empty()) + &joined
	}
}
