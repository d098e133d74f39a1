//! uritemplates - RFC 6570 level 4 URI Templates.
//!
//! This library provides:
//! - Template parsing into literal and expression parts
//! - Expansion of a parsed template with string, list and map variables
//! - Unexpansion: recovering variables from a URI that matches a template
//! - Conformance fixture loading and a `.uritemplate.toml` config cascade
//!   used by the `uritemplate` CLI
//!
//! # Example
//!
//! ```
//! use uritemplates::{UriTemplate, Value, Variables};
//!
//! let template = UriTemplate::parse("https://api.github.com/repos{/user,repo}{?page}").unwrap();
//!
//! let mut values = Variables::new();
//! values.insert("user".to_string(), Value::from("jtacoma"));
//! values.insert("repo".to_string(), Value::from("uritemplates"));
//!
//! let uri = template.expand(&values).unwrap();
//! assert_eq!(uri, "https://api.github.com/repos/jtacoma/uritemplates");
//! assert_eq!(template.unexpand(&uri).unwrap(), values);
//! ```

pub mod config;
pub mod error;
pub mod fixtures;
pub mod template;
pub mod value;

pub use error::{ExpandError, MatchError, ParseError, Result, UriTemplateError};
pub use template::{Expression, Part, Term, UriTemplate};
pub use value::{Value, Variables};
