use std::num::ParseIntError;
use std::path::PathBuf;

/// Errors raised while parsing a template string.
///
/// Every variant aborts parsing; no partial template is produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
	#[error("unexpected '}}' outside of an expression")]
	UnexpectedClosingBrace,

	#[error("unexpected ':' in leading literal {literal:?}")]
	UnexpectedColon { literal: String },

	#[error("malformed expression {expression:?}: expected exactly one closing '}}'")]
	UnclosedExpression { expression: String },

	#[error("not a valid variable name: {name:?}")]
	InvalidName { name: String },

	#[error("multiple colons in the same term: {term:?}")]
	MultipleColons { term: String },

	#[error("invalid prefix length in term {term:?}")]
	InvalidPrefix {
		term: String,
		#[source]
		source: ParseIntError,
	},

	#[error("both explode and prefix modifiers on term {name:?}")]
	ExplodeWithPrefix { name: String },
}

/// Errors raised while expanding a parsed template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpandError {
	#[error("cannot truncate a map expansion: {name}")]
	TruncatedMap { name: String },
}

/// Errors raised while matching a URI back against a template.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
	#[error("no match for {uri:?}")]
	NoMatch { uri: String },

	#[error("template pattern failed to compile: {pattern}")]
	InvalidPattern {
		pattern: String,
		#[source]
		source: regex::Error,
	},
}

/// Crate-level structured errors.
///
/// The template operations return the narrower [`ParseError`], [`ExpandError`]
/// and [`MatchError`]; this type additionally covers fixture and config files.
/// The CLI binary wraps these with `anyhow` for context chains.
#[derive(Debug, thiserror::Error)]
pub enum UriTemplateError {
	#[error(transparent)]
	Parse(#[from] ParseError),

	#[error(transparent)]
	Expand(#[from] ExpandError),

	#[error(transparent)]
	Match(#[from] MatchError),

	#[error("Invalid template {name:?}: {template}")]
	InvalidTemplate {
		name: String,
		template: String,
		#[source]
		source: ParseError,
	},

	#[error("Unknown template name: {name}")]
	UnknownTemplate { name: String },

	#[error("Failed to read file: {path}")]
	ReadError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse config file: {path}")]
	ConfigParseError {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("Failed to parse fixture file: {path}")]
	FixtureParseError {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("Failed to resolve home directory")]
	HomeDirectoryNotFound,
}

/// Result type alias using UriTemplateError.
pub type Result<T> = std::result::Result<T, UriTemplateError>;
