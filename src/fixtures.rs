//! Conformance fixtures in the uritemplate-test JSON format.
//!
//! A fixture file is an object keyed by group title. Each group carries the
//! variables shared by its cases and a list of `[template, expected]` pairs,
//! where `expected` is a string, a list of acceptable strings, or `false` when
//! the template must fail to parse or expand.

use crate::error::{ExpandError, ParseError, Result, UriTemplateError};
use crate::template::UriTemplate;
use crate::value::{Variables, deserialize_variables};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// What a test case expects from parsing and expanding its template.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawExpected")]
pub enum Expected {
	/// Exactly this expansion.
	Output(String),

	/// Any of these expansions (map ordering varies between implementations).
	AnyOf(Vec<String>),

	/// Parsing or expanding must fail.
	Failure,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawExpected {
	One(String),
	Many(Vec<String>),
	Flag(bool),
}

impl From<RawExpected> for Expected {
	fn from(raw: RawExpected) -> Self {
		match raw {
			RawExpected::One(s) => Expected::Output(s),
			RawExpected::Many(all) => Expected::AnyOf(all),
			RawExpected::Flag(_) => Expected::Failure,
		}
	}
}

impl fmt::Display for Expected {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Expected::Output(s) => write!(f, "{s:?}"),
			Expected::AnyOf(all) => write!(f, "one of {all:?}"),
			Expected::Failure => f.write_str("a failure"),
		}
	}
}

/// A single `[template, expected]` test case.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "(String, Expected)")]
pub struct FixtureCase {
	pub template: String,
	pub expected: Expected,
}

impl From<(String, Expected)> for FixtureCase {
	fn from((template, expected): (String, Expected)) -> Self {
		FixtureCase { template, expected }
	}
}

/// A titled group of cases sharing one set of variables.
#[derive(Debug, Clone)]
pub struct FixtureGroup {
	pub title: String,
	pub variables: Variables,
	pub cases: Vec<FixtureCase>,
}

#[derive(Deserialize)]
struct RawGroup {
	#[serde(default, deserialize_with = "deserialize_variables")]
	variables: Variables,

	#[serde(default)]
	testcases: Vec<FixtureCase>,
}

/// The result of parsing and expanding one case's template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
	Expanded(String),
	ParseFailed(ParseError),
	ExpandFailed(ExpandError),
}

impl fmt::Display for Outcome {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Outcome::Expanded(s) => write!(f, "{s:?}"),
			Outcome::ParseFailed(e) => write!(f, "parse error: {e}"),
			Outcome::ExpandFailed(e) => write!(f, "expand error: {e}"),
		}
	}
}

impl Expected {
	/// Whether `outcome` satisfies this expectation.
	pub fn accepts(&self, outcome: &Outcome) -> bool {
		match (self, outcome) {
			(Expected::Failure, Outcome::Expanded(_)) => false,
			(Expected::Failure, _) => true,
			(Expected::Output(want), Outcome::Expanded(got)) => want == got,
			(Expected::AnyOf(all), Outcome::Expanded(got)) => all.contains(got),
			_ => false,
		}
	}
}

impl FixtureCase {
	/// Parse and expand this case's template.
	pub fn run(&self, variables: &Variables) -> Outcome {
		let template = match UriTemplate::parse(&self.template) {
			Ok(template) => template,
			Err(e) => return Outcome::ParseFailed(e),
		};
		match template.expand(variables) {
			Ok(expanded) => Outcome::Expanded(expanded),
			Err(e) => Outcome::ExpandFailed(e),
		}
	}
}

/// A case whose outcome did not match its expectation.
#[derive(Debug, Clone)]
pub struct FixtureFailure {
	pub group: String,
	pub template: String,
	pub expected: Expected,
	pub outcome: Outcome,
}

impl fmt::Display for FixtureFailure {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{}: {}: expected {}, but got {}",
			self.group, self.template, self.expected, self.outcome
		)
	}
}

/// Totals for a fixture run.
#[derive(Debug, Clone, Default)]
pub struct FixtureReport {
	pub passed: usize,
	pub failures: Vec<FixtureFailure>,
}

impl FixtureReport {
	pub fn total(&self) -> usize {
		self.passed + self.failures.len()
	}

	pub fn is_success(&self) -> bool {
		self.failures.is_empty()
	}

	/// Fold another report into this one.
	pub fn merge(&mut self, other: FixtureReport) {
		self.passed += other.passed;
		self.failures.extend(other.failures);
	}
}

/// Parse fixture groups from a JSON string. `path` is only used in errors.
pub fn parse_fixture_str(content: &str, path: &Path) -> Result<Vec<FixtureGroup>> {
	let raw: BTreeMap<String, RawGroup> =
		serde_json::from_str(content).map_err(|source| UriTemplateError::FixtureParseError {
			path: path.to_path_buf(),
			source,
		})?;

	Ok(raw
		.into_iter()
		.map(|(title, group)| FixtureGroup {
			title,
			variables: group.variables,
			cases: group.testcases,
		})
		.collect())
}

/// Load fixture groups from a JSON file.
pub fn load_fixture_file(path: &Path) -> Result<Vec<FixtureGroup>> {
	let content = std::fs::read_to_string(path).map_err(|source| UriTemplateError::ReadError {
		path: path.to_path_buf(),
		source,
	})?;

	parse_fixture_str(&content, path)
}

/// Run every case of every group.
pub fn run_groups(groups: &[FixtureGroup]) -> FixtureReport {
	let mut report = FixtureReport::default();

	for group in groups {
		for case in &group.cases {
			let outcome = case.run(&group.variables);
			if case.expected.accepts(&outcome) {
				report.passed += 1;
				continue;
			}

			tracing::debug!(group = %group.title, template = %case.template, "Fixture case failed");
			report.failures.push(FixtureFailure {
				group: group.title.clone(),
				template: case.template.clone(),
				expected: case.expected.clone(),
				outcome,
			});
		}
	}

	report
}
