use std::path::PathBuf;
use uritemplates::fixtures::{FixtureReport, load_fixture_file, run_groups};

fn run_fixture(name: &str) -> FixtureReport {
	let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
		.join("tests")
		.join("fixtures")
		.join(name);
	let groups = load_fixture_file(&path).unwrap();
	assert!(!groups.is_empty(), "{name} has no groups");
	run_groups(&groups)
}

fn assert_all_pass(report: &FixtureReport) {
	let messages: Vec<String> = report.failures.iter().map(|f| f.to_string()).collect();
	assert!(report.is_success(), "failures:\n{}", messages.join("\n"));
	assert!(report.passed > 0);
}

#[test]
fn test_spec_examples() {
	let report = run_fixture("spec-examples.json");
	assert_all_pass(&report);
}

#[test]
fn test_extended() {
	let report = run_fixture("extended-tests.json");
	assert_all_pass(&report);
}

#[test]
fn test_negative() {
	let report = run_fixture("negative-tests.json");
	assert_all_pass(&report);
}
