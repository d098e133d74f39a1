use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use uritemplates::config::{MergedConfig, discover_configs, load_merged_config, user_config_path};
use uritemplates::fixtures::{FixtureReport, load_fixture_file, run_groups};
use uritemplates::{Part, UriTemplate, Value, Variables};

#[derive(Parser)]
#[command(name = "uritemplate")]
#[command(
	author,
	version,
	about = "Expand RFC 6570 URI templates and match URIs against them"
)]
#[command(arg_required_else_help = true)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	/// Print debug logs to stderr
	#[arg(short, long, global = true)]
	verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
	/// Expand a template (or a configured `@name`) with variables
	Expand {
		/// Template string, or `@name` of a configured template
		template: String,

		/// Set a variable; repeat a name to build a list
		#[arg(long = "var", value_name = "NAME=VALUE")]
		vars: Vec<String>,

		/// TOML file of variables
		#[arg(long = "vars", value_name = "FILE")]
		vars_file: Option<PathBuf>,
	},

	/// Recover variables from a URI, printed as JSON
	Unexpand {
		/// Template string, or `@name` of a configured template
		template: String,

		/// URI to match against the template
		uri: String,
	},

	/// Show the parts of a template and its matching pattern
	Parse {
		/// Template string, or `@name` of a configured template
		template: String,
	},

	/// Run conformance fixture files
	Test {
		/// JSON fixture files
		#[arg(required = true)]
		fixtures: Vec<PathBuf>,
	},

	/// Configuration management commands
	Config {
		#[command(subcommand)]
		action: ConfigAction,
	},
}

#[derive(Subcommand)]
enum ConfigAction {
	/// Display every config file in the cascade with its templates and variables
	Show,
	/// Check all config files for errors
	Validate,
}

fn main() -> ExitCode {
	let cli = Cli::parse();
	init_tracing(cli.verbose);

	match run(cli) {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:?}");
			ExitCode::FAILURE
		}
	}
}

fn init_tracing(verbose: bool) {
	let default_filter = if verbose { "uritemplates=debug" } else { "warn" };
	tracing_subscriber::registry()
		.with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();
}

fn run(cli: Cli) -> Result<ExitCode> {
	match cli.command {
		Commands::Expand {
			template,
			vars,
			vars_file,
		} => handle_expand(&template, &vars, vars_file.as_deref()),
		Commands::Unexpand { template, uri } => handle_unexpand(&template, &uri),
		Commands::Parse { template } => handle_parse(&template),
		Commands::Test { fixtures } => handle_test(&fixtures),
		Commands::Config { action } => match action {
			ConfigAction::Show => handle_config_show(),
			ConfigAction::Validate => handle_config_validate(),
		},
	}
}

fn load_config() -> Result<MergedConfig> {
	let cwd = std::env::current_dir().context("Failed to get current directory")?;
	load_merged_config(&cwd).context("Failed to load configuration")
}

/// Parse a template argument, resolving `@name` through the config cascade.
fn resolve_template(arg: &str, config: &MergedConfig) -> Result<UriTemplate> {
	if let Some(name) = arg.strip_prefix('@') {
		return Ok(config.template(name)?.clone());
	}
	UriTemplate::parse(arg).with_context(|| format!("Failed to parse template: {arg}"))
}

/// Parse `NAME=VALUE` arguments. A repeated name turns into a list.
fn parse_var_args(args: &[String]) -> Result<Variables> {
	let mut collected: BTreeMap<&str, Vec<String>> = BTreeMap::new();

	for arg in args {
		let (name, value) = arg
			.split_once('=')
			.ok_or_else(|| anyhow::anyhow!("Expected NAME=VALUE, got: {arg}"))?;
		collected.entry(name).or_default().push(value.to_string());
	}

	Ok(collected
		.into_iter()
		.map(|(name, mut items)| {
			let value = if items.len() == 1 {
				Value::String(items.remove(0))
			} else {
				Value::List(items)
			};
			(name.to_string(), value)
		})
		.collect())
}

fn read_vars_file(path: &Path) -> Result<Variables> {
	let content = std::fs::read_to_string(path)
		.with_context(|| format!("Failed to read {}", path.display()))?;
	toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn handle_expand(template: &str, var_args: &[String], vars_file: Option<&Path>) -> Result<ExitCode> {
	let config = load_config()?;
	let template = resolve_template(template, &config)?;

	// Config defaults, then the vars file, then --var
	let mut values = config.variables.clone();
	if let Some(path) = vars_file {
		values.extend(read_vars_file(path)?);
	}
	values.extend(parse_var_args(var_args)?);

	let expanded = template
		.expand(&values)
		.with_context(|| format!("Failed to expand template: {template}"))?;

	println!("{}", expanded);
	Ok(ExitCode::SUCCESS)
}

fn handle_unexpand(template: &str, uri: &str) -> Result<ExitCode> {
	let config = load_config()?;
	let template = resolve_template(template, &config)?;

	let values = template
		.unexpand(uri)
		.with_context(|| format!("URI does not match template: {template}"))?;

	let json = serde_json::to_string_pretty(&values).context("Failed to serialize variables")?;
	println!("{}", json);
	Ok(ExitCode::SUCCESS)
}

fn handle_parse(template: &str) -> Result<ExitCode> {
	let config = load_config()?;
	let template = resolve_template(template, &config)?;

	for part in template.parts() {
		match part {
			Part::Literal(text) if text.is_empty() => {}
			Part::Literal(text) => println!("literal    {:?}", text),
			Part::Expression(expr) => {
				println!(
					"expression {}  lead={:?} separator={:?} named={} reserved={}",
					expr, expr.lead, expr.separator, expr.named, expr.allow_reserved
				);
				for term in &expr.terms {
					println!(
						"  term {}  explode={} prefix={}",
						term.name, term.explode, term.prefix
					);
				}
			}
		}
	}
	println!("pattern: {}", template.pattern());

	Ok(ExitCode::SUCCESS)
}

fn handle_test(paths: &[PathBuf]) -> Result<ExitCode> {
	let mut report = FixtureReport::default();

	for path in paths {
		let groups = load_fixture_file(path)
			.with_context(|| format!("Failed to load fixture: {}", path.display()))?;
		report.merge(run_groups(&groups));
	}

	for failure in &report.failures {
		println!("FAIL {}", failure);
	}
	println!(
		"{} passed, {} failed, {} total",
		report.passed,
		report.failures.len(),
		report.total()
	);

	if report.is_success() {
		Ok(ExitCode::SUCCESS)
	} else {
		Ok(ExitCode::FAILURE)
	}
}

fn handle_config_show() -> Result<ExitCode> {
	let cwd = std::env::current_dir().context("Failed to get current directory")?;
	let configs = discover_configs(&cwd).context("Failed to discover config files")?;

	if configs.is_empty() {
		println!("No configuration files found.");
		return Ok(ExitCode::SUCCESS);
	}

	println!("Configuration files (in cascade order):\n");

	for loaded in &configs {
		println!("# Source: {}", loaded.path.display());
		println!("# root: {}", loaded.config.root);
		println!("# templates: {}", loaded.config.templates.len());
		println!("# variables: {}", loaded.config.variables.len());
		println!();

		for (name, template) in &loaded.config.templates {
			println!("  template {}: {}", name, template);
		}
		for (name, value) in &loaded.config.variables {
			let rendered = serde_json::to_string(value).context("Failed to serialize variable")?;
			println!("  variable {}: {}", name, rendered);
		}
		println!();
	}

	// Show user config path
	if let Ok(user_path) = user_config_path() {
		println!("User config path: {}", user_path.display());
		if user_path.exists() {
			println!("  (exists)");
		} else {
			println!("  (not found)");
		}
	}

	Ok(ExitCode::SUCCESS)
}

fn handle_config_validate() -> Result<ExitCode> {
	let cwd = std::env::current_dir().context("Failed to get current directory")?;

	match discover_configs(&cwd) {
		Ok(configs) => {
			if configs.is_empty() {
				println!("No configuration files found.");
			} else {
				println!("All configuration files are valid:");
				for loaded in &configs {
					println!(
						"  {} ({} templates)",
						loaded.path.display(),
						loaded.config.templates.len()
					);
				}
			}
			Ok(ExitCode::SUCCESS)
		}
		Err(e) => {
			eprintln!("Configuration error: {}", e);
			Ok(ExitCode::FAILURE)
		}
	}
}
