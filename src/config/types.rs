use crate::error::{Result, UriTemplateError};
use crate::template::UriTemplate;
use crate::value::{Variables, deserialize_variables};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Top-level configuration from a `.uritemplate.toml` file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
	/// If true, stop the directory cascade here and jump to ~/.uritemplate.toml.
	#[serde(default)]
	pub root: bool,

	/// Named templates, usable from the CLI as `@name`.
	#[serde(default)]
	pub templates: BTreeMap<String, String>,

	/// Default variables for every expansion.
	#[serde(default, deserialize_with = "deserialize_variables")]
	pub variables: Variables,
}

/// A loaded configuration with its source path for debugging/display.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
	/// The parsed configuration.
	pub config: Config,

	/// The path this config was loaded from.
	pub path: PathBuf,
}

/// Merged configuration from every config file in the cascade.
#[derive(Debug, Clone, Default)]
pub struct MergedConfig {
	/// Named templates; the most specific config wins.
	pub templates: BTreeMap<String, TemplateWithSource>,

	/// Default variables; the most specific config wins.
	pub variables: Variables,
}

/// A parsed template with the config file it came from.
#[derive(Debug, Clone)]
pub struct TemplateWithSource {
	pub template: UriTemplate,
	pub source: PathBuf,
}

impl Config {
	/// Parse every named template, failing on the first invalid one.
	pub fn parsed_templates(&self) -> Result<BTreeMap<String, UriTemplate>> {
		self.templates
			.iter()
			.map(|(name, raw)| {
				UriTemplate::parse(raw)
					.map(|template| (name.clone(), template))
					.map_err(|source| UriTemplateError::InvalidTemplate {
						name: name.clone(),
						template: raw.clone(),
						source,
					})
			})
			.collect()
	}

	/// Validate that every named template parses.
	pub fn validate(&self) -> Result<()> {
		self.parsed_templates().map(|_| ())
	}
}

impl MergedConfig {
	/// Look up a named template.
	pub fn template(&self, name: &str) -> Result<&UriTemplate> {
		self.templates
			.get(name)
			.map(|t| &t.template)
			.ok_or_else(|| UriTemplateError::UnknownTemplate {
				name: name.to_string(),
			})
	}
}
