use crate::config::parser::parse_config_file;
use crate::config::types::{LoadedConfig, MergedConfig, TemplateWithSource};
use crate::error::{Result, UriTemplateError};
use std::path::{Path, PathBuf};

/// File name looked up in each directory of the cascade.
pub const CONFIG_FILE_NAME: &str = ".uritemplate.toml";

/// Discover and load all config files in the cascade.
///
/// The cascade order is:
/// 1. Start from `start_dir` and look for `.uritemplate.toml`
/// 2. If found and `root = true`, skip to user config only
/// 3. Otherwise, continue up the directory tree
/// 4. Finally, check ~/.uritemplate.toml
///
/// Returns configs in cascade order (most specific first).
pub fn discover_configs(start_dir: &Path) -> Result<Vec<LoadedConfig>> {
	let mut configs = Vec::new();
	let mut current_dir = start_dir.to_path_buf();

	// Walk up the directory tree
	loop {
		let config_path = current_dir.join(CONFIG_FILE_NAME);

		if config_path.exists() {
			let config = parse_config_file(&config_path)?;
			let root = config.root;

			tracing::debug!(path = %config_path.display(), root, "Loaded config");
			configs.push(LoadedConfig {
				config,
				path: config_path,
			});

			if root {
				break;
			}
		}

		// Move to parent directory
		if let Some(parent) = current_dir.parent() {
			current_dir = parent.to_path_buf();
		} else {
			break;
		}
	}

	let user_path = user_config_path()?;
	if user_path.exists() && !configs.iter().any(|loaded| loaded.path == user_path) {
		let config = parse_config_file(&user_path)?;
		tracing::debug!(path = %user_path.display(), "Loaded user config");
		configs.push(LoadedConfig {
			config,
			path: user_path,
		});
	}

	Ok(configs)
}

/// Merge multiple configs into a single effective config.
///
/// On name conflicts the earlier (more specific) config wins, for both
/// templates and variables.
pub fn merge_configs(configs: &[LoadedConfig]) -> Result<MergedConfig> {
	let mut merged = MergedConfig::default();

	for loaded in configs {
		for (name, template) in loaded.config.parsed_templates()? {
			merged
				.templates
				.entry(name)
				.or_insert_with(|| TemplateWithSource {
					template,
					source: loaded.path.clone(),
				});
		}

		for (name, value) in &loaded.config.variables {
			merged
				.variables
				.entry(name.clone())
				.or_insert_with(|| value.clone());
		}
	}

	Ok(merged)
}

/// Convenience function to discover, load, and merge configs from a directory.
pub fn load_merged_config(start_dir: &Path) -> Result<MergedConfig> {
	let configs = discover_configs(start_dir)?;
	merge_configs(&configs)
}

/// Get the path to the user's config file.
pub fn user_config_path() -> Result<PathBuf> {
	let home_dir = dirs::home_dir().ok_or(UriTemplateError::HomeDirectoryNotFound)?;
	Ok(home_dir.join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::parser::parse_config_str;
	use crate::value::Value;

	fn loaded(content: &str, path: &str) -> LoadedConfig {
		LoadedConfig {
			config: parse_config_str(content, Path::new(path)).unwrap(),
			path: PathBuf::from(path),
		}
	}

	#[test]
	fn test_merge_most_specific_wins() {
		let inner = loaded(
			r#"
[templates]
repo = "/inner{/repo}"

[variables]
user = "inner"
"#,
			"/a/b/.uritemplate.toml",
		);
		let outer = loaded(
			r#"
[templates]
repo = "/outer{/repo}"
user = "/users{/user}"

[variables]
user = "outer"
page = "1"
"#,
			"/a/.uritemplate.toml",
		);

		let merged = merge_configs(&[inner, outer]).unwrap();

		assert_eq!(merged.template("repo").unwrap().as_str(), "/inner{/repo}");
		assert_eq!(
			merged.templates["repo"].source,
			PathBuf::from("/a/b/.uritemplate.toml")
		);
		assert_eq!(merged.template("user").unwrap().as_str(), "/users{/user}");
		assert_eq!(merged.variables["user"], Value::from("inner"));
		assert_eq!(merged.variables["page"], Value::from("1"));
	}

	#[test]
	fn test_unknown_template() {
		let merged = merge_configs(&[]).unwrap();
		assert!(matches!(
			merged.template("missing"),
			Err(UriTemplateError::UnknownTemplate { name }) if name == "missing"
		));
	}

	#[test]
	fn test_discover_stops_at_root() {
		let temp_dir = tempfile::tempdir().unwrap();
		let nested = temp_dir.path().join("project").join("sub");
		std::fs::create_dir_all(&nested).unwrap();

		std::fs::write(
			temp_dir.path().join(CONFIG_FILE_NAME),
			"[templates]\nabove = \"/above\"\n",
		)
		.unwrap();
		std::fs::write(
			temp_dir.path().join("project").join(CONFIG_FILE_NAME),
			"root = true\n[templates]\nproject = \"/project{/id}\"\n",
		)
		.unwrap();
		std::fs::write(
			nested.join(CONFIG_FILE_NAME),
			"[variables]\nid = \"42\"\n",
		)
		.unwrap();

		let configs = discover_configs(&nested).unwrap();
		let paths: Vec<_> = configs.iter().map(|c| c.path.clone()).collect();

		assert_eq!(paths[0], nested.join(CONFIG_FILE_NAME));
		assert_eq!(paths[1], temp_dir.path().join("project").join(CONFIG_FILE_NAME));
		assert!(!paths.contains(&temp_dir.path().join(CONFIG_FILE_NAME)));
	}

	#[test]
	fn test_user_config_path() {
		let path = user_config_path();
		assert!(path.is_ok());
		let path = path.unwrap();
		assert!(path.ends_with(".uritemplate.toml"));
	}
}
