//! Provides access to the YAML settings of an application.
//!
//! Settings are read once at startup. A missing settings file isn't an error, as every setting
//! has a sensible default.
//!
//! # Example
//!
//! ```
//! # use adm::config::Config;
//! let config = Config::from_string("
//! writer:
//!     indent: 2
//! ").unwrap();
//!
//! assert_eq!(config.query("writer.indent").as_i64(), Some(2));
//! assert!(config.query("writer.unknown").is_badvalue());
//! ```
use std::path::Path;

use anyhow::Context;
use yaml_rust::{Yaml, YamlLoader};

/// Wraps the root of a YAML settings document.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    root: Yaml,
}

impl Config {
    /// Creates a config without any settings.
    pub fn empty() -> Self {
        Config {
            root: Yaml::Hash(Default::default()),
        }
    }

    /// Loads the config from the given file.
    ///
    /// If the file doesn't exist, an empty config is returned.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Config> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!(
                "Config file {} does not exist. Using defaults...",
                path.display()
            );
            return Ok(Config::empty());
        }

        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file {}", path.display()))?;
        Config::from_string(&data)
            .with_context(|| format!("Cannot parse config file {}", path.display()))
    }

    /// Parses the given YAML string.
    ///
    /// Only the first document is used. If it isn't a map, an empty config is returned.
    pub fn from_string(data: &str) -> anyhow::Result<Config> {
        let docs = YamlLoader::load_from_str(data)
            .map_err(|error| anyhow::anyhow!("Invalid YAML: {}", error))?;

        match docs.into_iter().next() {
            Some(root @ Yaml::Hash(_)) => Ok(Config { root }),
            _ => Ok(Config::empty()),
        }
    }

    /// Resolves a dotted path like `writer.indent`.
    ///
    /// Returns `Yaml::BadValue` if any part of the path is missing.
    pub fn query(&self, query: impl AsRef<str>) -> &Yaml {
        query
            .as_ref()
            .split('.')
            .fold(&self.root, |current, key| &current[key])
    }
}

#[cfg(test)]
mod tests {
    use crate::config::Config;

    #[test]
    fn nested_values_can_be_queried() {
        let config = Config::from_string(
            "
common_definitions: data/common_definitions.xml
writer:
    indent: 2
    max_indent_depth: 8
",
        )
        .unwrap();

        assert_eq!(
            config.query("common_definitions").as_str(),
            Some("data/common_definitions.xml")
        );
        assert_eq!(config.query("writer.max_indent_depth").as_i64(), Some(8));
        assert!(config.query("common_definitions.indent").is_badvalue());
        assert!(config.query("reader.indent").is_badvalue());
    }

    #[test]
    fn missing_or_empty_files_yield_empty_configs() {
        assert_eq!(
            Config::load("/this/file/does/not/exist.yml").unwrap(),
            Config::empty()
        );
        assert_eq!(Config::from_string("").unwrap(), Config::empty());
        assert_eq!(Config::from_string("42").unwrap(), Config::empty());
    }

    #[test]
    fn invalid_yaml_is_reported() {
        assert!(Config::from_string("writer: [1, 2").is_err());
    }
}
