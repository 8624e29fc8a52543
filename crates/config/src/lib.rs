#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for mtspack
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded distribution conventions)
//! - Configuration file (`mtspack.toml` at the project root)
//! - Environment variables (`MTSPACK_*`)
//! - CLI flags (applied by the binary, highest precedence)

use mtspack_errors::{ConfigError, Error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Default configuration file name, looked up in the current directory
pub const DEFAULT_CONFIG_FILE: &str = "mtspack.toml";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub product: ProductConfig,

    #[serde(default)]
    pub tool: ToolConfig,

    #[serde(default)]
    pub paths: PathConfig,
}

/// Product identity configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductConfig {
    /// Name of the packaged product; also the distribution directory name
    /// and the name the executable is given inside it
    #[serde(default = "default_product_name")]
    pub name: String,
    /// Platform tag appended to the archive file name
    #[serde(default = "default_platform_tag")]
    pub platform_tag: String,
}

/// External tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Interpreter driving dependency provisioning and the freeze build
    #[serde(default = "default_python")]
    pub python: String,
    /// Module-search variable masked around the build step
    #[serde(default = "default_module_search_var")]
    pub module_search_var: String,
}

/// Path configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    /// Project root; `None` lets the binary derive it from its own location
    pub project_root: Option<PathBuf>,
    /// Output root; `None` falls back to the caller's current directory
    pub output_root: Option<PathBuf>,
    /// Build output directory, relative to the project root
    #[serde(default = "default_build_dir")]
    pub build_dir: String,
    /// Requirements manifest, relative to the project root
    #[serde(default = "default_manifest")]
    pub manifest: String,
}

// Default implementations

impl Default for ProductConfig {
    fn default() -> Self {
        Self {
            name: default_product_name(),
            platform_tag: default_platform_tag(),
        }
    }
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            python: default_python(),
            module_search_var: default_module_search_var(),
        }
    }
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            project_root: None,
            output_root: None,
            build_dir: default_build_dir(),
            manifest: default_manifest(),
        }
    }
}

fn default_product_name() -> String {
    "mysqltoolsservice".to_string()
}

fn default_platform_tag() -> String {
    "osx".to_string()
}

fn default_python() -> String {
    "python3".to_string()
}

fn default_module_search_var() -> String {
    "PYTHONPATH".to_string()
}

fn default_build_dir() -> String {
    "build".to_string()
}

fn default_manifest() -> String {
    "requirements.txt".to_string()
}

impl Config {
    /// Load configuration from a file
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist, cannot be read, or does
    /// not parse as TOML.
    pub async fn load(path: &Path) -> Result<Self, Error> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            }
            .into());
        }

        let content = fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::ReadError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration with defaults as fallback
    ///
    /// An explicit `path` must exist; the conventional file is optional and
    /// silently replaced by defaults when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly given file is missing or invalid,
    /// or if the conventional file exists but does not parse.
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        if let Some(path) = path {
            return Self::load(path).await;
        }

        let conventional = Path::new(DEFAULT_CONFIG_FILE);
        if conventional.exists() {
            Self::load(conventional).await
        } else {
            tracing::debug!("no configuration file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Merge environment variable overrides into this configuration
    pub fn merge_env(&mut self) {
        if let Ok(name) = std::env::var("MTSPACK_PRODUCT") {
            self.product.name = name;
        }
        if let Ok(tag) = std::env::var("MTSPACK_PLATFORM_TAG") {
            self.product.platform_tag = tag;
        }
        if let Ok(python) = std::env::var("MTSPACK_PYTHON") {
            self.tool.python = python;
        }
        if let Ok(root) = std::env::var("MTSPACK_PROJECT_ROOT") {
            self.paths.project_root = Some(PathBuf::from(root));
        }
        if let Ok(root) = std::env::var("MTSPACK_OUTPUT_ROOT") {
            self.paths.output_root = Some(PathBuf::from(root));
        }
    }

    /// File name of the distribution archive, e.g. `mysqltoolsservice-osx.tar.gz`
    #[must_use]
    pub fn archive_file_name(&self) -> String {
        format!("{}-{}.tar.gz", self.product.name, self.product.platform_tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_distribution_conventions() {
        let config = Config::default();
        assert_eq!(config.product.name, "mysqltoolsservice");
        assert_eq!(config.product.platform_tag, "osx");
        assert_eq!(config.tool.python, "python3");
        assert_eq!(config.tool.module_search_var, "PYTHONPATH");
        assert_eq!(config.paths.build_dir, "build");
        assert_eq!(config.paths.manifest, "requirements.txt");
        assert_eq!(config.archive_file_name(), "mysqltoolsservice-osx.tar.gz");
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [tool]
            python = "python3.11"
            "#,
        )
        .unwrap();
        assert_eq!(config.tool.python, "python3.11");
        assert_eq!(config.tool.module_search_var, "PYTHONPATH");
        assert_eq!(config.product.name, "mysqltoolsservice");
    }

    #[test]
    fn full_file_overrides() {
        let config: Config = toml::from_str(
            r#"
            [product]
            name = "pgtoolsservice"
            platform_tag = "osx-arm64"

            [paths]
            build_dir = "dist-build"
            manifest = "requirements-build.txt"
            output_root = "/tmp/out"
            "#,
        )
        .unwrap();
        assert_eq!(config.archive_file_name(), "pgtoolsservice-osx-arm64.tar.gz");
        assert_eq!(config.paths.build_dir, "dist-build");
        assert_eq!(
            config.paths.output_root.as_deref(),
            Some(Path::new("/tmp/out"))
        );
    }

    #[tokio::test]
    async fn load_rejects_invalid_toml() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("mtspack.toml");
        tokio::fs::write(&path, "product = not valid").await.unwrap();

        let err = Config::load(&path).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::ParseError { .. })
        ));
    }

    #[tokio::test]
    async fn load_missing_explicit_file_fails() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("nope.toml");

        let err = Config::load_or_default(Some(&path)).await.unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::NotFound { .. })));
    }

    #[test]
    fn env_overrides_merge() {
        std::env::set_var("MTSPACK_PYTHON", "/usr/local/bin/python3.12");
        std::env::set_var("MTSPACK_OUTPUT_ROOT", "/tmp/dist");

        let mut config = Config::default();
        config.merge_env();

        std::env::remove_var("MTSPACK_PYTHON");
        std::env::remove_var("MTSPACK_OUTPUT_ROOT");

        assert_eq!(config.tool.python, "/usr/local/bin/python3.12");
        assert_eq!(
            config.paths.output_root.as_deref(),
            Some(Path::new("/tmp/dist"))
        );
    }
}
