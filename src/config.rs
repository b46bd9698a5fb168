use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::template::DEFAULT_HEADING_MARKER;

/// Reply template bundled with the binary
pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/replies.md");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// tracing filter directive, e.g. "warn" or "name_retention=debug"
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Template file to use instead of the bundled one
    #[serde(default)]
    pub template_path: Option<PathBuf>,

    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub issues: IssuesConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub template: TemplateConfig,
    #[serde(default)]
    pub clipboard: ClipboardConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Base URL used for project pages, the JSON API and extraction patterns
    #[serde(default = "default_registry_url")]
    pub base_url: String,

    #[serde(default = "default_stats_url")]
    pub stats_url: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: default_registry_url(),
            stats_url: default_stats_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuesConfig {
    #[serde(default = "default_github_api")]
    pub api_url: String,

    /// `owner/name` of the support repository
    #[serde(default = "default_support_repo")]
    pub repo: String,
}

impl Default for IssuesConfig {
    fn default() -> Self {
        Self {
            api_url: default_github_api(),
            repo: default_support_repo(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    #[serde(default = "default_heading_marker")]
    pub heading_marker: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            heading_marker: default_heading_marker(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClipboardConfig {
    /// Program and arguments that read the clipboard contents from stdin.
    /// Auto-detected when unset.
    #[serde(default)]
    pub command: Option<Vec<String>>,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_registry_url() -> String {
    "https://pypi.org".to_string()
}

fn default_stats_url() -> String {
    "https://pypistats.org/api".to_string()
}

fn default_github_api() -> String {
    "https://api.github.com".to_string()
}

fn default_support_repo() -> String {
    "pypi/support".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("name-retention/{}", env!("CARGO_PKG_VERSION"))
}

fn default_heading_marker() -> String {
    DEFAULT_HEADING_MARKER.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            template_path: None,
            registry: RegistryConfig::default(),
            issues: IssuesConfig::default(),
            http: HttpConfig::default(),
            template: TemplateConfig::default(),
            clipboard: ClipboardConfig::default(),
        }
    }
}

impl Config {
    /// Load config from the working directory or user config directory
    pub fn load() -> Result<Self> {
        Self::load_with_path(None)
    }

    /// Load configuration from a specific path, or use default search paths.
    /// An explicit path that cannot be read is an error; the search paths
    /// fall through to defaults.
    pub fn load_with_path(path: Option<String>) -> Result<Self> {
        if let Some(config_path) = path {
            debug!("Loading config from explicit path: {}", config_path);
            return Self::load_from_path(&config_path)
                .with_context(|| format!("Failed to load config from {}", config_path));
        }

        if let Ok(config) = Self::load_from_path("name-retention.toml") {
            debug!("Loaded config from ./name-retention.toml");
            return Ok(config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("name-retention").join("config.toml");
            if let Ok(config) = Self::load_from_path(&config_path) {
                debug!("Loaded config from {:?}", config_path);
                return Ok(config);
            }
        }

        debug!("Using default config");
        Ok(Self::default())
    }

    fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Template text: the configured file, or the bundled template.
    pub fn template_text(&self) -> Result<String> {
        match &self.template_path {
            Some(path) => fs::read_to_string(path)
                .with_context(|| format!("Failed to read template {}", path.display())),
            None => Ok(DEFAULT_TEMPLATE.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.registry.base_url, "https://pypi.org");
        assert_eq!(config.issues.repo, "pypi/support");
        assert_eq!(config.template.heading_marker, "##");
        assert!(config.clipboard.command.is_none());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("base_url = \"https://pypi.org\""));
        assert!(toml_str.contains("repo = \"pypi/support\""));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [registry]
            base_url = "https://test.pypi.org"

            [clipboard]
            command = ["xclip", "-selection", "clipboard"]
            "#,
        )
        .unwrap();
        assert_eq!(config.registry.base_url, "https://test.pypi.org");
        assert_eq!(config.registry.stats_url, "https://pypistats.org/api");
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(
            config.clipboard.command,
            Some(vec![
                "xclip".to_string(),
                "-selection".to_string(),
                "clipboard".to_string()
            ])
        );
    }

    #[test]
    fn test_explicit_missing_path_fails() {
        let result = Config::load_with_path(Some("/nonexistent/name-retention.toml".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_bundled_template_used_by_default() {
        let text = Config::default().template_text().unwrap();
        assert_eq!(text, DEFAULT_TEMPLATE);
    }
}
