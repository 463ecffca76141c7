//! Configuration management for azdo-tools.
//!
//! Handles loading and saving configuration from TOML files.
//! Config files are stored in platform-specific locations:
//!
//! - **macOS/Linux**: `~/.config/azdo-tools/config.toml`
//! - **Windows**: `%APPDATA%\azdo-tools\config.toml`
//!
//! Environment variables override file values (see [`Config::apply_env`]).
//! The personal access token is never written to the file; it comes from
//! `AZURE_DEVOPS_PAT` or the OS keychain.
//!
//! # Example
//!
//! ```ignore
//! use azdo_core::config::Config;
//!
//! let mut config = Config::load()?;
//! config.set("azure_devops.organization_url", "https://dev.azure.com/contoso")?;
//! config.save()?;
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{Error, Result};

/// Config file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Config directory name.
const CONFIG_DIR_NAME: &str = "azdo-tools";

/// Default REST API version.
pub const DEFAULT_API_VERSION: &str = "7.1";

pub const ENV_ORG_URL: &str = "AZURE_DEVOPS_ORG_URL";
pub const ENV_AUTH_METHOD: &str = "AZURE_DEVOPS_AUTH_METHOD";
pub const ENV_DEFAULT_PROJECT: &str = "AZURE_DEVOPS_DEFAULT_PROJECT";
pub const ENV_PAT: &str = "AZURE_DEVOPS_PAT";

// =============================================================================
// Configuration structures
// =============================================================================

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Azure DevOps connection settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_devops: Option<AzureDevOpsConfig>,
}

/// How the server authenticates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// Personal access token sent with basic auth
    #[default]
    Pat,
}

impl std::str::FromStr for AuthMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pat" | "personal_access_token" | "personalaccesstoken" => Ok(AuthMethod::Pat),
            other => Err(Error::Config(format!("Unsupported auth method: {}", other))),
        }
    }
}

/// Azure DevOps connection settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AzureDevOpsConfig {
    /// Organization URL, e.g. `https://dev.azure.com/contoso`
    #[serde(default)]
    pub organization_url: String,
    #[serde(default)]
    pub auth_method: AuthMethod,
    /// Project used by the CLI connection check
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_project: Option<String>,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Only ever populated from the environment or keychain
    #[serde(skip)]
    pub personal_access_token: Option<String>,
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

impl AzureDevOpsConfig {
    pub fn new(organization_url: impl Into<String>) -> Self {
        Self {
            organization_url: organization_url.into(),
            api_version: default_api_version(),
            ..Default::default()
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.personal_access_token = Some(token.into());
        self
    }

    /// Check that the settings are complete enough to start a server.
    pub fn validate(&self) -> Result<()> {
        if self.organization_url.trim().is_empty() {
            return Err(Error::Validation(
                "Organization URL is required".to_string(),
            ));
        }

        match self.auth_method {
            AuthMethod::Pat => {
                let missing = self
                    .personal_access_token
                    .as_deref()
                    .map_or(true, str::is_empty);
                if missing {
                    return Err(Error::Validation(
                        "Personal Access Token is required for PAT authentication".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }
}

// =============================================================================
// Config implementation
// =============================================================================

impl Config {
    /// Get the configuration directory path.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(CONFIG_DIR_NAME))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }

    /// Get the configuration file path.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from the default location.
    ///
    /// Returns a default (empty) config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    ///
    /// Returns a default (empty) config if the file doesn't exist.
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            debug!(path = ?path, "Config file does not exist, using defaults");
            return Ok(Self::default());
        }

        debug!(path = ?path, "Loading config");

        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;

        info!(path = ?path, "Config loaded successfully");
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
        }

        debug!(path = ?path, "Saving config");

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents)
            .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

        info!(path = ?path, "Config saved successfully");
        Ok(())
    }

    /// Overlay values from process environment variables.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    /// Overlay values from a variable lookup.
    pub fn apply_vars<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let org_url = lookup(ENV_ORG_URL).filter(|v| !v.is_empty());
        let auth_method = lookup(ENV_AUTH_METHOD).filter(|v| !v.is_empty());
        let project = lookup(ENV_DEFAULT_PROJECT).filter(|v| !v.is_empty());
        let token = lookup(ENV_PAT).filter(|v| !v.is_empty());

        if org_url.is_none() && auth_method.is_none() && project.is_none() && token.is_none() {
            return Ok(());
        }

        let azure = self
            .azure_devops
            .get_or_insert_with(|| AzureDevOpsConfig::new(String::new()));

        if let Some(url) = org_url {
            debug!(var = ENV_ORG_URL, "Organization URL taken from environment");
            azure.organization_url = url;
        }
        if let Some(method) = auth_method {
            azure.auth_method = method.parse()?;
        }
        if let Some(project) = project {
            azure.default_project = Some(project);
        }
        if let Some(token) = token {
            debug!(var = ENV_PAT, "Personal access token taken from environment");
            azure.personal_access_token = Some(token);
        }

        Ok(())
    }

    /// Check if Azure DevOps is configured.
    pub fn is_configured(&self) -> bool {
        self.azure_devops
            .as_ref()
            .is_some_and(|a| !a.organization_url.is_empty())
    }

    /// Set a configuration value by key path.
    ///
    /// Key format: `azure_devops.field` (e.g., `azure_devops.organization_url`)
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let field = Self::field_of(key)?;
        let config = self
            .azure_devops
            .get_or_insert_with(|| AzureDevOpsConfig::new(String::new()));

        match field {
            "organization_url" | "url" => {
                config.organization_url = value.trim_end_matches('/').to_string()
            }
            "auth_method" => config.auth_method = value.parse()?,
            "default_project" | "project" => config.default_project = Some(value.to_string()),
            "api_version" => config.api_version = value.to_string(),
            _ => {
                return Err(Error::Config(format!(
                    "Unknown Azure DevOps config field: {}",
                    field
                )))
            }
        }

        Ok(())
    }

    /// Get a configuration value by key path.
    ///
    /// Key format: `azure_devops.field` (e.g., `azure_devops.api_version`)
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let field = Self::field_of(key)?;
        let Some(config) = &self.azure_devops else {
            return Ok(None);
        };

        match field {
            "organization_url" | "url" => Ok(Some(config.organization_url.clone())),
            "auth_method" => Ok(Some("pat".to_string())),
            "default_project" | "project" => Ok(config.default_project.clone()),
            "api_version" => Ok(Some(config.api_version.clone())),
            _ => Err(Error::Config(format!(
                "Unknown Azure DevOps config field: {}",
                field
            ))),
        }
    }

    fn field_of(key: &str) -> Result<&str> {
        let parts: Vec<&str> = key.split('.').collect();
        if parts.len() != 2 {
            return Err(Error::Config(format!(
                "Invalid config key '{}'. Expected format: section.field",
                key
            )));
        }

        match parts[0] {
            "azure_devops" | "azdo" => Ok(parts[1]),
            section => Err(Error::Config(format!("Unknown section: {}", section))),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
