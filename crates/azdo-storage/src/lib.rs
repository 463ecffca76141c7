//! Personal access token storage for azdo-tools.
//!
//! Tokens are never written to the config file. They live in the operating
//! system's credential manager, one entry per Azure DevOps organization:
//!
//! - **macOS**: Keychain Services
//! - **Windows**: Credential Manager
//! - **Linux**: Secret Service (GNOME Keyring / KWallet)
//!
//! # Example
//!
//! ```ignore
//! use azdo_storage::{pat_key, CredentialStore, KeychainStore};
//!
//! let store = KeychainStore::new();
//! let key = pat_key("https://dev.azure.com/contoso");
//! store.store(&key, "my-pat")?;
//! assert_eq!(store.get(&key)?, Some("my-pat".to_string()));
//! ```

use std::collections::HashMap;
use std::sync::RwLock;

use azdo_core::{AzureDevOpsConfig, Error, Result};
use keyring::Entry;
use tracing::{debug, warn};

/// Service name used in the OS keychain.
const SERVICE_NAME: &str = "azdo-tools";

/// Key-value store for secrets.
pub trait CredentialStore: Send + Sync {
    /// Store a secret, replacing any previous value.
    fn store(&self, key: &str, value: &str) -> Result<()>;

    /// Returns `Ok(None)` if nothing is stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Succeeds even if nothing is stored under `key`.
    fn delete(&self, key: &str) -> Result<()>;

    fn exists(&self, key: &str) -> bool {
        matches!(self.get(key), Ok(Some(_)))
    }
}

/// Keychain key for an organization's personal access token.
///
/// The scheme, trailing slashes and letter case of the URL are ignored so
/// that `https://dev.azure.com/Contoso/` and `dev.azure.com/contoso` share
/// one entry.
pub fn pat_key(organization_url: &str) -> String {
    let trimmed = organization_url.trim();
    let without_scheme = trimmed
        .split_once("://")
        .map_or(trimmed, |(_, rest)| rest);
    format!(
        "azure-devops/{}/pat",
        without_scheme.trim_end_matches('/').to_lowercase()
    )
}

/// Fill in the PAT from `store` unless one is already set (for example from
/// `AZURE_DEVOPS_PAT`).
pub fn load_pat(config: &mut AzureDevOpsConfig, store: &dyn CredentialStore) -> Result<()> {
    let has_token = config
        .personal_access_token
        .as_deref()
        .is_some_and(|t| !t.is_empty());
    if has_token || config.organization_url.trim().is_empty() {
        return Ok(());
    }

    let key = pat_key(&config.organization_url);
    config.personal_access_token = store.get(&key)?;
    debug!(
        key = key,
        found = config.personal_access_token.is_some(),
        "Looked up PAT in credential store"
    );
    Ok(())
}

// =============================================================================
// KeychainStore - OS keychain implementation
// =============================================================================

/// Credential store backed by the OS keychain.
#[derive(Debug)]
pub struct KeychainStore {
    service_name: String,
}

impl KeychainStore {
    pub fn new() -> Self {
        Self::with_service_name(SERVICE_NAME)
    }

    /// Use a separate service name, e.g. to keep test entries apart from
    /// real credentials.
    pub fn with_service_name(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry> {
        Entry::new(&self.service_name, key).map_err(|e| {
            Error::Storage(format!(
                "Failed to open keychain entry for '{}': {}",
                key, e
            ))
        })
    }
}

impl Default for KeychainStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for KeychainStore {
    fn store(&self, key: &str, value: &str) -> Result<()> {
        debug!(key = key, "Storing credential in keychain");

        self.entry(key)?
            .set_password(value)
            .map_err(|e| Error::Storage(format!("Failed to store credential '{}': {}", key, e)))
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        debug!(key = key, "Retrieving credential from keychain");

        match self.entry(key)?.get_password() {
            Ok(password) => Ok(Some(password)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => {
                warn!(key = key, error = %e, "Failed to retrieve credential");
                Err(Error::Storage(format!(
                    "Failed to retrieve credential '{}': {}",
                    key, e
                )))
            }
        }
    }

    fn delete(&self, key: &str) -> Result<()> {
        debug!(key = key, "Deleting credential from keychain");

        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(Error::Storage(format!(
                "Failed to delete credential '{}': {}",
                key, e
            ))),
        }
    }
}

// =============================================================================
// MemoryStore - in-memory implementation for tests
// =============================================================================

/// In-memory credential store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    credentials: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials<K, V>(credentials: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            credentials: RwLock::new(
                credentials
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

fn poisoned<T>(e: std::sync::PoisonError<T>) -> Error {
    Error::Storage(format!("Lock poisoned: {}", e))
}

impl CredentialStore for MemoryStore {
    fn store(&self, key: &str, value: &str) -> Result<()> {
        self.credentials
            .write()
            .map_err(poisoned)?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.credentials.read().map_err(poisoned)?.get(key).cloned())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.credentials.write().map_err(poisoned)?.remove(key);
        Ok(())
    }
}
