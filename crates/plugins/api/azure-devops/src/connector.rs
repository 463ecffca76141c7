//! Connection factory used by the MCP tool dispatcher.

use std::sync::Arc;

use async_trait::async_trait;
use azdo_core::{AzureDevOpsConfig, Connector, Error, PullRequestApi, Result};
use tracing::{debug, info};

use crate::client::AzureDevOpsClient;

/// Builds an authenticated [`AzureDevOpsClient`] from configuration.
///
/// Every call to [`Connector::connect`] creates a fresh client and checks the
/// credentials against the organization before handing it out.
#[derive(Debug, Clone)]
pub struct AzureDevOpsConnector {
    config: AzureDevOpsConfig,
}

impl AzureDevOpsConnector {
    pub fn new(config: AzureDevOpsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AzureDevOpsConfig {
        &self.config
    }

    /// Create and verify a client.
    pub async fn client(&self) -> Result<AzureDevOpsClient> {
        self.config.validate()?;

        let token = self
            .config
            .personal_access_token
            .as_deref()
            .unwrap_or_default();

        let client = AzureDevOpsClient::new(&self.config.organization_url, token)
            .with_api_version(&self.config.api_version);

        debug!(
            organization = client.organization_url(),
            "Checking Azure DevOps credentials"
        );
        client.check_connection().await?;
        info!(organization = client.organization_url(), "Connected to Azure DevOps");

        Ok(client)
    }
}

#[async_trait]
impl Connector for AzureDevOpsConnector {
    async fn connect(&self) -> Result<Arc<dyn PullRequestApi>> {
        let client = self.client().await.map_err(|e| {
            Error::Authentication(format!("Failed to authenticate with Azure DevOps: {}", e))
        })?;
        Ok(Arc::new(client))
    }
}
