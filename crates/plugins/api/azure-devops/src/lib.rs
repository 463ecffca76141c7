//! Azure DevOps provider implementation for azdo-tools.
//!
//! This crate talks to the Azure DevOps Git REST API for pull requests,
//! comment threads and iterations, and provides the connector the MCP server
//! uses to open an authenticated client for every tool call.

mod client;
mod connector;
mod types;

pub use client::AzureDevOpsClient;
pub use connector::AzureDevOpsConnector;
