//! Core traits, types, and error handling for azdo-tools.
//!
//! This crate provides the foundational abstractions shared by the Azure DevOps
//! REST client, the MCP server and the CLI: the unified error type, the
//! pull-request data model, status translation tables and the comment-thread
//! reconstruction that turns flat thread data into reply trees.

pub mod config;
pub mod error;
pub mod provider;
pub mod status;
pub mod threads;
pub mod types;

pub use config::{AuthMethod, AzureDevOpsConfig, Config};
pub use error::{Error, Result};
pub use provider::{Connector, PullRequestApi};
pub use status::{
    string_to_pull_request_status, string_to_thread_status, thread_status_to_string,
    CommentThreadStatus, PullRequestStatus,
};
pub use threads::{process_pull_request_comments, CommentLocation, ReconstructedComment};
pub use types::*;
