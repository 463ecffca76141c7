//! MCP (Model Context Protocol) server for azdo-tools.
//!
//! This crate exposes Azure DevOps pull request operations as MCP tools:
//! argument schemas, the operation functions, the tool dispatcher and the
//! stdio JSON-RPC server that hosts them.

pub mod handlers;
pub mod operations;
pub mod protocol;
pub mod schemas;
pub mod server;
pub mod transport;

#[cfg(test)]
mod mock;

pub use handlers::ToolHandler;
pub use server::McpServer;
