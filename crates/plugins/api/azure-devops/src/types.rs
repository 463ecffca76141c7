//! Azure DevOps REST envelope types.
//!
//! Entity payloads live in `azdo_core::types`; this module only holds the
//! wrappers the REST API puts around them.

use serde::Deserialize;

/// Collection envelope used by list endpoints: `{"count": n, "value": [...]}`.
///
/// `count` always equals `value.len()` and is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

/// Minimal project record, used to verify credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct TeamProjectReference {
    #[serde(default)]
    pub name: Option<String>,
}
