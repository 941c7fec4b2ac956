//! Provider result types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Result object returned by a provider for a completed upload.
///
/// Only the fields the relay needs are typed; everything else the provider
/// sends is kept in `extra` so the full payload can be passed on unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderUpload {
    /// Durable HTTPS URL of the hosted asset.
    pub secure_url: String,
    /// Provider-assigned identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_id: Option<String>,
    /// Resource kind the provider stored the asset as.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    /// Remaining provider fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
