use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Index and error documents served by the bucket's website endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebsiteConfig {
    #[serde(default = "default_index_document")]
    pub index_document: String,
    #[serde(default = "default_error_document")]
    pub error_document: String,
}

fn default_index_document() -> String {
    "index.html".to_string()
}

fn default_error_document() -> String {
    "error.html".to_string()
}

impl Default for WebsiteConfig {
    fn default() -> Self {
        Self {
            index_document: default_index_document(),
            error_document: default_error_document(),
        }
    }
}

impl WebsiteConfig {
    pub fn trace_loaded(&self) {
        info!(
            index_document = %self.index_document,
            error_document = %self.error_document,
            "Loaded website config"
        );
        debug!(?self, "Website config loaded (full debug)");
    }
}
