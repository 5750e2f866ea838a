//! Service entity.

use serde::Serialize;

/// A deployable service and the checkpoint artifacts produced for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Service {
    pub name: String,
    pub image: String,
    /// Artifact locations in production order.
    #[serde(rename = "chk_files")]
    pub checkpoints: Vec<String>,
}

impl Service {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            checkpoints: Vec::new(),
        }
    }

    pub fn latest_checkpoint(&self) -> Option<&str> {
        self.checkpoints.last().map(String::as_str)
    }
}
