// Download engine trait definition

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

use super::errors::EngineError;
use super::models::DownloadOptions;

/// Raw progress record as emitted by the engine (`status`, `_percent_str`,
/// `eta`, `speed`, ...). Shape is not guaranteed.
pub type ProgressEvent = Map<String, Value>;

/// Callback registered in `DownloadOptions::progress_hooks`
pub type ProgressHook = Arc<dyn Fn(&ProgressEvent) + Send + Sync>;

/// Boundary to the download/transcode engine
#[async_trait]
pub trait DownloadEngine: Send + Sync {
    /// Name of the engine (for logging)
    fn name(&self) -> &'static str;

    /// Download every URL, calling the registered progress hooks as the
    /// transfer advances. Blocks the caller until the engine exits.
    async fn download(
        &self,
        urls: &[String],
        options: &DownloadOptions,
    ) -> Result<(), EngineError>;

    /// Metadata-only lookup: no transfer side effect
    async fn extract_info(
        &self,
        url: &str,
        options: &DownloadOptions,
    ) -> Result<Value, EngineError>;
}
