// Download service: option construction and engine invocation

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::errors::{AppError, Result};
use super::format_selector::FormatSelector;
use super::models::{DownloadOptions, DownloadRequest, PostProcessor};
use super::traits::{DownloadEngine, ProgressHook};
use super::utils::cookies_present;

/// Container every download is merged and converted into
pub const OUTPUT_CONTAINER: &str = "mp4";

pub struct DownloadService {
    engine: Arc<dyn DownloadEngine>,
    cookies_file: PathBuf,
}

impl DownloadService {
    pub fn new(engine: Arc<dyn DownloadEngine>, cookies_file: impl Into<PathBuf>) -> Self {
        Self {
            engine,
            cookies_file: cookies_file.into(),
        }
    }

    /// Download one request. Fails with `MissingCredentials` before the
    /// engine is touched when the cookie jar is absent.
    pub async fn download(
        &self,
        request: &DownloadRequest,
        progress_callback: Option<ProgressHook>,
    ) -> Result<()> {
        if !cookies_present(&self.cookies_file) {
            warn!(cookies = %self.cookies_file.display(), "Cookies file not found");
            return Err(AppError::missing_cookies_for_download(
                &self.cookies_file.display().to_string(),
            ));
        }

        let options = self.build_download_options(request, progress_callback);
        debug!(engine = self.engine.name(), keys = ?options.keys(), "Built download options");
        info!(url = request.url(), format = request.format_choice(), "Starting download");

        match self.engine.download(&[request.url().to_string()], &options).await {
            Ok(()) => {
                info!(url = request.url(), "Download finished");
                Ok(())
            }
            Err(e) => {
                warn!(engine = self.engine.name(), error = %e, "Download failed");
                Err(AppError::download_failed(e))
            }
        }
    }

    /// Engine options for `request`; `progress_hooks` is set only when a
    /// callback is given.
    pub fn build_download_options(
        &self,
        request: &DownloadRequest,
        progress_callback: Option<ProgressHook>,
    ) -> DownloadOptions {
        let outtmpl = request
            .save_path()
            .join(format!("{}.%(ext)s", request.filename()));

        let mut options = DownloadOptions {
            format: Some(FormatSelector::get_format_spec(request.format_choice()).to_string()),
            outtmpl: Some(outtmpl.to_string_lossy().into_owned()),
            merge_output_format: Some(OUTPUT_CONTAINER.to_string()),
            cookiefile: Some(self.cookies_file.clone()),
            quiet: true,
            noprogress: true,
            postprocessors: vec![PostProcessor::video_convertor(OUTPUT_CONTAINER)],
            progress_hooks: Vec::new(),
        };

        if let Some(callback) = progress_callback {
            options.add_progress_hook(callback);
        }

        options
    }
}
