// Common data models for downloader

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use super::errors::{AppError, Result};
use super::traits::ProgressHook;
use crate::validators;

/// Output template placeholder used when no custom title is given
pub const TITLE_PLACEHOLDER: &str = "%(title)s";

/// Terminal message that marks a successful download
pub const SUCCESS_SENTINEL: &str = "success";

/// One user-initiated download. Immutable once built; deserializing goes
/// through the same URL check as `new`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RequestFields")]
pub struct DownloadRequest {
    url: String,
    save_path: PathBuf,
    format_choice: String,
    custom_title: Option<String>,
}

impl DownloadRequest {
    /// Build a request, rejecting URLs that are not YouTube links.
    pub fn new(
        url: impl Into<String>,
        save_path: impl Into<PathBuf>,
        format_choice: impl Into<String>,
        custom_title: Option<String>,
    ) -> Result<Self> {
        let url = url.into();
        validators::validate_url_or_err(&url)?;

        Ok(Self {
            url,
            save_path: save_path.into(),
            format_choice: format_choice.into(),
            custom_title,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn save_path(&self) -> &Path {
        &self.save_path
    }

    pub fn format_choice(&self) -> &str {
        &self.format_choice
    }

    /// File stem for the output template: trimmed custom title, or the
    /// engine's title placeholder.
    pub fn filename(&self) -> String {
        match self.custom_title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => TITLE_PLACEHOLDER.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct RequestFields {
    url: String,
    save_path: PathBuf,
    format_choice: String,
    #[serde(default)]
    custom_title: Option<String>,
}

impl TryFrom<RequestFields> for DownloadRequest {
    type Error = AppError;

    fn try_from(fields: RequestFields) -> Result<Self> {
        Self::new(fields.url, fields.save_path, fields.format_choice, fields.custom_title)
    }
}

/// Status field of an engine progress event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressStatus {
    Downloading,
    Finished,
    /// Anything else the engine reports, passed through verbatim
    Other(String),
}

impl ProgressStatus {
    pub fn from_engine(status: &str) -> Self {
        match status {
            "downloading" => Self::Downloading,
            "finished" => Self::Finished,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Downloading => "downloading",
            Self::Finished => "finished",
            Self::Other(s) => s,
        }
    }
}

/// Download progress information, one per engine progress event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadProgress {
    pub status: ProgressStatus,
    pub percent: f64,
    pub eta: Option<u64>,
    pub speed: Option<String>,
}

impl DownloadProgress {
    pub fn new(status: ProgressStatus) -> Self {
        Self {
            status,
            percent: 0.0,
            eta: None,
            speed: None,
        }
    }

    pub fn is_downloading(&self) -> bool {
        self.status == ProgressStatus::Downloading
    }

    pub fn is_finished(&self) -> bool {
        self.status == ProgressStatus::Finished
    }

    /// ETA as `MM:SS`, or empty when the engine gave none
    pub fn formatted_eta(&self) -> String {
        match self.eta {
            Some(eta) => format!("{:02}:{:02}", eta / 60, eta % 60),
            None => String::new(),
        }
    }
}

/// Video metadata shown next to a running download
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub duration: Option<u64>,
}

impl VideoInfo {
    pub fn formatted_duration(&self) -> Option<String> {
        self.duration.map(|secs| {
            let hours = secs / 3600;
            let minutes = (secs % 3600) / 60;
            let seconds = secs % 60;
            if hours > 0 {
                format!("{}:{:02}:{:02}", hours, minutes, seconds)
            } else {
                format!("{}:{:02}", minutes, seconds)
            }
        })
    }
}

impl fmt::Display for VideoInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "📹 {}", self.title)
    }
}

/// Post-processing directive handed to the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostProcessor {
    pub key: String,
    pub preferred_format: String,
}

impl PostProcessor {
    pub fn video_convertor(preferred_format: &str) -> Self {
        Self {
            key: "FFmpegVideoConvertor".to_string(),
            preferred_format: preferred_format.to_string(),
        }
    }
}

/// Engine option set. Field names follow the engine's own option keys.
#[derive(Clone, Default)]
pub struct DownloadOptions {
    pub format: Option<String>,
    pub outtmpl: Option<String>,
    pub merge_output_format: Option<String>,
    pub cookiefile: Option<PathBuf>,
    pub quiet: bool,
    pub noprogress: bool,
    pub postprocessors: Vec<PostProcessor>,
    pub progress_hooks: Vec<ProgressHook>,
}

impl DownloadOptions {
    /// Options for a metadata-only lookup
    pub fn metadata(cookiefile: impl Into<PathBuf>) -> Self {
        Self {
            quiet: true,
            cookiefile: Some(cookiefile.into()),
            ..Self::default()
        }
    }

    pub fn add_progress_hook(&mut self, hook: ProgressHook) {
        self.progress_hooks.push(hook);
    }

    /// Names of the keys that are set
    pub fn keys(&self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        if self.format.is_some() {
            keys.push("format");
        }
        if self.outtmpl.is_some() {
            keys.push("outtmpl");
        }
        if self.merge_output_format.is_some() {
            keys.push("merge_output_format");
        }
        if self.cookiefile.is_some() {
            keys.push("cookiefile");
        }
        if self.quiet {
            keys.push("quiet");
        }
        if self.noprogress {
            keys.push("noprogress");
        }
        if !self.postprocessors.is_empty() {
            keys.push("postprocessors");
        }
        if !self.progress_hooks.is_empty() {
            keys.push("progress_hooks");
        }
        keys
    }

}

impl fmt::Debug for DownloadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadOptions")
            .field("format", &self.format)
            .field("outtmpl", &self.outtmpl)
            .field("merge_output_format", &self.merge_output_format)
            .field("cookiefile", &self.cookiefile)
            .field("quiet", &self.quiet)
            .field("noprogress", &self.noprogress)
            .field("postprocessors", &self.postprocessors)
            .field("progress_hooks", &self.progress_hooks.len())
            .finish()
    }
}

/// Terminal message from a download worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Succeeded,
    /// Error text shown to the user as is
    Failed(String),
}

impl DownloadOutcome {
    /// Only the exact sentinel counts as success; every other string is error text.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        if message == SUCCESS_SENTINEL {
            Self::Succeeded
        } else {
            Self::Failed(message)
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

impl fmt::Display for DownloadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => f.write_str(SUCCESS_SENTINEL),
            Self::Failed(message) => f.write_str(message),
        }
    }
}
