// Error types for the downloader, video-info and auth services

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

pub const INVALID_URL_MESSAGE: &str = "Invalid URL. Use a YouTube URL.";
pub const VIDEO_INFO_MISSING_COOKIES_MESSAGE: &str =
    "Cookies missing; cannot fetch video information.";
pub const VIDEO_INFO_FAILED_MESSAGE: &str = "Could not fetch video information.";

/// User-facing failures. Every external-call failure is caught at a service
/// boundary and re-raised as exactly one of these, with a fixed message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    /// URL is not an accepted YouTube link
    #[error("{0}")]
    InvalidUrl(String),

    /// cookies.txt is not where the engine expects it
    #[error("{0}")]
    MissingCredentials(String),

    /// Engine raised during a transfer
    #[error("{0}")]
    DownloadFailed(String),

    /// Engine raised during a metadata-only lookup
    #[error("{0}")]
    VideoInfoFailed(String),

    /// Identity provider rejected the call
    #[error("{0}")]
    AuthenticationFailed(String),

    /// Anything the services did not anticipate (worker panic, closed channel)
    #[error("Unexpected error: {0}")]
    UnexpectedFailure(String),
}

impl AppError {
    pub fn invalid_url() -> Self {
        Self::InvalidUrl(INVALID_URL_MESSAGE.to_string())
    }

    pub fn missing_cookies_for_download(cookies_file: &str) -> Self {
        Self::MissingCredentials(format!(
            "Cookies file '{}' not found.\n\
             Export it with the 'Get cookies.txt clean' browser extension \
             and save it in the app folder.",
            cookies_file
        ))
    }

    pub fn missing_cookies_for_info() -> Self {
        Self::MissingCredentials(VIDEO_INFO_MISSING_COOKIES_MESSAGE.to_string())
    }

    pub fn download_failed(detail: impl std::fmt::Display) -> Self {
        Self::DownloadFailed(format!("Error during download: {}", detail))
    }

    pub fn video_info_failed() -> Self {
        Self::VideoInfoFailed(VIDEO_INFO_FAILED_MESSAGE.to_string())
    }

    pub fn unexpected(detail: impl Into<String>) -> Self {
        Self::UnexpectedFailure(detail.into())
    }

    /// Short machine-readable name for log fields
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidUrl(_) => "invalid_url",
            Self::MissingCredentials(_) => "missing_credentials",
            Self::DownloadFailed(_) => "download_failed",
            Self::VideoInfoFailed(_) => "video_info_failed",
            Self::AuthenticationFailed(_) => "authentication_failed",
            Self::UnexpectedFailure(_) => "unexpected",
        }
    }
}

/// Failures raised by a download engine implementation. These never leave
/// the service layer.
#[derive(Debug, Error)]
pub enum EngineError {
    /// yt-dlp not found in system
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Engine ran and reported a failure
    #[error("Execution error: {0}")]
    Execution(String),

    /// Failed to parse engine JSON output
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// Classify raw engine stderr text
impl From<String> for EngineError {
    fn from(s: String) -> Self {
        if s.contains("not found")
            || s.contains("No such file")
            || s.contains("command not found")
        {
            return Self::ToolNotFound(s);
        }

        if s.contains("parse") || s.contains("JSON") {
            return Self::Parse(s);
        }

        Self::Execution(s)
    }
}
