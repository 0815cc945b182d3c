pub mod auth;
pub mod config;
pub mod downloader;
pub mod session;
pub mod validators;
pub mod ytdlp;

pub use auth::{AuthService, AuthUser, FirebaseAuth, IdentityProvider};
pub use config::AppConfig;
pub use session::{DownloadState, DownloaderSession, SessionEvent, SessionView, StatusKind};
pub use ytdlp::YtDlpEngine;
