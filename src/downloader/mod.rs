// Downloader module - services around the download engine

pub mod errors;
pub mod format_selector;
pub mod models;
pub mod progress;
pub mod service;
pub mod traits;
pub mod utils;
pub mod video_info;
pub mod worker;

pub use errors::{AppError, EngineError};
pub use format_selector::{FormatChoice, FormatSelector};
pub use models::{DownloadOptions, DownloadOutcome, DownloadProgress, DownloadRequest, VideoInfo};
pub use progress::ProgressParser;
pub use service::DownloadService;
pub use traits::{DownloadEngine, ProgressEvent, ProgressHook};
pub use utils::{FolderOpener, SystemFolderOpener};
pub use video_info::{ThumbnailLoader, VideoInfoService};
pub use worker::{DownloadWorker, WorkerEvent};
