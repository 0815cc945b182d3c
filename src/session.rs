// Downloader session: the controller behind one downloader window
//
// Owns the at-most-one in-flight download, subscribes to the worker's
// progress and result channels, loads video info alongside the transfer,
// and pushes everything the UI should show through a SessionView.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use image::DynamicImage;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

use crate::downloader::errors::Result;
use crate::downloader::models::{DownloadOutcome, DownloadProgress, DownloadRequest, VideoInfo};
use crate::downloader::service::DownloadService;
use crate::downloader::utils::FolderOpener;
use crate::downloader::video_info::{ThumbnailLoader, VideoInfoService};
use crate::downloader::worker::{DownloadWorker, WorkerEvent};
use crate::validators;

pub const DESTINATION_NOT_CHOSEN_MESSAGE: &str = "Destination folder not chosen.";

/// How long a finished download waits for a still-running info lookup
pub const DEFAULT_INFO_GRACE: Duration = Duration::from_secs(10);

/// UI-visible download lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadState {
    Idle,
    Preparing,
    Downloading,
    Succeeded,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

/// Everything the session asks the UI to render
#[derive(Debug, Clone)]
pub enum SessionEvent {
    StateChanged(DownloadState),
    Status { kind: StatusKind, text: String },
    Progress(DownloadProgress),
    VideoInfo(VideoInfo),
    /// Metadata lookup failed; the download carries on
    VideoInfoWarning(String),
    Thumbnail(DynamicImage),
}

/// Rendering side of the session (window, terminal, test recorder)
pub trait SessionView {
    fn render(&mut self, event: SessionEvent);
}

type InfoLookup = (Result<VideoInfo>, Option<DynamicImage>);

pub struct DownloaderSession<V> {
    download_service: Arc<DownloadService>,
    video_info_service: Arc<VideoInfoService>,
    thumbnails: ThumbnailLoader,
    opener: Arc<dyn FolderOpener>,
    view: V,
    state: DownloadState,
    is_downloading: bool,
    save_path: Option<PathBuf>,
    worker: Option<DownloadWorker>,
    info_task: Option<JoinHandle<InfoLookup>>,
    info_grace: Duration,
}

impl<V: SessionView> DownloaderSession<V> {
    pub fn new(
        download_service: Arc<DownloadService>,
        video_info_service: Arc<VideoInfoService>,
        thumbnails: ThumbnailLoader,
        opener: Arc<dyn FolderOpener>,
        view: V,
    ) -> Self {
        Self {
            download_service,
            video_info_service,
            thumbnails,
            opener,
            view,
            state: DownloadState::Idle,
            is_downloading: false,
            save_path: None,
            worker: None,
            info_task: None,
            info_grace: DEFAULT_INFO_GRACE,
        }
    }

    /// Bound the wait for video info once the download itself has ended
    pub fn with_info_grace(mut self, grace: Duration) -> Self {
        self.info_grace = grace;
        self
    }

    pub fn state(&self) -> &DownloadState {
        &self.state
    }

    pub fn is_downloading(&self) -> bool {
        self.is_downloading
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    /// Start a download on a background worker. Returns `false` without side
    /// effects when the URL is empty or a download is already in flight; a
    /// rejected URL or missing destination is reported through the view.
    ///
    /// Must be called inside a tokio runtime.
    pub fn start_download(
        &mut self,
        url: &str,
        save_path: Option<PathBuf>,
        format_label: &str,
        custom_title: &str,
    ) -> bool {
        let url = url.trim();
        if url.is_empty() || self.is_downloading {
            debug!(in_flight = self.is_downloading, "Ignoring start request");
            return false;
        }

        if let Err(e) = validators::validate_url_or_err(url) {
            debug!(url, kind = e.kind(), "Rejected download request");
            self.status(StatusKind::Error, e.to_string());
            return false;
        }

        let Some(save_path) = save_path else {
            self.status(StatusKind::Error, DESTINATION_NOT_CHOSEN_MESSAGE);
            return false;
        };

        let custom_title = custom_title.trim();
        let custom_title = (!custom_title.is_empty()).then(|| custom_title.to_string());
        let request = DownloadRequest::new(url, save_path.clone(), format_label, custom_title);
        let request = match request {
            Ok(request) => request,
            Err(e) => {
                self.status(StatusKind::Error, e.to_string());
                return false;
            }
        };

        self.is_downloading = true;
        self.save_path = Some(save_path);
        self.set_state(DownloadState::Preparing);
        self.status(StatusKind::Info, "📥 Preparing...");

        info!(url, format = format_label, "Download requested");
        self.worker = Some(DownloadWorker::spawn(self.download_service.clone(), request));
        self.info_task = Some(self.spawn_info_lookup(url.to_string()));
        true
    }

    /// Drive the active download to its end, rendering progress and video
    /// info as they arrive. `None` when nothing was started.
    pub async fn wait(&mut self) -> Option<DownloadOutcome> {
        let mut worker = self.worker.take()?;
        let mut info_task = self.info_task.take();

        loop {
            tokio::select! {
                Some(joined) = join_lookup(&mut info_task), if info_task.is_some() => {
                    info_task = None;
                    self.apply_video_info(joined);
                }
                event = worker.next_event() => match event {
                    Some(WorkerEvent::Progress(progress)) => self.apply_progress(progress),
                    Some(WorkerEvent::Finished(outcome)) => {
                        self.finish(&outcome);
                        if let Some(handle) = info_task.take() {
                            self.settle_info_lookup(handle).await;
                        }
                        return Some(outcome);
                    }
                    None => {
                        self.is_downloading = false;
                        return None;
                    }
                }
            }
        }
    }

    async fn settle_info_lookup(&mut self, mut handle: JoinHandle<InfoLookup>) {
        match tokio::time::timeout(self.info_grace, &mut handle).await {
            Ok(joined) => self.apply_video_info(joined),
            Err(_) => {
                // Dropping the lookup kills the engine child process
                handle.abort();
                warn!(
                    grace = ?self.info_grace,
                    "Video info lookup outlived the download, abandoning it"
                );
            }
        }
    }

    fn spawn_info_lookup(&self, url: String) -> JoinHandle<InfoLookup> {
        let service = self.video_info_service.clone();
        let thumbnails = self.thumbnails.clone();

        tokio::spawn(async move {
            let info = service.get_video_info(&url).await;
            let thumbnail = match &info {
                Ok(VideoInfo {
                    thumbnail_url: Some(thumb_url),
                    ..
                }) => thumbnails.load_thumbnail(thumb_url).await,
                _ => None,
            };
            (info, thumbnail)
        })
    }

    fn apply_progress(&mut self, progress: DownloadProgress) {
        if self.state == DownloadState::Preparing {
            self.set_state(DownloadState::Downloading);
        }

        if progress.is_downloading() {
            let value = progress.percent as u32;
            let eta = progress.formatted_eta();
            let text = if eta.is_empty() {
                format!("📥 Downloading... {}%", value)
            } else {
                format!("📥 Downloading... {}% - {} remaining", value, eta)
            };
            self.status(StatusKind::Info, text);
        } else if progress.is_finished() {
            self.status(StatusKind::Success, "Download finished!");
        }

        self.view.render(SessionEvent::Progress(progress));
    }

    fn apply_video_info(&mut self, joined: std::result::Result<InfoLookup, JoinError>) {
        match joined {
            Ok((Ok(info), thumbnail)) => {
                self.view.render(SessionEvent::VideoInfo(info));
                if let Some(image) = thumbnail {
                    self.view.render(SessionEvent::Thumbnail(image));
                }
            }
            Ok((Err(e), _)) => {
                self.view.render(SessionEvent::VideoInfoWarning(format!("⚠️ {}", e)));
            }
            Err(e) => {
                warn!(error = %e, "Video info task failed");
            }
        }
    }

    fn finish(&mut self, outcome: &DownloadOutcome) {
        match outcome {
            DownloadOutcome::Succeeded => {
                self.set_state(DownloadState::Succeeded);
                self.status(StatusKind::Success, "Download complete!");
                if let Some(path) = &self.save_path {
                    if let Err(e) = self.opener.open(path) {
                        warn!(path = %path.display(), error = %e, "Failed to open download folder");
                    }
                }
            }
            DownloadOutcome::Failed(message) => {
                self.set_state(DownloadState::Failed(message.clone()));
                self.status(StatusKind::Error, format!("Error: {}", message));
            }
        }

        self.is_downloading = false;
    }

    fn set_state(&mut self, state: DownloadState) {
        debug!(from = ?self.state, to = ?state, "Download state");
        self.state = state.clone();
        self.view.render(SessionEvent::StateChanged(state));
    }

    fn status(&mut self, kind: StatusKind, text: impl Into<String>) {
        self.view.render(SessionEvent::Status {
            kind,
            text: text.into(),
        });
    }
}

async fn join_lookup(
    task: &mut Option<JoinHandle<InfoLookup>>,
) -> Option<std::result::Result<InfoLookup, JoinError>> {
    match task {
        Some(handle) => Some(handle.await),
        None => None,
    }
}
