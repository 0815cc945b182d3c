use async_trait::async_trait;
use gamer_dl_lib::downloader::{
    DownloadEngine, DownloadOptions, DownloadOutcome, DownloadService, EngineError, FolderOpener,
    ThumbnailLoader, VideoInfoService,
};
use gamer_dl_lib::session::{
    DownloadState, DownloaderSession, SessionEvent, SessionView, StatusKind,
};
use serde_json::{json, Value};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

/// Plays a short transfer through the hooks and records what it was asked
#[derive(Default)]
struct ScriptedEngine {
    downloads: AtomicUsize,
    extracts: AtomicUsize,
    formats: Mutex<Vec<String>>,
    outtmpls: Mutex<Vec<String>>,
}

#[async_trait]
impl DownloadEngine for ScriptedEngine {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn download(
        &self,
        _urls: &[String],
        options: &DownloadOptions,
    ) -> Result<(), EngineError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        self.formats
            .lock()
            .unwrap()
            .extend(options.format.clone());
        self.outtmpls
            .lock()
            .unwrap()
            .extend(options.outtmpl.clone());

        for event in [
            json!({
                "status": "downloading",
                "_percent_str": "\u{1b}[0;94m 12.5%\u{1b}[0m",
                "eta": 40,
                "speed": 1048576.0
            }),
            json!({"status": "downloading", "_percent_str": " 80.0%", "eta": 5}),
            json!({"status": "finished"}),
        ] {
            let event = event.as_object().cloned().unwrap();
            for hook in &options.progress_hooks {
                hook(&event);
            }
        }
        Ok(())
    }

    async fn extract_info(
        &self,
        _url: &str,
        _options: &DownloadOptions,
    ) -> Result<Value, EngineError> {
        self.extracts.fetch_add(1, Ordering::SeqCst);
        Ok(json!({
            "title": "Never Gonna Give You Up",
            "duration": 213,
            "thumbnail": "http://127.0.0.1:9/vi/dQw4w9WgXcQ/hqdefault.jpg"
        }))
    }
}

#[derive(Default)]
struct RecordingOpener {
    opened: Mutex<Vec<PathBuf>>,
}

impl FolderOpener for RecordingOpener {
    fn open(&self, path: &Path) -> io::Result<()> {
        self.opened.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}

#[derive(Default)]
struct Recorder {
    events: Vec<SessionEvent>,
}

impl SessionView for Recorder {
    fn render(&mut self, event: SessionEvent) {
        self.events.push(event);
    }
}

impl Recorder {
    fn states(&self) -> Vec<DownloadState> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SessionEvent::StateChanged(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    fn statuses(&self) -> Vec<(StatusKind, String)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SessionEvent::Status { kind, text } => Some((*kind, text.clone())),
                _ => None,
            })
            .collect()
    }
}

fn session(
    engine: Arc<ScriptedEngine>,
    cookies: PathBuf,
    opener: Arc<RecordingOpener>,
) -> DownloaderSession<Recorder> {
    DownloaderSession::new(
        Arc::new(DownloadService::new(engine.clone(), cookies.clone())),
        Arc::new(VideoInfoService::new(engine, cookies)),
        ThumbnailLoader::new(Duration::from_secs(1)),
        opener,
        Recorder::default(),
    )
}

#[tokio::test]
async fn download_runs_from_preparing_to_success() {
    let dir = tempfile::tempdir().unwrap();
    let cookies = dir.path().join("youtube.com_cookies.txt");
    std::fs::write(&cookies, "# Netscape HTTP Cookie File\n").unwrap();
    let dest = dir.path().join("videos");

    let engine = Arc::new(ScriptedEngine::default());
    let opener = Arc::new(RecordingOpener::default());
    let mut session = session(engine.clone(), cookies, opener.clone());

    assert!(session.start_download(URL, Some(dest.clone()), "Up to 720p", "  my clip  "));
    // Busy: a second request is ignored
    assert!(!session.start_download(URL, Some(dest.clone()), "Up to 720p", ""));
    assert!(session.is_downloading());

    let outcome = session.wait().await;

    assert_eq!(outcome, Some(DownloadOutcome::Succeeded));
    assert_eq!(session.state(), &DownloadState::Succeeded);
    assert!(!session.is_downloading());
    assert_eq!(
        session.view().states(),
        vec![
            DownloadState::Preparing,
            DownloadState::Downloading,
            DownloadState::Succeeded,
        ]
    );

    let statuses = session.view().statuses();
    assert_eq!(statuses[0], (StatusKind::Info, "📥 Preparing...".to_string()));
    assert!(statuses.contains(&(
        StatusKind::Info,
        "📥 Downloading... 12% - 00:40 remaining".to_string()
    )));
    assert!(statuses.contains(&(StatusKind::Success, "Download finished!".to_string())));
    assert_eq!(
        statuses.last(),
        Some(&(StatusKind::Success, "Download complete!".to_string()))
    );

    // Video info arrives even though the thumbnail host is unreachable
    assert!(session.view().events.iter().any(|e| matches!(
        e,
        SessionEvent::VideoInfo(info) if info.title == "Never Gonna Give You Up"
    )));
    assert!(!session
        .view()
        .events
        .iter()
        .any(|e| matches!(e, SessionEvent::Thumbnail(_))));

    assert_eq!(engine.downloads.load(Ordering::SeqCst), 1);
    assert_eq!(engine.extracts.load(Ordering::SeqCst), 1);
    assert_eq!(
        *engine.formats.lock().unwrap(),
        vec![
            "bestvideo[height<=720][ext=mp4]+bestaudio[ext=m4a]/best[height<=720][ext=mp4]"
                .to_string()
        ]
    );
    assert_eq!(
        *engine.outtmpls.lock().unwrap(),
        vec![dest.join("my clip.%(ext)s").to_string_lossy().into_owned()]
    );
    assert_eq!(*opener.opened.lock().unwrap(), vec![dest]);
}

#[tokio::test]
async fn missing_cookie_jar_fails_without_touching_engine() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Arc::new(ScriptedEngine::default());
    let opener = Arc::new(RecordingOpener::default());
    let mut session = session(
        engine.clone(),
        dir.path().join("youtube.com_cookies.txt"),
        opener.clone(),
    );

    assert!(session.start_download(URL, Some(dir.path().to_path_buf()), "Best quality", ""));
    let outcome = session.wait().await.unwrap();

    let DownloadOutcome::Failed(message) = outcome else {
        panic!("download should have failed");
    };
    assert!(message.contains("youtube.com_cookies.txt"));
    assert_eq!(session.state(), &DownloadState::Failed(message.clone()));
    assert_eq!(
        session.view().statuses().last(),
        Some(&(StatusKind::Error, format!("Error: {}", message)))
    );
    assert!(session.view().events.iter().any(|e| matches!(
        e,
        SessionEvent::VideoInfoWarning(w)
            if w == "⚠️ Cookies missing; cannot fetch video information."
    )));

    assert_eq!(engine.downloads.load(Ordering::SeqCst), 0);
    assert_eq!(engine.extracts.load(Ordering::SeqCst), 0);
    assert!(opener.opened.lock().unwrap().is_empty());
}
