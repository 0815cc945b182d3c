// Video metadata lookup and thumbnail loading

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use image::DynamicImage;
use serde_json::Value;
use tracing::{debug, warn};

use super::errors::{AppError, Result};
use super::models::{DownloadOptions, VideoInfo};
use super::traits::DownloadEngine;
use super::utils::cookies_present;

pub const TITLE_NOT_AVAILABLE: &str = "Title not available";

pub const THUMBNAIL_TIMEOUT_SECS: u64 = 10;
pub const THUMBNAIL_WIDTH: u32 = 200;
pub const THUMBNAIL_HEIGHT: u32 = 150;

/// Metadata-only queries against the engine
pub struct VideoInfoService {
    engine: Arc<dyn DownloadEngine>,
    cookies_file: PathBuf,
}

impl VideoInfoService {
    pub fn new(engine: Arc<dyn DownloadEngine>, cookies_file: impl Into<PathBuf>) -> Self {
        Self {
            engine,
            cookies_file: cookies_file.into(),
        }
    }

    pub async fn get_video_info(&self, url: &str) -> Result<VideoInfo> {
        if !cookies_present(&self.cookies_file) {
            return Err(AppError::missing_cookies_for_info());
        }

        let options = DownloadOptions::metadata(self.cookies_file.clone());
        let json = self.engine.extract_info(url, &options).await.map_err(|e| {
            warn!(engine = self.engine.name(), error = %e, "Video info lookup failed");
            AppError::video_info_failed()
        })?;

        Ok(parse_video_info(&json))
    }
}

fn parse_video_info(json: &Value) -> VideoInfo {
    VideoInfo {
        title: json["title"]
            .as_str()
            .unwrap_or(TITLE_NOT_AVAILABLE)
            .to_string(),
        thumbnail_url: json["thumbnail"].as_str().map(str::to_string),
        duration: json["duration"]
            .as_u64()
            .or_else(|| json["duration"].as_f64().map(|d| d as u64)),
    }
}

/// Best-effort thumbnail fetcher. Never fails: any problem yields `None`.
#[derive(Clone)]
pub struct ThumbnailLoader {
    client: reqwest::Client,
    width: u32,
    height: u32,
}

impl ThumbnailLoader {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to build thumbnail client, using defaults");
                reqwest::Client::new()
            });

        Self {
            client,
            width: THUMBNAIL_WIDTH,
            height: THUMBNAIL_HEIGHT,
        }
    }

    pub async fn load_thumbnail(&self, url: &str) -> Option<DynamicImage> {
        match self.fetch(url).await {
            Ok(bytes) => decode_thumbnail(&bytes, self.width, self.height),
            Err(e) => {
                warn!(url, error = %e, "Failed to load thumbnail");
                None
            }
        }
    }

    async fn fetch(&self, url: &str) -> std::result::Result<Vec<u8>, reqwest::Error> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        debug!(url, size = bytes.len(), "Fetched thumbnail");
        Ok(bytes.to_vec())
    }
}

impl Default for ThumbnailLoader {
    fn default() -> Self {
        Self::new(Duration::from_secs(THUMBNAIL_TIMEOUT_SECS))
    }
}

/// Decode image bytes and scale to fit `width` x `height`, keeping aspect ratio
pub fn decode_thumbnail(bytes: &[u8], width: u32, height: u32) -> Option<DynamicImage> {
    match image::load_from_memory(bytes) {
        Ok(img) => Some(img.thumbnail(width, height)),
        Err(e) => {
            warn!(error = %e, "Failed to decode thumbnail");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::service::tests::FakeEngine;
    use image::{GenericImageView, ImageOutputFormat, RgbImage};
    use serde_json::json;
    use std::io::Cursor;
    use std::sync::atomic::Ordering;

    const URL: &str = "https://www.youtube.com/watch?v=test123";

    fn cookies() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_cookies.txt");
        std::fs::write(&path, "# Netscape HTTP Cookie File\n").unwrap();
        (dir, path)
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(RgbImage::new(width, height))
            .write_to(&mut buf, ImageOutputFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[tokio::test]
    async fn test_get_video_info_without_cookies() {
        let engine = Arc::new(FakeEngine::default());
        let service = VideoInfoService::new(engine.clone(), "/nonexistent/test_cookies.txt");

        let err = service.get_video_info(URL).await.unwrap_err();

        assert!(matches!(err, AppError::MissingCredentials(_)));
        assert!(err.to_string().contains("Cookies missing"));
        assert_eq!(engine.extracts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_get_video_info_success() {
        let (_dir, cookies) = cookies();
        let engine = Arc::new(FakeEngine {
            info: Some(json!({
                "title": "Test Video Title",
                "thumbnail": "https://example.com/thumb.jpg",
                "duration": 300
            })),
            ..FakeEngine::default()
        });
        let service = VideoInfoService::new(engine.clone(), cookies);

        let info = service.get_video_info(URL).await.unwrap();

        assert_eq!(info.title, "Test Video Title");
        assert_eq!(info.thumbnail_url.as_deref(), Some("https://example.com/thumb.jpg"));
        assert_eq!(info.duration, Some(300));
        assert_eq!(engine.downloads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_get_video_info_failure() {
        let (_dir, cookies) = cookies();
        let engine = Arc::new(FakeEngine {
            fail: Some("Video not found".to_string()),
            ..FakeEngine::default()
        });
        let service = VideoInfoService::new(engine, cookies);

        let err = service.get_video_info(URL).await.unwrap_err();

        assert_eq!(err, AppError::video_info_failed());
    }

    #[tokio::test]
    async fn test_get_video_info_missing_fields() {
        let (_dir, cookies) = cookies();
        let service = VideoInfoService::new(Arc::new(FakeEngine::default()), cookies);

        let info = service.get_video_info(URL).await.unwrap();

        assert_eq!(info.title, TITLE_NOT_AVAILABLE);
        assert_eq!(info.thumbnail_url, None);
        assert_eq!(info.duration, None);
    }

    #[test]
    fn test_decode_thumbnail_keeps_aspect_ratio() {
        let img = decode_thumbnail(&png(400, 300), THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT).unwrap();
        assert_eq!(img.dimensions(), (200, 150));

        let img = decode_thumbnail(&png(800, 200), THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT).unwrap();
        assert_eq!(img.dimensions(), (200, 50));
    }

    #[test]
    fn test_decode_thumbnail_rejects_garbage() {
        assert!(decode_thumbnail(b"\x89PNG\r\n\x1a\n", 200, 150).is_none());
    }

    #[tokio::test]
    async fn test_load_thumbnail_failure_yields_none() {
        let loader = ThumbnailLoader::new(Duration::from_secs(1));
        assert!(loader.load_thumbnail("http://127.0.0.1:9/invalid.jpg").await.is_none());
        assert!(loader.load_thumbnail("not a url").await.is_none());
    }
}
