// yt-dlp engine: runs the yt-dlp executable as a child process

use async_trait::async_trait;
use serde_json::Value;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, trace, warn};

use crate::downloader::errors::EngineError;
use crate::downloader::models::DownloadOptions;
use crate::downloader::traits::{DownloadEngine, ProgressEvent};

/// Prefix of stdout lines that carry a JSON progress record
const PROGRESS_MARKER: &str = "__gamerdl_progress__ ";

#[cfg(target_os = "windows")]
const YTDLP_BINARY: &str = "yt-dlp.exe";
#[cfg(not(target_os = "windows"))]
const YTDLP_BINARY: &str = "yt-dlp";

// Find yt-dlp executable in common paths
fn find_ytdlp() -> String {
    let common_paths = [
        "/opt/homebrew/bin/yt-dlp", // Homebrew on Apple Silicon
        "/usr/local/bin/yt-dlp",    // Homebrew on Intel Mac
        "/usr/bin/yt-dlp",          // System installation
    ];

    for path in common_paths {
        if std::path::Path::new(path).exists() {
            return path.to_string();
        }
    }

    // Last resort: hope it's in PATH
    YTDLP_BINARY.to_string()
}

pub struct YtDlpEngine {
    binary: String,
}

impl YtDlpEngine {
    /// Use `binary` when given, otherwise look in the usual install locations
    pub fn new(binary: Option<String>) -> Self {
        let binary = binary.unwrap_or_else(find_ytdlp);
        debug!(binary = %binary, "Using yt-dlp");
        Self { binary }
    }

    fn spawn_error(&self, e: std::io::Error) -> EngineError {
        if e.kind() == std::io::ErrorKind::NotFound {
            EngineError::ToolNotFound(format!("{}: {}", self.binary, e))
        } else {
            EngineError::Io(e)
        }
    }
}

impl Default for YtDlpEngine {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Translate an option set into yt-dlp command-line arguments
pub fn build_args(options: &DownloadOptions) -> Vec<String> {
    let mut args = vec!["--no-playlist".to_string()];

    if let Some(format) = &options.format {
        args.push("-f".to_string());
        args.push(format.clone());
    }
    if let Some(outtmpl) = &options.outtmpl {
        args.push("-o".to_string());
        args.push(outtmpl.clone());
    }
    if let Some(container) = &options.merge_output_format {
        args.push("--merge-output-format".to_string());
        args.push(container.clone());
    }
    if let Some(cookies) = &options.cookiefile {
        args.push("--cookies".to_string());
        args.push(cookies.to_string_lossy().into_owned());
    }
    if options.quiet {
        args.push("--quiet".to_string());
        args.push("--no-warnings".to_string());
    }

    for pp in &options.postprocessors {
        if pp.key == "FFmpegVideoConvertor" {
            args.push("--recode-video".to_string());
            args.push(pp.preferred_format.clone());
        } else {
            warn!(key = %pp.key, "Unsupported post-processor, skipping");
        }
    }

    if options.progress_hooks.is_empty() {
        if options.noprogress {
            args.push("--no-progress".to_string());
        }
    } else {
        // Hooks need the progress dict on stdout, one JSON record per line
        args.push("--newline".to_string());
        args.push("--progress".to_string());
        args.push("--progress-template".to_string());
        args.push(format!("download:{}%(progress)j", PROGRESS_MARKER));
    }

    args
}

/// Decode a stdout line produced by the progress template
pub fn parse_progress_line(line: &str) -> Option<ProgressEvent> {
    let payload = line.strip_prefix(PROGRESS_MARKER)?;
    match serde_json::from_str::<Value>(payload.trim()) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => None,
        Err(e) => {
            trace!(error = %e, "Ignoring malformed progress line");
            None
        }
    }
}

#[async_trait]
impl DownloadEngine for YtDlpEngine {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn download(
        &self,
        urls: &[String],
        options: &DownloadOptions,
    ) -> Result<(), EngineError> {
        let mut args = build_args(options);
        args.push("--".to_string());
        args.extend(urls.iter().cloned());

        debug!(binary = %self.binary, ?args, "Spawning yt-dlp");

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| capture_error("stdout"))?;
        let mut stderr_pipe = child
            .stderr
            .take()
            .ok_or_else(|| capture_error("stderr"))?;

        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = stderr_pipe.read_to_string(&mut buf).await;
            buf
        });

        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines.next_line().await? {
            match parse_progress_line(&line) {
                Some(event) => {
                    for hook in &options.progress_hooks {
                        hook(&event);
                    }
                }
                None => trace!(line = %line, "yt-dlp"),
            }
        }

        let status = child.wait().await?;
        let stderr = stderr_task.await.unwrap_or_default();

        if status.success() {
            Ok(())
        } else {
            let detail = last_error_line(&stderr)
                .unwrap_or_else(|| format!("yt-dlp exited with {}", status));
            Err(EngineError::from(detail))
        }
    }

    async fn extract_info(
        &self,
        url: &str,
        options: &DownloadOptions,
    ) -> Result<Value, EngineError> {
        let mut args = vec!["--dump-json".to_string(), "--skip-download".to_string()];
        args.extend(build_args(options));
        args.push("--".to_string());
        args.push(url.to_string());

        let output = Command::new(&self.binary)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = last_error_line(&stderr)
                .unwrap_or_else(|| format!("yt-dlp exited with {}", output.status));
            return Err(EngineError::from(detail));
        }

        parse_info_json(&output.stdout)
    }
}

fn capture_error(stream: &str) -> EngineError {
    EngineError::Execution(format!("Failed to capture {} from yt-dlp", stream))
}

/// `--dump-json` prints one object per line; take the first
fn parse_info_json(stdout: &[u8]) -> Result<Value, EngineError> {
    let text = String::from_utf8_lossy(stdout);
    let first = text
        .lines()
        .find(|l| !l.trim().is_empty())
        .ok_or_else(|| EngineError::Parse("yt-dlp printed no metadata".to_string()))?;

    serde_json::from_str(first).map_err(|e| EngineError::Parse(format!("JSON parse error: {}", e)))
}

fn last_error_line(stderr: &str) -> Option<String> {
    let lines: Vec<&str> = stderr.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    lines
        .iter()
        .rev()
        .find(|l| l.starts_with("ERROR"))
        .or_else(|| lines.last())
        .map(|l| l.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::models::PostProcessor;
    use crate::downloader::traits::ProgressHook;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn download_options(with_hook: bool) -> DownloadOptions {
        let mut options = DownloadOptions {
            format: Some("bestaudio[ext=m4a]".to_string()),
            outtmpl: Some("/tmp/downloads/%(title)s.%(ext)s".to_string()),
            merge_output_format: Some("mp4".to_string()),
            cookiefile: Some(PathBuf::from("youtube.com_cookies.txt")),
            quiet: true,
            noprogress: true,
            postprocessors: vec![PostProcessor::video_convertor("mp4")],
            progress_hooks: Vec::new(),
        };
        if with_hook {
            let hook: ProgressHook = Arc::new(|_: &ProgressEvent| {});
            options.add_progress_hook(hook);
        }
        options
    }

    fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }

    #[test]
    fn test_build_args_maps_options() {
        let args = build_args(&download_options(false));

        assert_eq!(value_after(&args, "-f"), Some("bestaudio[ext=m4a]"));
        assert_eq!(value_after(&args, "-o"), Some("/tmp/downloads/%(title)s.%(ext)s"));
        assert_eq!(value_after(&args, "--merge-output-format"), Some("mp4"));
        assert_eq!(value_after(&args, "--cookies"), Some("youtube.com_cookies.txt"));
        assert_eq!(value_after(&args, "--recode-video"), Some("mp4"));
        assert!(args.contains(&"--no-progress".to_string()));
        assert!(!args.contains(&"--progress-template".to_string()));
    }

    #[test]
    fn test_build_args_with_hooks_requests_progress_template() {
        let args = build_args(&download_options(true));

        assert!(args.contains(&"--newline".to_string()));
        assert!(!args.contains(&"--no-progress".to_string()));
        let template = value_after(&args, "--progress-template").unwrap();
        assert!(template.starts_with("download:"));
        assert!(template.ends_with("%(progress)j"));
    }

    #[test]
    fn test_metadata_options_are_minimal() {
        let args = build_args(&DownloadOptions::metadata("cookies.txt"));
        assert_eq!(value_after(&args, "--cookies"), Some("cookies.txt"));
        assert!(!args.contains(&"-f".to_string()));
        assert!(!args.contains(&"-o".to_string()));
    }

    #[test]
    fn test_parse_progress_line() {
        let line = format!(
            "{}{{\"status\": \"downloading\", \"_percent_str\": \" 12.5%\", \"eta\": 42}}",
            PROGRESS_MARKER
        );
        let event = parse_progress_line(&line).unwrap();
        assert_eq!(event["status"], "downloading");
        assert_eq!(event["eta"], 42);

        assert!(parse_progress_line("[download] Destination: video.mp4").is_none());
        assert!(parse_progress_line(&format!("{}not json", PROGRESS_MARKER)).is_none());
    }

    #[test]
    fn test_parse_info_json_takes_first_object() {
        let stdout = b"\n{\"title\": \"A\"}\n{\"title\": \"B\"}\n";
        assert_eq!(parse_info_json(stdout).unwrap()["title"], "A");
        assert!(matches!(parse_info_json(b""), Err(EngineError::Parse(_))));
    }

    #[test]
    fn test_last_error_line_prefers_error_lines() {
        let stderr = "WARNING: something\nERROR: [youtube] abc: Video unavailable\nsome trailer\n";
        assert_eq!(
            last_error_line(stderr).as_deref(),
            Some("ERROR: [youtube] abc: Video unavailable")
        );
        assert_eq!(last_error_line("only line").as_deref(), Some("only line"));
        assert_eq!(last_error_line("  \n"), None);
    }
}
