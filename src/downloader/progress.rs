// Progress event normalisation

use regex::Regex;
use serde_json::Value;

use super::models::{DownloadProgress, ProgressStatus};
use super::traits::ProgressEvent;

lazy_static::lazy_static! {
    static ref ANSI_RE: Regex = Regex::new(r"\x1b\[[0-9;]*m").unwrap();
}

/// Parser for yt-dlp progress events
pub struct ProgressParser;

impl ProgressParser {
    /// Normalise one engine event. Never fails: an unreadable percent shows as 0.
    pub fn parse(data: &ProgressEvent) -> DownloadProgress {
        let status = ProgressStatus::from_engine(
            data.get("status").and_then(Value::as_str).unwrap_or("unknown"),
        );

        let percent = match status {
            ProgressStatus::Downloading => data
                .get("_percent_str")
                .and_then(Value::as_str)
                .map(Self::clean_percent)
                .unwrap_or(0.0),
            ProgressStatus::Finished => 100.0,
            ProgressStatus::Other(_) => 0.0,
        };

        DownloadProgress {
            status,
            percent,
            eta: data.get("eta").and_then(Self::as_seconds),
            speed: data.get("speed").and_then(Self::as_text),
        }
    }

    /// "\x1b[0;94m 45.5%\x1b[0m" -> 45.5, kept within 0..=100
    fn clean_percent(raw: &str) -> f64 {
        let stripped = ANSI_RE.replace_all(raw.trim(), "").replace('%', "");
        match stripped.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => value.clamp(0.0, 100.0),
            _ => 0.0,
        }
    }

    fn as_seconds(value: &Value) -> Option<u64> {
        value
            .as_u64()
            .or_else(|| value.as_f64().filter(|v| *v >= 0.0).map(|v| v as u64))
    }

    fn as_text(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}
