// Input validators for URLs and e-mail addresses

use regex::Regex;

use crate::downloader::errors::{AppError, Result};

lazy_static::lazy_static! {
    static ref YOUTUBE_RE: Regex =
        Regex::new(r"^https?://(www\.)?(youtube\.com|youtu\.be)/").unwrap();
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9-][a-zA-Z0-9.-]*\.[a-zA-Z]{2,}$").unwrap();
}

/// Whether `url` points at youtube.com or youtu.be over http(s)
pub fn is_valid_url(url: &str) -> bool {
    YOUTUBE_RE.is_match(url)
}

pub fn validate_url_or_err(url: &str) -> Result<()> {
    if is_valid_url(url) {
        Ok(())
    } else {
        Err(AppError::invalid_url())
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}
