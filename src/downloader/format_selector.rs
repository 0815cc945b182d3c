// FormatSelector - fixed table from UI labels to yt-dlp format expressions

use serde::{Deserialize, Serialize};

/// Selector used for any label not in the table
pub const DEFAULT_FORMAT_SELECTOR: &str = "best";

/// Format choices offered to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FormatChoice {
    #[default]
    BestQuality,
    UpTo720p,
    AudioMp3,
}

impl FormatChoice {
    /// Display order
    pub const ALL: [FormatChoice; 3] = [Self::BestQuality, Self::UpTo720p, Self::AudioMp3];

    pub fn label(&self) -> &'static str {
        match self {
            Self::BestQuality => "Best quality",
            Self::UpTo720p => "Up to 720p",
            Self::AudioMp3 => "MP3 audio",
        }
    }

    /// yt-dlp format specification
    pub fn selector(&self) -> &'static str {
        match self {
            Self::BestQuality => "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]",
            Self::UpTo720p => {
                "bestvideo[height<=720][ext=mp4]+bestaudio[ext=m4a]/best[height<=720][ext=mp4]"
            }
            Self::AudioMp3 => "bestaudio[ext=m4a]",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|choice| choice.label() == label)
    }

    pub fn labels() -> Vec<&'static str> {
        Self::ALL.iter().map(FormatChoice::label).collect()
    }
}

/// Format selector lookup
pub struct FormatSelector;

impl FormatSelector {
    /// Get format spec for yt-dlp based on a label, falling back to `best`
    pub fn get_format_spec(label: &str) -> &'static str {
        FormatChoice::from_label(label)
            .map(|choice| choice.selector())
            .unwrap_or(DEFAULT_FORMAT_SELECTOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_labels_map_to_selectors() {
        assert_eq!(
            FormatSelector::get_format_spec("Best quality"),
            "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]"
        );
        assert_eq!(
            FormatSelector::get_format_spec("Up to 720p"),
            "bestvideo[height<=720][ext=mp4]+bestaudio[ext=m4a]/best[height<=720][ext=mp4]"
        );
        assert_eq!(FormatSelector::get_format_spec("MP3 audio"), "bestaudio[ext=m4a]");
    }

    #[test]
    fn test_unknown_label_falls_back() {
        assert_eq!(FormatSelector::get_format_spec("4K HDR"), DEFAULT_FORMAT_SELECTOR);
        assert_eq!(FormatSelector::get_format_spec(""), DEFAULT_FORMAT_SELECTOR);
    }

    #[test]
    fn test_labels_in_display_order() {
        assert_eq!(
            FormatChoice::labels(),
            vec!["Best quality", "Up to 720p", "MP3 audio"]
        );
        assert_eq!(FormatChoice::default().label(), "Best quality");
    }
}
