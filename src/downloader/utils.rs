// Helper functions shared by the services and the session

use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

/// Whether the engine's cookie jar is present on disk
pub fn cookies_present(cookies_file: &Path) -> bool {
    cookies_file.exists()
}

/// Opens a directory in the host's file browser
pub trait FolderOpener: Send + Sync {
    fn open(&self, path: &Path) -> io::Result<()>;
}

/// Dispatches to explorer / open / xdg-open
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemFolderOpener;

impl FolderOpener for SystemFolderOpener {
    fn open(&self, path: &Path) -> io::Result<()> {
        let program = if cfg!(target_os = "windows") {
            "explorer"
        } else if cfg!(target_os = "macos") {
            "open"
        } else {
            "xdg-open"
        };

        tracing::debug!(program, path = %path.display(), "Opening folder");

        // Do not wait: the file browser outlives us
        Command::new(program)
            .arg(path)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookies_present() {
        let dir = tempfile::tempdir().unwrap();
        let cookies = dir.path().join("youtube.com_cookies.txt");
        assert!(!cookies_present(&cookies));

        std::fs::write(&cookies, "# Netscape HTTP Cookie File\n").unwrap();
        assert!(cookies_present(&cookies));
    }
}
