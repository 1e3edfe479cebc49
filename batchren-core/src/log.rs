use anyhow::Result;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Timestamped, append-only operation log. Without a file it is a no-op.
#[derive(Debug, Default)]
pub struct OperationLog {
    file: Option<File>,
}

impl OperationLog {
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Open (or create) the log file, creating its parent directory
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file: Some(file) })
    }

    pub fn is_enabled(&self) -> bool {
        self.file.is_some()
    }

    /// Write one line. A failing log write never fails the rename it describes,
    /// so errors are swallowed after the first one disables the log.
    pub fn log(&mut self, message: &str) {
        let Some(file) = self.file.as_mut() else {
            return;
        };

        let written = writeln!(
            file,
            "[{}] {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            message
        )
        .and_then(|()| file.flush());

        if written.is_err() {
            self.file = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_log_appends_timestamped_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("logs").join("batch.log");

        let mut log = OperationLog::open(&path).unwrap();
        log.log("first");
        log.log("second");
        drop(log);

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].ends_with("] first"));
        assert!(lines[1].ends_with("] second"));
    }

    #[test]
    fn test_disabled_log_is_silent() {
        let mut log = OperationLog::disabled();
        assert!(!log.is_enabled());
        log.log("nothing happens");
    }
}
