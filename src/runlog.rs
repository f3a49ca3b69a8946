//! Run transcript: stdout plus an append-only, timestamped log file.

use anyhow::{Context, Result};
use chrono::Local;
use std::{
    fs::{self, File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

pub struct RunLog {
    file: Option<File>,
    path: Option<PathBuf>,
}

impl RunLog {
    /// Transcript on stdout only. Used by dry runs, which must not leave files behind.
    pub fn console() -> Self {
        RunLog {
            file: None,
            path: None,
        }
    }

    /// Create `<dir>/<operation>_<env>_<timestamp>.log` and tee into it.
    pub fn create(dir: &Path, operation: &str, env: &str) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating log directory {}", dir.display()))?;
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("{operation}_{}_{stamp}.log", sanitize(env)));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening log file {}", path.display()))?;
        Ok(RunLog {
            file: Some(file),
            path: Some(path),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn line(&mut self, msg: &str) {
        println!("{msg}");
        self.write_file(msg);
    }

    /// Goes to the log file only, e.g. captured apictl output
    pub fn detail(&mut self, msg: &str) {
        self.write_file(msg);
    }

    fn write_file(&mut self, msg: &str) {
        let Some(file) = self.file.as_mut() else {
            return;
        };
        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        for line in msg.lines() {
            if let Err(e) = writeln!(file, "[{stamp}] {line}") {
                tracing::warn!(error = %e, "Failed to write run log");
                self.file = None;
                return;
            }
        }
    }
}

fn sanitize(env: &str) -> String {
    env.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_names_file_and_appends_timestamped_lines() {
        let dir = TempDir::new().unwrap();
        let logs = dir.path().join("logs");
        let mut log = RunLog::create(&logs, "export", "dev/eu").unwrap();
        log.line("first");
        log.detail("second\nthird");

        let path = log.path().unwrap().to_path_buf();
        let name = path.file_name().unwrap().to_str().unwrap().to_string();
        assert!(name.starts_with("export_dev-eu_"));
        assert!(name.ends_with(".log"));

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with('[') && lines[0].ends_with("] first"));
        assert!(lines[2].ends_with("] third"));
    }

    #[test]
    fn test_console_has_no_file() {
        let mut log = RunLog::console();
        log.line("preview");
        assert!(log.path().is_none());
    }
}
