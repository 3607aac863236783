//! Bounded download log.
//!
//! Each served download appends one line of the form
//! `DD/MM/YYYY - HH:MM | FORMAT | DURATION | SIZE | TITLE`. Only the most
//! recent entries are kept; the oldest are evicted first.

use crate::error::Result;
use crate::media::DownloadFormat;
use std::path::PathBuf;

/// One row of the download log.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub title: String,
    pub format: DownloadFormat,
    pub duration: String,
    pub size: String,
}

/// Append-only download log capped at a fixed number of lines.
pub struct History {
    path: PathBuf,
    max_entries: usize,
}

impl History {
    pub fn new(path: PathBuf, max_entries: usize) -> Self {
        Self { path, max_entries }
    }

    /// Append an entry, evicting the oldest lines past the cap.
    pub fn append(&self, entry: &HistoryEntry) -> Result<()> {
        let timestamp = chrono::Local::now().format("%d/%m/%Y - %H:%M");
        let line = format!(
            "{} | {} | {} | {} | {}",
            timestamp,
            entry.format.label(),
            entry.duration,
            entry.size,
            entry.title
        );

        let mut lines = self.lines()?;
        lines.push(line);
        if lines.len() > self.max_entries {
            let excess = lines.len() - self.max_entries;
            lines.drain(..excess);
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, lines.join("\n") + "\n")?;
        Ok(())
    }

    /// All retained lines, oldest first.
    pub fn lines(&self) -> Result<Vec<String>> {
        if !self.path.is_file() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(content.lines().map(|l| l.to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(title: &str) -> HistoryEntry {
        HistoryEntry {
            title: title.to_string(),
            format: DownloadFormat::Mp3,
            duration: "1:15".to_string(),
            size: "1.5 MB".to_string(),
        }
    }

    #[test]
    fn test_append_writes_expected_line_shape() {
        let dir = TempDir::new().unwrap();
        let history = History::new(dir.path().join("log.txt"), 50);

        history.append(&entry("My Song")).unwrap();

        let lines = history.lines().unwrap();
        assert_eq!(lines.len(), 1);
        let fields: Vec<&str> = lines[0].split(" | ").collect();
        assert_eq!(fields.len(), 5);
        assert_eq!(fields[1], "MP3");
        assert_eq!(fields[2], "1:15");
        assert_eq!(fields[3], "1.5 MB");
        assert_eq!(fields[4], "My Song");
        // DD/MM/YYYY - HH:MM
        assert_eq!(fields[0].len(), 18);
    }

    #[test]
    fn test_cap_evicts_oldest_first() {
        let dir = TempDir::new().unwrap();
        let history = History::new(dir.path().join("log.txt"), 3);

        for i in 0..5 {
            history.append(&entry(&format!("title-{}", i))).unwrap();
        }

        let lines = history.lines().unwrap();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("title-2"));
        assert!(lines[2].ends_with("title-4"));
    }

    #[test]
    fn test_never_exceeds_cap() {
        let dir = TempDir::new().unwrap();
        let history = History::new(dir.path().join("log.txt"), 50);

        for i in 0..120 {
            history.append(&entry(&format!("t{}", i))).unwrap();
        }

        assert_eq!(history.lines().unwrap().len(), 50);
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        let history = History::new(dir.path().join("absent.txt"), 50);
        assert!(history.lines().unwrap().is_empty());
    }
}
