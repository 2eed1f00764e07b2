//! The append-only entry log.
//!
//! Human-readable fixed-width columns, one line per recognition event:
//! NAME | GENDER | DAY | DATE | TIME | IMAGE_LINK. Intruder entries
//! carry the snapshot path; known-face entries log "N/A". Writes from
//! all sessions serialize on one lock and flush per entry.

use crate::StoreError;
use chrono::Local;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub struct EventLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl EventLog {
    /// Open the log, writing the header when the file is missing or empty.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let log = Self {
            path: path.to_path_buf(),
            lock: Mutex::new(()),
        };
        log.write_header_if_needed()?;
        Ok(log)
    }

    fn write_header_if_needed(&self) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());

        let needs_header = match std::fs::metadata(&self.path) {
            Ok(meta) => meta.len() == 0,
            Err(_) => true,
        };
        if !needs_header {
            return Ok(());
        }

        let header = format!(
            "{:<25} | {:<8} | {:<6} | {:<12} | {:<8} | {}\n",
            "NAME", "GENDER", "DAY", "DATE", "TIME", "IMAGE_LINK",
        );
        let separator = format!(
            "{}-+-{}-+-{}-+-{}-+-{}-+-{}\n",
            "-".repeat(25),
            "-".repeat(8),
            "-".repeat(6),
            "-".repeat(12),
            "-".repeat(8),
            "-".repeat("IMAGE_LINK".len()),
        );
        std::fs::write(&self.path, format!("{header}{separator}")).map_err(|source| {
            StoreError::Io {
                path: self.path.clone(),
                source,
            }
        })?;
        tracing::debug!(path = %self.path.display(), "entry log header written");
        Ok(())
    }

    /// Append one entry stamped with the current local time.
    pub fn append(&self, name: &str, gender: &str, image: Option<&Path>) -> Result<(), StoreError> {
        let now = Local::now();
        let image_link = image
            .map(|p| p.display().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "N/A".to_string());

        // Render the date parts eagerly; chrono's DelayedFormat ignores
        // width specifiers, and the columns must stay aligned.
        let day = now.format("%a").to_string();
        let date = now.format("%Y-%m-%d").to_string();
        let time = now.format("%H:%M:%S").to_string();
        let entry = format!(
            "{name:<25} | {gender:<8} | {day:<6} | {date:<12} | {time:<8} | {image_link}\n",
        );

        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(io_err)?;
        file.write_all(entry.as_bytes()).map_err(io_err)?;
        file.flush().map_err(io_err)?;

        tracing::debug!(name, gender, image = %image_link, "entry logged");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entry_log.txt");

        let log = EventLog::open(&path).unwrap();
        log.append("Alice", "female", None).unwrap();
        drop(log);

        // Reopening an existing non-empty log must not rewrite the header.
        let log = EventLog::open(&path).unwrap();
        log.append("Bob", "male", None).unwrap();

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("NAME"));
        assert!(lines[1].starts_with("---"));
        assert!(lines[2].starts_with("Alice"));
        assert!(lines[3].starts_with("Bob"));
    }

    #[test]
    fn test_entry_columns_are_fixed_width() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entry_log.txt");
        let log = EventLog::open(&path).unwrap();
        log.append("Alice", "female", None).unwrap();

        let lines = read_lines(&path);
        let fields: Vec<&str> = lines[2].split(" | ").collect();
        assert_eq!(fields.len(), 6);
        assert_eq!(fields[0], format!("{:<25}", "Alice"));
        assert_eq!(fields[1], format!("{:<8}", "female"));
        assert_eq!(fields[5], "N/A");
    }

    #[test]
    fn test_intruder_entry_references_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entry_log.txt");
        let log = EventLog::open(&path).unwrap();
        log.append(
            "Intruder_1",
            "Intruder",
            Some(Path::new("intruders/intruder_20250101_120000_000000.jpg")),
        )
        .unwrap();

        let lines = read_lines(&path);
        assert!(lines[2].ends_with("intruders/intruder_20250101_120000_000000.jpg"));
        assert!(lines[2].starts_with("Intruder_1"));
    }

    #[test]
    fn test_concurrent_appends_stay_line_separated() {
        use std::sync::Arc;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entry_log.txt");
        let log = Arc::new(EventLog::open(&path).unwrap());

        let handles: Vec<_> = (0..10)
            .map(|n| {
                let log = Arc::clone(&log);
                std::thread::spawn(move || log.append(&format!("Person_{n}"), "male", None).unwrap())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 12);
        assert!(lines[2..].iter().all(|l| l.split(" | ").count() == 6));
    }
}
