//! Append-only, human-readable event log.
//!
//! Every hoist process appends to the same file, one line per entry:
//!
//! ```text
//! Fri Oct 16 09:12:44 2026: motor_z: position = 5.010000
//! ```
//!
//! The timestamp uses the 24-character `ctime` layout. Nothing re-parses
//! the file; it is an audit trail only.

use chrono::{DateTime, Local, TimeZone};
use std::fmt::Display;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// `ctime`-style timestamp layout, always 24 characters.
pub const TIMESTAMP_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// Render one log line (without the trailing newline).
pub fn format_entry<Tz: TimeZone>(at: &DateTime<Tz>, message: &str) -> String
where
    Tz::Offset: Display,
{
    format!("{}: {}", at.format(TIMESTAMP_FORMAT), message)
}

/// Handle on the shared append-only log file.
#[derive(Debug)]
pub struct EventLog {
    path: PathBuf,
    file: File,
}

impl EventLog {
    /// Open `path` for appending, creating it if needed.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry stamped with the current local time.
    ///
    /// The line is written with a single `write_all` so entries from
    /// concurrent processes do not interleave mid-line.
    pub fn record(&mut self, message: &str) -> io::Result<()> {
        let mut line = format_entry(&Local::now(), message);
        line.push('\n');
        self.file.write_all(line.as_bytes())?;
        self.file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    #[test]
    fn timestamp_is_24_chars() {
        let at = Utc.with_ymd_and_hms(2026, 10, 6, 9, 5, 3).unwrap();
        let line = format_entry(&at, "hello");
        assert_eq!(line, "Tue Oct  6 09:05:03 2026: hello");
        assert_eq!(line.find(": "), Some(24));
    }

    #[test]
    fn two_digit_day_keeps_width() {
        let at = Utc.with_ymd_and_hms(2026, 10, 16, 23, 59, 59).unwrap();
        let line = format_entry(&at, "x");
        assert_eq!(&line[..24], "Fri Oct 16 23:59:59 2026");
    }

    #[test]
    fn record_appends_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Log.txt");

        let mut log = EventLog::open(&path).unwrap();
        log.record("first").unwrap();
        drop(log);

        let mut log = EventLog::open(&path).unwrap();
        log.record("second").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(": first"));
        assert!(lines[1].ends_with(": second"));
        assert!(lines.iter().all(|l| l.find(": ") == Some(24)));
    }
}
