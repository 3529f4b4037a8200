use crate::error::RecordError;
use chrono::{DateTime, TimeZone};
use std::fmt::{Display, Write as _};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use zagent_common::types::Snapshot;

/// Timestamp prefix of each log line, e.g. `2024/03/01T12:00:00Z+0100`.
pub const TIMESTAMP_FORMAT: &str = "%Y/%m/%dT%H:%M:%SZ%z";

/// Appends snapshots to the agent's local log for offline inspection.
pub struct Recorder {
    path: PathBuf,
}

impl Recorder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one `<timestamp> <name> <value>` line per metric and returns
    /// the number of lines written. The log directory must already exist.
    pub fn record<Tz>(&self, snapshot: &Snapshot, now: DateTime<Tz>) -> Result<usize, RecordError>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let ts = now.format(TIMESTAMP_FORMAT).to_string();
        let mut buf = String::new();
        for (name, value) in snapshot.iter() {
            let _ = writeln!(buf, "{ts} {name} {value}");
        }

        let wrap = |source| RecordError {
            path: self.path.clone(),
            source,
        };
        let mut log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(wrap)?;
        log.write_all(buf.as_bytes()).map_err(wrap)?;

        Ok(snapshot.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use std::fs;
    use tempfile::TempDir;
    use zagent_common::types::MetricValue;

    fn snapshot() -> Snapshot {
        vec![
            ("system.uptime".to_string(), MetricValue::new("100.5")),
            ("ulimit.nproc".to_string(), MetricValue::new("12")),
        ]
        .into_iter()
        .collect()
    }

    fn at(hour: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 1, hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn appends_timestamped_lines() {
        let dir = TempDir::new().unwrap();
        let recorder = Recorder::new(dir.path().join("zagent.log"));

        assert_eq!(recorder.record(&snapshot(), at(12)).unwrap(), 2);
        assert_eq!(recorder.record(&snapshot(), at(13)).unwrap(), 2);

        let content = fs::read_to_string(recorder.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines,
            vec![
                "2024/03/01T12:00:00Z+0100 system.uptime 100.5",
                "2024/03/01T12:00:00Z+0100 ulimit.nproc 12",
                "2024/03/01T13:00:00Z+0100 system.uptime 100.5",
                "2024/03/01T13:00:00Z+0100 ulimit.nproc 12",
            ]
        );
    }

    #[test]
    fn never_truncates_existing_log() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("zagent.log");
        fs::write(&path, "previous run\n").unwrap();

        Recorder::new(&path).record(&snapshot(), at(12)).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("previous run\n"));
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let recorder = Recorder::new(dir.path().join("log").join("zagent.log"));
        let err = recorder.record(&snapshot(), at(12)).unwrap_err();
        assert_eq!(err.source.kind(), std::io::ErrorKind::NotFound);
    }
}
