//! Persistent log store
//!
//! Append-only JSON Lines file of periodic status snapshots. Each line is one
//! `LogRecord`. Lines that fail to parse are skipped with a warning so a torn
//! write never hides the rest of the history.
//!
//! Queries walk the file backwards from the end in fixed-size blocks and stop
//! once enough records are collected, so their cost follows `limit` rather
//! than the size of the history.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use joyservo_core::error::JoyservoResult;

use crate::status::{HardwareStatus, SensorReport, ServosReport, StatusReport};

const READ_BLOCK: u64 = 8 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub servos: ServosReport,
    pub sensor: SensorReport,
    pub hardware: HardwareStatus,
}

pub struct LogStore {
    path: PathBuf,
    next_id: Mutex<u64>,
}

impl LogStore {
    /// Open (or prepare to create) the store at `path`
    pub fn open(path: impl AsRef<Path>) -> JoyservoResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let store = Self {
            path,
            next_id: Mutex::new(1),
        };
        let last = store.read_tail(1)?.first().map(|r| r.id).unwrap_or(0);
        *store.next_id.lock() = last + 1;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse_line(&self, line: &[u8]) -> Option<LogRecord> {
        let line = std::str::from_utf8(line).ok()?.trim();
        if line.is_empty() {
            return None;
        }
        match serde_json::from_str::<LogRecord>(line) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Skipping unreadable record in {}: {}", self.path.display(), e);
                None
            }
        }
    }

    /// Up to `limit` parsed records, newest first
    fn read_tail(&self, limit: usize) -> JoyservoResult<Vec<LogRecord>> {
        let mut file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        let mut pos = file.metadata()?.len();
        // Start of a line whose beginning lies in a block not yet read
        let mut partial: Vec<u8> = Vec::new();

        while pos > 0 && records.len() < limit {
            let step = READ_BLOCK.min(pos);
            pos -= step;
            file.seek(SeekFrom::Start(pos))?;
            let mut block = vec![0u8; step as usize];
            file.read_exact(&mut block)?;
            block.extend_from_slice(&partial);

            let mut lines: Vec<&[u8]> = block.split(|b| *b == b'\n').collect();
            let head = if pos > 0 { lines.remove(0).to_vec() } else { Vec::new() };
            for line in lines.into_iter().rev() {
                if records.len() >= limit {
                    break;
                }
                if let Some(record) = self.parse_line(line) {
                    records.push(record);
                }
            }
            partial = head;
        }
        Ok(records)
    }

    /// Append one snapshot, returning its id
    pub fn append(&self, timestamp: DateTime<Utc>, report: &StatusReport) -> JoyservoResult<u64> {
        let mut next_id = self.next_id.lock();
        let record = LogRecord {
            id: *next_id,
            timestamp,
            servos: report.servos.clone(),
            sensor: report.sensor.clone(),
            hardware: report.hardware.clone(),
        };
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;

        *next_id += 1;
        Ok(record.id)
    }

    /// Up to `limit` records, most recent first
    pub fn recent(&self, limit: usize) -> JoyservoResult<Vec<LogRecord>> {
        self.read_tail(limit)
    }

    /// Drop all history
    pub fn clear(&self) -> JoyservoResult<()> {
        let mut next_id = self.next_id.lock();
        File::create(&self.path)?;
        *next_id = 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{ControllerSession, ServoBank};
    use crate::drivers::ServoDriver;
    use crate::sampler::SensorSampler;
    use crate::status::HardwareBuses;
    use joyservo_core::config::{SensorConfig, ServoConfig};
    use std::time::Duration;

    fn report(angle: i64) -> StatusReport {
        let mut bank = ServoBank::new(&ServoConfig::default(), ServoDriver::simulation());
        bank.set_angle(0, angle).unwrap();
        let sampler = SensorSampler::new(None, SensorConfig::default());
        let session = ControllerSession::new(Duration::from_secs(3));
        StatusReport::project(&bank, &sampler, session.status(), HardwareBuses::default())
    }

    #[test]
    fn test_recent_is_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = LogStore::open(dir.path().join("log.jsonl")).unwrap();
        assert!(store.recent(1).unwrap().is_empty());

        for angle in [10, 20, 30] {
            store.append(Utc::now(), &report(angle)).unwrap();
        }

        let recent = store.recent(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, 3);
        assert_eq!(recent[0].servos.channels[0].angle, 30);
        assert_eq!(recent[1].servos.channels[0].angle, 20);
        assert_eq!(store.recent(100).unwrap().len(), 3);
    }

    #[test]
    fn test_recent_across_many_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");
        let store = LogStore::open(&path).unwrap();
        for i in 0..400 {
            store.append(Utc::now(), &report(i % 181)).unwrap();
        }
        assert!(fs::metadata(&path).unwrap().len() > 4 * READ_BLOCK);

        let recent = store.recent(5).unwrap();
        let ids: Vec<u64> = recent.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![400, 399, 398, 397, 396]);
        assert_eq!(recent[0].servos.channels[0].angle, (399 % 181) as u8);

        let all = store.recent(1000).unwrap();
        assert_eq!(all.len(), 400);
        assert!(all.windows(2).all(|w| w[0].id == w[1].id + 1));

        let reopened = LogStore::open(&path).unwrap();
        assert_eq!(reopened.append(Utc::now(), &report(0)).unwrap(), 401);
    }

    #[test]
    fn test_ids_continue_after_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");
        {
            let store = LogStore::open(&path).unwrap();
            store.append(Utc::now(), &report(10)).unwrap();
            store.append(Utc::now(), &report(11)).unwrap();
        }
        let store = LogStore::open(&path).unwrap();
        assert_eq!(store.append(Utc::now(), &report(12)).unwrap(), 3);
    }

    #[test]
    fn test_bad_lines_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");
        let store = LogStore::open(&path).unwrap();
        store.append(Utc::now(), &report(45)).unwrap();

        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "{{not json").unwrap();
        store.append(Utc::now(), &report(46)).unwrap();

        let recent = store.recent(10).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].servos.channels[0].angle, 46);
    }

    #[test]
    fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = LogStore::open(dir.path().join("nested/log.jsonl")).unwrap();
        store.append(Utc::now(), &report(90)).unwrap();
        store.clear().unwrap();
        assert!(store.recent(10).unwrap().is_empty());
        assert_eq!(store.append(Utc::now(), &report(90)).unwrap(), 1);
    }
}
