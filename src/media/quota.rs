// src/media/quota.rs
//! Daily image quota, persisted as `{"date":"YYYY-MM-DD","count":N}`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct DailyCounter {
    date: NaiveDate,
    count: u32,
}

#[derive(Debug)]
pub struct MediaQuota {
    counter: DailyCounter,
    ceiling: u32,
    path: Option<PathBuf>,
}

impl MediaQuota {
    pub fn in_memory(ceiling: u32, today: NaiveDate) -> Self {
        Self {
            counter: DailyCounter { date: today, count: 0 },
            ceiling,
            path: None,
        }
    }

    /// Load from `path`; missing or corrupt state starts a fresh day.
    pub fn load<P: AsRef<Path>>(path: P, ceiling: u32, today: NaiveDate) -> Self {
        let path = path.as_ref().to_path_buf();
        let counter = fs::read_to_string(&path)
            .ok()
            .and_then(|s| serde_json::from_str::<DailyCounter>(&s).ok())
            .unwrap_or(DailyCounter { date: today, count: 0 });
        Self {
            counter: DailyCounter {
                count: counter.count.min(ceiling),
                ..counter
            },
            ceiling,
            path: Some(path),
        }
    }

    /// Zero the counter when `today` differs from the stored day marker.
    /// Returns true when a reset happened.
    pub fn roll_over(&mut self, today: NaiveDate) -> bool {
        if self.counter.date == today {
            return false;
        }
        self.counter = DailyCounter { date: today, count: 0 };
        self.save();
        true
    }

    pub fn has_capacity(&mut self, today: NaiveDate) -> bool {
        self.roll_over(today);
        self.counter.count < self.ceiling
    }

    /// Count one generated image. Never passes the ceiling.
    pub fn record_success(&mut self, today: NaiveDate) {
        self.roll_over(today);
        if self.counter.count < self.ceiling {
            self.counter.count += 1;
            self.save();
        }
    }

    pub fn used(&self) -> u32 {
        self.counter.count
    }

    pub fn ceiling(&self) -> u32 {
        self.ceiling
    }

    pub fn day(&self) -> NaiveDate {
        self.counter.date
    }

    fn save(&self) {
        let Some(path) = &self.path else {
            return;
        };
        if let Err(e) = save_counter(path, &self.counter) {
            tracing::warn!(path = %path.display(), error = %e, "media quota write failed");
        }
    }
}

fn save_counter(path: &Path, dc: &DailyCounter) -> io::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let tmp = path.with_extension("json.tmp");
    let s = serde_json::to_string(dc).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let mut f = fs::File::create(&tmp)?;
    f.write_all(s.as_bytes())?;
    fs::rename(tmp, path)
}
