//! Learning log: developer corrections collected in learning mode.
//!
//! Stored as JSON lines in `learning_log.jsonl`, one correction per line.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::fs_manager::PortablePathManager;

const LEARNING_LOG_FILENAME: &str = "learning_log.jsonl";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningEntry {
    pub timestamp: DateTime<Local>,
    pub session_id: Uuid,
    pub input: String,
    pub correction: String,
}

impl LearningEntry {
    pub fn new(session_id: Uuid, input: &str, correction: &str) -> Self {
        Self {
            timestamp: Local::now(),
            session_id,
            input: input.to_string(),
            correction: correction.trim().to_string(),
        }
    }
}

pub struct LearningLog {
    path: PathBuf,
}

impl LearningLog {
    /// Opens the log in `log_dir`, creating the directory if needed.
    pub fn open(log_dir: &Path) -> Result<Self, AppError> {
        PortablePathManager::ensure_dir(log_dir)?;
        let path = log_dir.join(LEARNING_LOG_FILENAME);
        info!("🎓 Learning log: {:?}", path);
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, entry: &LearningEntry) -> Result<(), AppError> {
        let line = serde_json::to_string(entry)?;
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{}", line)?;
        file.flush()?;
        Ok(())
    }

    /// All stored entries. Lines that fail to parse are skipped.
    pub fn entries(&self) -> Result<Vec<LearningEntry>, AppError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(fs::File::open(&self.path)?);
        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<LearningEntry>(trimmed) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!("Skipping learning log line: {} - line: {}", e, trimmed),
            }
        }
        Ok(entries)
    }
}
