//! Interaction Recorder Module
//!
//! Appends one markdown section per turn to a session log under the logs
//! directory. Files are never rewritten: each record is appended and flushed
//! before `record` returns.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use recorder::{InteractionSink, MarkdownRecorder};
//!
//! let mut recorder = MarkdownRecorder::create(&log_dir, Local::now())?;
//! recorder.record(&InteractionRecord::from_outcome(session_id, &outcome))?;
//! ```

use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::AppError;
use crate::fs_manager::PortablePathManager;
use crate::triage::outcome::InteractionRecord;

/// Destination for interaction records.
pub trait InteractionSink {
    fn record(&mut self, record: &InteractionRecord) -> Result<(), AppError>;
}

/// Session log written as `convo_<YYYYmmdd_HHMMSS>.md`.
pub struct MarkdownRecorder {
    path: PathBuf,
    file: File,
    turns_recorded: usize,
}

impl MarkdownRecorder {
    /// Creates the session file in `log_dir` and writes its header.
    pub fn create(log_dir: &Path, started: DateTime<Local>) -> Result<Self, AppError> {
        PortablePathManager::ensure_dir(log_dir)?;

        let path = log_dir.join(format!("convo_{}.md", started.format("%Y%m%d_%H%M%S")));
        let is_new = !path.exists();
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;

        if is_new {
            writeln!(
                file,
                "# SymSafe Interaction Log – {}\n",
                started.format("%Y-%m-%d %H:%M:%S")
            )?;
            file.flush()?;
        }

        info!("📝 Interaction log: {:?}", path);

        Ok(Self {
            path,
            file,
            turns_recorded: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn turns_recorded(&self) -> usize {
        self.turns_recorded
    }

    /// Reads back the whole session file.
    pub fn contents(&self) -> Result<String, AppError> {
        Ok(fs::read_to_string(&self.path)?)
    }
}

impl InteractionSink for MarkdownRecorder {
    fn record(&mut self, record: &InteractionRecord) -> Result<(), AppError> {
        let section = render_record(record);
        self.file.write_all(section.as_bytes())?;
        self.file.flush()?;
        self.turns_recorded += 1;
        debug!("Recorded turn {} to {:?}", self.turns_recorded, self.path);
        Ok(())
    }
}

/// Markdown section for one turn, terminated by a `---` rule.
pub fn render_record(record: &InteractionRecord) -> String {
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(out, "## {}", record.timestamp.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(out, "**User:** {}\n", record.user_input);

    match (&record.matched_key, record.similarity) {
        (Some(key), Some(score)) => {
            let _ = writeln!(
                out,
                "**Match:** {} ({}, similarity {:.2})",
                key,
                record.match_kind_label(),
                score
            );
        }
        _ => {
            let _ = writeln!(out, "**Match:** none (fallback)");
        }
    }
    let _ = writeln!(out, "**Urgency:** {}", record.urgency_label);
    if !record.red_flags.is_empty() {
        let _ = writeln!(out, "**Red flags:** {}", record.red_flags.join(", "));
    }

    let label = if record.response.is_failed() {
        "Error"
    } else {
        "Response"
    };
    let _ = writeln!(out, "\n**{}:** {}\n", label, record.response.display_text());

    if let Some(checklist) = &record.evaluation {
        let _ = writeln!(out, "**Checklist:**\n{}\n", checklist.to_markdown());
    }
    if let Some(review) = &record.review {
        let _ = writeln!(out, "**Review:**\n{}\n", review);
    }

    out.push_str("---\n\n");
    out
}
