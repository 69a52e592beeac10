use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::{
    foundation::error::{InkError, InkResult},
    quiz::progression::QuizWeek,
};

/// One row of the quiz ledger.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct HistoryEntry {
    pub week: i64,
    pub track_name: String,
}

/// Which track was shown in which week, persisted as `week,track_name` CSV.
///
/// Only used to keep recently shown tracks from repeating; selection stays re-derivable
/// without it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuizHistory {
    entries: Vec<HistoryEntry>,
}

impl QuizHistory {
    pub fn from_entries(entries: Vec<HistoryEntry>) -> Self {
        Self { entries }
    }

    /// Read the ledger; a missing file is an empty history.
    pub fn load(path: &Path) -> InkResult<Self> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("open quiz history '{}'", path.display()))?;
        let entries = reader
            .deserialize::<HistoryEntry>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| InkError::validation(format!("parse '{}': {e}", path.display())))?;
        Ok(Self { entries })
    }

    /// Write the whole ledger through a sibling temp file and rename it into place.
    pub fn save(&self, path: &Path) -> InkResult<()> {
        let tmp: PathBuf = path.with_extension("csv.tmp");
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create '{}'", parent.display()))?;
        }
        {
            let mut writer = csv::Writer::from_path(&tmp)
                .with_context(|| format!("create '{}'", tmp.display()))?;
            for entry in &self.entries {
                writer
                    .serialize(entry)
                    .with_context(|| format!("write '{}'", tmp.display()))?;
            }
            writer
                .flush()
                .with_context(|| format!("flush '{}'", tmp.display()))?;
        }
        std::fs::rename(&tmp, path)
            .with_context(|| format!("replace '{}'", path.display()))?;
        Ok(())
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Track recorded for `week` (the last one wins if the ledger has duplicates).
    pub fn track_for_week(&self, week: QuizWeek) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.week == week.0)
            .map(|e| e.track_name.as_str())
    }

    /// Up to `k` most recent track names recorded for weeks before `week`.
    pub fn recent_before(&self, week: QuizWeek, k: usize) -> Vec<&str> {
        let earlier: Vec<&str> = self
            .entries
            .iter()
            .filter(|e| e.week < week.0)
            .map(|e| e.track_name.as_str())
            .collect();
        earlier[earlier.len().saturating_sub(k)..].to_vec()
    }

    /// Append `week -> track` unless the week is already recorded. Returns whether it changed.
    pub fn record(&mut self, week: QuizWeek, track_name: &str) -> bool {
        if self.track_for_week(week).is_some() {
            return false;
        }
        self.entries.push(HistoryEntry {
            week: week.0,
            track_name: track_name.to_string(),
        });
        true
    }
}

#[cfg(test)]
#[path = "../../tests/unit/quiz/history.rs"]
mod tests;
