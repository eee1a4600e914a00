use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Identifies the indexing job of one document inside one dataset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobKey {
    pub dataset_id: String,
    pub document_id: String,
}

impl JobKey {
    pub fn new(dataset_id: impl Into<String>, document_id: impl Into<String>) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            document_id: document_id.into(),
        }
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.dataset_id, self.document_id)
    }
}

/// Coarse lifecycle state of a job as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Queued,
    Parsing,
    Cleaning,
    Splitting,
    Indexing,
    Completed,
    Paused,
    Error,
}

impl Phase {
    /// Phases after which polling stops.
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Completed | Phase::Error | Phase::Paused)
    }

    /// Phases in which the job is being worked on and can be paused.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            Phase::Parsing | Phase::Cleaning | Phase::Splitting | Phase::Indexing
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Queued => "queued",
            Phase::Parsing => "parsing",
            Phase::Cleaning => "cleaning",
            Phase::Splitting => "splitting",
            Phase::Indexing => "indexing",
            Phase::Completed => "completed",
            Phase::Paused => "paused",
            Phase::Error => "error",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown indexing phase {0:?}")]
pub struct UnknownPhase(pub String);

impl FromStr for Phase {
    type Err = UnknownPhase;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "queued" | "waiting" => Ok(Phase::Queued),
            "parsing" => Ok(Phase::Parsing),
            "cleaning" => Ok(Phase::Cleaning),
            "splitting" => Ok(Phase::Splitting),
            "indexing" => Ok(Phase::Indexing),
            "completed" => Ok(Phase::Completed),
            "paused" => Ok(Phase::Paused),
            "error" => Ok(Phase::Error),
            _ => Err(UnknownPhase(raw.to_string())),
        }
    }
}

/// Snapshot of a job as returned by one status fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatus {
    pub phase: Phase,
    pub completed_units: u64,
    pub total_units: u64,
    pub error: Option<String>,
}

impl JobStatus {
    pub fn new(phase: Phase, completed_units: u64, total_units: u64) -> Self {
        Self {
            phase,
            completed_units,
            total_units,
            error: None,
        }
    }

    /// Rounded completion percentage in `0..=100`.
    ///
    /// Zero when the total is unknown. The server's counts are not trusted:
    /// a completed count above the total still yields 100.
    pub fn progress_percent(&self) -> u8 {
        if self.total_units == 0 {
            return 0;
        }
        let completed = u128::from(self.completed_units);
        let total = u128::from(self.total_units);
        // Round half up on completed * 100 / total.
        let percent = (completed * 200 + total) / (total * 2);
        percent.min(100) as u8
    }
}

/// General (single level) or hierarchical (parent/child) segmentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentationMode {
    General,
    Hierarchical,
}

/// What a parent chunk spans in hierarchical mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentMode {
    Paragraph,
    FullDoc,
}

/// Processing rules the server applied to a document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RuleSummary {
    pub mode: Option<SegmentationMode>,
    pub max_tokens: Option<u32>,
    pub child_max_tokens: Option<u32>,
    pub parent_mode: Option<ParentMode>,
    pub enabled_rules: Vec<String>,
}
