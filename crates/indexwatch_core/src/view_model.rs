use crate::{JobKey, Phase, PollSession, PollState};

/// What the job display should communicate, derived from the latest status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activity {
    /// No status fetched yet, or the cache was cleared.
    #[default]
    Unknown,
    Queued,
    Processing,
    Completed,
    Paused,
    Error,
}

impl From<Phase> for Activity {
    fn from(phase: Phase) -> Self {
        match phase {
            Phase::Queued => Activity::Queued,
            Phase::Parsing | Phase::Cleaning | Phase::Splitting | Phase::Indexing => {
                Activity::Processing
            }
            Phase::Completed => Activity::Completed,
            Phase::Paused => Activity::Paused,
            Phase::Error => Activity::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobViewModel {
    pub job_key: JobKey,
    pub activity: Activity,
    pub phase: Option<Phase>,
    pub percent: u8,
    pub completed_units: Option<u64>,
    pub total_units: Option<u64>,
    pub error: Option<String>,
    pub polling: bool,
}

impl JobViewModel {
    pub(crate) fn from_session(session: &PollSession) -> Self {
        let status = session.latest_status();
        Self {
            job_key: session.job_key().clone(),
            activity: status.map(|s| Activity::from(s.phase)).unwrap_or_default(),
            phase: status.map(|s| s.phase),
            percent: status.map(|s| s.progress_percent()).unwrap_or(0),
            completed_units: status.map(|s| s.completed_units),
            total_units: status.map(|s| s.total_units),
            error: status.and_then(|s| s.error.clone()),
            polling: !session.is_cancelled() && session.state() != PollState::Idle,
        }
    }

    pub fn can_pause(&self) -> bool {
        self.activity == Activity::Processing
    }

    pub fn can_resume(&self) -> bool {
        self.activity == Activity::Paused
    }

    /// `completed/total · percent%`, with `--` for unknown (or zero) counts.
    pub fn segments_label(&self) -> String {
        let format_count = |count: Option<u64>| match count {
            Some(value) if value > 0 => value.to_string(),
            _ => "--".to_string(),
        };
        format!(
            "{}/{} · {}%",
            format_count(self.completed_units),
            format_count(self.total_units),
            self.percent
        )
    }
}
