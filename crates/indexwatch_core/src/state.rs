use std::time::Duration;

use crate::view_model::JobViewModel;
use crate::{JobKey, JobStatus, Phase};

/// Fixed wait between the end of one fetch and the start of the next.
pub const POLL_INTERVAL: Duration = Duration::from_millis(2500);

/// Default ceiling for backed-off retry delays.
pub const MAX_RETRY_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollState {
    #[default]
    Idle,
    Polling,
    Terminal(TerminalReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalReason {
    /// The server reported a terminal phase.
    Finished(Phase),
    /// The server rejected the session.
    Unauthorized,
    /// Stopped from outside: unmount, logout or explicit stop.
    Cancelled,
    /// Too many transient failures in a row.
    RetriesExhausted,
}

/// How long to wait after a failed fetch, and when to give up.
///
/// The default never gives up and always waits [`POLL_INTERVAL`]. Raising
/// `backoff_factor` alone is enough to back off, up to
/// [`MAX_RETRY_INTERVAL`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub interval: Duration,
    /// Multiplier applied per consecutive failure; 1 keeps the delay fixed.
    pub backoff_factor: u32,
    pub max_interval: Duration,
    /// `None` retries forever.
    pub max_consecutive_failures: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval: POLL_INTERVAL,
            backoff_factor: 1,
            max_interval: MAX_RETRY_INTERVAL,
            max_consecutive_failures: None,
        }
    }
}

impl RetryPolicy {
    /// Delay before the next cycle after `failures` consecutive failures.
    pub fn delay_after(&self, failures: u32) -> Duration {
        if failures == 0 || self.backoff_factor <= 1 {
            return self.interval;
        }
        let exponent = failures.saturating_sub(1).min(31);
        let multiplier = self.backoff_factor.saturating_pow(exponent);
        self.interval
            .saturating_mul(multiplier)
            .min(self.max_interval.max(self.interval))
    }

    pub fn is_exhausted(&self, failures: u32) -> bool {
        self.max_consecutive_failures
            .is_some_and(|max| failures >= max)
    }
}

/// Repeated status querying bound to one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSession {
    job_key: JobKey,
    state: PollState,
    cancelled: bool,
    in_flight: bool,
    latest_status: Option<JobStatus>,
    cycle: u64,
    consecutive_failures: u32,
    policy: RetryPolicy,
}

impl PollSession {
    pub fn new(job_key: JobKey) -> Self {
        Self::with_policy(job_key, RetryPolicy::default())
    }

    pub fn with_policy(job_key: JobKey, policy: RetryPolicy) -> Self {
        Self {
            job_key,
            state: PollState::Idle,
            cancelled: false,
            in_flight: false,
            latest_status: None,
            cycle: 0,
            consecutive_failures: 0,
            policy,
        }
    }

    pub fn job_key(&self) -> &JobKey {
        &self.job_key
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, PollState::Terminal(_))
    }

    pub fn latest_status(&self) -> Option<&JobStatus> {
        self.latest_status.as_ref()
    }

    /// Number of fetches issued so far.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn view(&self) -> JobViewModel {
        JobViewModel::from_session(self)
    }

    pub(crate) fn begin_fetch(&mut self) {
        self.state = PollState::Polling;
        self.in_flight = true;
        self.cycle += 1;
    }

    pub(crate) fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub(crate) fn finish_fetch(&mut self) {
        self.in_flight = false;
    }

    pub(crate) fn record_status(&mut self, status: JobStatus) {
        self.consecutive_failures = 0;
        self.latest_status = Some(status);
    }

    pub(crate) fn record_failure(&mut self) -> u32 {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.consecutive_failures
    }

    pub(crate) fn clear_status(&mut self) {
        self.latest_status = None;
    }

    /// Sets the cancelled flag and moves to `Terminal(reason)` unless a
    /// terminal reason was already recorded.
    pub(crate) fn terminate(&mut self, reason: TerminalReason) {
        self.cancelled = true;
        if !self.is_terminal() {
            self.state = PollState::Terminal(reason);
        }
    }
}
