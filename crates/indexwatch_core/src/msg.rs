use crate::{JobStatus, Notification};

/// Inputs to a poll session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollMsg {
    /// The owning view mounted the session.
    Start,
    /// The wait between cycles elapsed.
    CycleDue,
    /// A status fetch resolved.
    FetchSucceeded(JobStatus),
    /// A status fetch failed.
    FetchFailed(FetchFailure),
    /// Stop requested (unmount, logout or explicit stop).
    Cancel,
    /// Forget the cached status so the display falls back to unknown.
    ClearStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchFailure {
    /// Network or decoding trouble; retried.
    Transient,
    /// The session is no longer valid; never retried.
    Unauthorized,
}

/// Inputs to a notification slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotMsg {
    Notify(Notification),
    /// The debounce timer started for `generation` fired.
    DebounceElapsed { generation: u64 },
    /// The expiry timer started for `generation` fired.
    Expired { generation: u64 },
    /// Manual dismissal of the visible notification.
    Close,
    /// The slot is being unmounted; drop everything.
    Clear,
}
