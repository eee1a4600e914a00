use std::time::Duration;

use crate::{JobKey, Notification};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEffect {
    /// Issue one status fetch.
    Fetch(JobKey),
    /// Wait, then feed `PollMsg::CycleDue`.
    ScheduleCycle(Duration),
    /// Drop the pending wait, if any.
    CancelScheduled,
    /// The job reached a terminal phase; run the caller's callback.
    InvokeTerminal,
    Notify(Notification),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotEffect {
    /// Start (or restart) the debounce timer for `generation`.
    StartDebounce { generation: u64, delay: Duration },
    CancelDebounce,
    Show {
        generation: u64,
        notification: Notification,
    },
    ScheduleExpiry { generation: u64, after: Duration },
    CancelExpiry,
    Dismissed {
        generation: u64,
        notification: Notification,
        reason: DismissReason,
    },
    /// The request never reached the slot.
    Dropped {
        message: String,
        reason: DropReason,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissReason {
    Expired,
    Closed,
    Superseded,
    Unmounted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    Suppressed,
    Duplicate,
}
