//! Indexwatch engine: async drivers for status polling, notification
//! delivery and job control, plus the HTTP job client.
mod bus;
mod center;
mod client;
mod control;
mod http;
mod poller;
mod rules;
mod timer;
mod toast;

pub use bus::{ApiErrorEvent, EventBus, SessionEvent};
pub use center::{CenterEvent, CloseCallback, NotificationCenter, Notifier, NotifyError};
pub use client::{ClientError, JobClient};
pub use control::{JobControl, JobView, ToggleOutcome, MODIFIED_MESSAGE, NOT_MODIFIED_MESSAGE};
pub use http::{ClientSettings, HttpJobClient};
pub use poller::{PollHandle, PollSettings, StatusPoller, TerminalCallback};
pub use rules::RuleSummaryCache;
pub use toast::StandaloneToast;
