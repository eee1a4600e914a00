use std::fmt;
use std::time::Duration;

/// Default display time for success and info notifications.
pub const SHORT_DURATION: Duration = Duration::from_millis(3000);
/// Default display time for warning and error notifications.
pub const LONG_DURATION: Duration = Duration::from_millis(6000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NotificationKind::Success => "success",
            NotificationKind::Error => "error",
            NotificationKind::Warning => "warning",
            NotificationKind::Info => "info",
        };
        f.write_str(label)
    }
}

/// A user-facing alert request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    /// Drop the request silently instead of showing it.
    pub suppress: bool,
    /// Explicit display time; `None` derives it from `kind`.
    pub duration: Option<Duration>,
    pub closable: bool,
}

impl Notification {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            suppress: false,
            duration: None,
            closable: true,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Warning, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Info, message)
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn suppressed(mut self, suppress: bool) -> Self {
        self.suppress = suppress;
        self
    }

    pub fn closable(mut self, closable: bool) -> Self {
        self.closable = closable;
        self
    }

    /// Display time using the built-in short/long defaults.
    pub fn effective_duration(&self) -> Duration {
        self.duration_or(SHORT_DURATION, LONG_DURATION)
    }

    pub fn duration_or(&self, short: Duration, long: Duration) -> Duration {
        self.duration.unwrap_or(match self.kind {
            NotificationKind::Success | NotificationKind::Info => short,
            NotificationKind::Warning | NotificationKind::Error => long,
        })
    }
}
