use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The user's session ended; background work must stop.
    LoggedOut,
}

/// An API failure offered to the global notification path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiErrorEvent {
    pub message: String,
    /// The call site already handles the failure; do not show a toast.
    pub suppress_global_toast: bool,
}

/// Explicit publish/subscribe service shared by pollers and notification
/// centers. Cloning yields another handle onto the same channels.
#[derive(Debug, Clone)]
pub struct EventBus {
    session_tx: broadcast::Sender<SessionEvent>,
    api_error_tx: broadcast::Sender<ApiErrorEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (session_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (api_error_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            session_tx,
            api_error_tx,
        }
    }

    pub fn publish_logout(&self) {
        // No subscribers is fine.
        let _ = self.session_tx.send(SessionEvent::LoggedOut);
    }

    pub fn publish_api_error(&self, event: ApiErrorEvent) {
        let _ = self.api_error_tx.send(event);
    }

    pub fn subscribe_session(&self) -> broadcast::Receiver<SessionEvent> {
        self.session_tx.subscribe()
    }

    pub fn subscribe_api_errors(&self) -> broadcast::Receiver<ApiErrorEvent> {
        self.api_error_tx.subscribe()
    }

    /// Live session subscriptions, one per running poll session.
    pub fn session_subscribers(&self) -> usize {
        self.session_tx.receiver_count()
    }

    pub fn api_error_subscribers(&self) -> usize {
        self.api_error_tx.receiver_count()
    }
}
