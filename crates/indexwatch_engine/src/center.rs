//! Mounted notification center and its context handle.

use std::sync::{Arc, Mutex};

use indexwatch_core::{
    update_slot, DismissReason, DropReason, Notification, Shown, Slot, SlotEffect, SlotMsg,
    SlotSettings,
};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use watch_logging::{watch_debug, watch_info, watch_warn};

use crate::bus::EventBus;
use crate::timer::{lock, TimerSlot};

/// Runs once when a displayed notification leaves its slot.
pub type CloseCallback = Box<dyn FnOnce() + Send + 'static>;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    #[error("no tokio runtime is available to run notification timers")]
    NoRuntime,
}

/// What happened to the slot, for renderers and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CenterEvent {
    Shown {
        generation: u64,
        notification: Notification,
    },
    Dismissed {
        generation: u64,
        notification: Notification,
        reason: DismissReason,
    },
    Dropped {
        message: String,
        reason: DropReason,
    },
}

struct CenterState {
    slot: Slot,
    mounted: bool,
    pending_close: Option<(u64, CloseCallback)>,
    visible_close: Option<(u64, CloseCallback)>,
    debounce: TimerSlot,
    expiry: TimerSlot,
    error_listener: Option<JoinHandle<()>>,
}

struct CenterShared {
    state: Mutex<CenterState>,
    runtime: Handle,
    view_tx: watch::Sender<Option<Shown>>,
    events_tx: broadcast::Sender<CenterEvent>,
}

impl CenterShared {
    fn dispatch(self: &Arc<Self>, msg: SlotMsg, on_close: Option<CloseCallback>) {
        self.dispatch_inner(msg, on_close, false);
    }

    fn dispatch_inner(
        self: &Arc<Self>,
        msg: SlotMsg,
        mut on_close: Option<CloseCallback>,
        unmount: bool,
    ) {
        let mut callbacks = Vec::new();
        {
            let mut state = lock(&self.state);
            if !state.mounted {
                watch_debug!("notification center not mounted; ignoring {:?}", msg);
                return;
            }
            let slot = std::mem::take(&mut state.slot);
            let (slot, effects) = update_slot(slot, msg);
            state.slot = slot;
            for effect in effects {
                self.apply(&mut state, effect, &mut on_close, &mut callbacks);
            }
            if unmount {
                state.mounted = false;
                state.debounce.clear();
                state.expiry.clear();
                state.pending_close = None;
                if let Some(listener) = state.error_listener.take() {
                    listener.abort();
                }
            }
        }
        // Callbacks may notify again; run them without the lock.
        for callback in callbacks {
            callback();
        }
    }

    fn apply(
        self: &Arc<Self>,
        state: &mut CenterState,
        effect: SlotEffect,
        on_close: &mut Option<CloseCallback>,
        callbacks: &mut Vec<CloseCallback>,
    ) {
        match effect {
            SlotEffect::StartDebounce { generation, delay } => {
                state.pending_close = on_close.take().map(|callback| (generation, callback));
                let shared = Arc::clone(self);
                state.debounce.replace(&self.runtime, delay, move || {
                    shared.dispatch(SlotMsg::DebounceElapsed { generation }, None);
                });
            }
            SlotEffect::CancelDebounce => {
                state.debounce.clear();
                state.pending_close = None;
            }
            SlotEffect::Show {
                generation,
                notification,
            } => {
                state.visible_close = match state.pending_close.take() {
                    Some((pending, callback)) if pending == generation => {
                        Some((generation, callback))
                    }
                    _ => None,
                };
                watch_info!(
                    "notification shown [{}] {}",
                    notification.kind,
                    notification.message
                );
                self.view_tx.send_replace(state.slot.visible().cloned());
                let _ = self.events_tx.send(CenterEvent::Shown {
                    generation,
                    notification,
                });
            }
            SlotEffect::ScheduleExpiry { generation, after } => {
                let shared = Arc::clone(self);
                state.expiry.replace(&self.runtime, after, move || {
                    shared.dispatch(SlotMsg::Expired { generation }, None);
                });
            }
            SlotEffect::CancelExpiry => state.expiry.clear(),
            SlotEffect::Dismissed {
                generation,
                notification,
                reason,
            } => {
                if let Some((visible, callback)) = state.visible_close.take() {
                    if visible == generation {
                        callbacks.push(callback);
                    } else {
                        state.visible_close = Some((visible, callback));
                    }
                }
                watch_debug!(
                    "notification dismissed ({:?}) {}",
                    reason,
                    notification.message
                );
                self.view_tx.send_replace(state.slot.visible().cloned());
                let _ = self.events_tx.send(CenterEvent::Dismissed {
                    generation,
                    notification,
                    reason,
                });
            }
            SlotEffect::Dropped { message, reason } => {
                watch_debug!("notification dropped ({:?}) {}", reason, message);
                let _ = self.events_tx.send(CenterEvent::Dropped { message, reason });
            }
        }
    }
}

/// The mounted notification center.
///
/// Owns one display slot. Code inside the owning view talks to it through
/// cloned [`Notifier`] handles. Dropping the center unmounts it.
pub struct NotificationCenter {
    shared: Arc<CenterShared>,
}

impl NotificationCenter {
    /// Mounts a center on the current tokio runtime.
    pub fn mount(settings: SlotSettings) -> Result<Self, NotifyError> {
        let runtime = Handle::try_current().map_err(|_| NotifyError::NoRuntime)?;
        Ok(Self::mount_on(runtime, settings))
    }

    pub fn mount_on(runtime: Handle, settings: SlotSettings) -> Self {
        let (view_tx, _) = watch::channel(None);
        let (events_tx, _) = broadcast::channel(EVENT_CAPACITY);
        let state = CenterState {
            slot: Slot::new(settings),
            mounted: true,
            pending_close: None,
            visible_close: None,
            debounce: TimerSlot::default(),
            expiry: TimerSlot::default(),
            error_listener: None,
        };
        Self {
            shared: Arc::new(CenterShared {
                state: Mutex::new(state),
                runtime,
                view_tx,
                events_tx,
            }),
        }
    }

    pub fn notifier(&self) -> Notifier {
        Notifier {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Forwards API error events from `bus` as error notifications.
    ///
    /// Only the first call subscribes; later calls are no-ops.
    pub fn attach_error_channel(&self, bus: &EventBus) {
        let mut state = lock(&self.shared.state);
        if !state.mounted || state.error_listener.is_some() {
            return;
        }
        let mut api_errors = bus.subscribe_api_errors();
        let notifier = self.notifier();
        state.error_listener = Some(self.shared.runtime.spawn(async move {
            loop {
                match api_errors.recv().await {
                    Ok(event) => notifier.notify(
                        Notification::error(event.message)
                            .suppressed(event.suppress_global_toast),
                    ),
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        watch_warn!("missed {} api error events", missed);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }));
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Shown>> {
        self.shared.view_tx.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<CenterEvent> {
        self.shared.events_tx.subscribe()
    }

    pub fn current(&self) -> Option<Shown> {
        self.shared.view_tx.borrow().clone()
    }

    pub fn is_mounted(&self) -> bool {
        lock(&self.shared.state).mounted
    }

    /// Dismisses everything, stops all timers and the error subscription.
    pub fn unmount(&self) {
        self.shared.dispatch_inner(SlotMsg::Clear, None, true);
    }
}

impl Drop for NotificationCenter {
    fn drop(&mut self) {
        self.unmount();
    }
}

/// Context handle onto a mounted [`NotificationCenter`].
#[derive(Clone)]
pub struct Notifier {
    shared: Arc<CenterShared>,
}

impl Notifier {
    pub fn notify(&self, notification: Notification) {
        self.shared.dispatch(SlotMsg::Notify(notification), None);
    }

    /// Like [`Notifier::notify`]; `on_close` runs when the notification
    /// leaves the slot after having been shown.
    pub fn notify_with_close(&self, notification: Notification, on_close: CloseCallback) {
        self.shared
            .dispatch(SlotMsg::Notify(notification), Some(on_close));
    }

    pub fn close(&self) {
        self.shared.dispatch(SlotMsg::Close, None);
    }

    pub fn current(&self) -> Option<Shown> {
        self.shared.view_tx.borrow().clone()
    }

    /// Runtime the center was mounted on; work tied to this center runs
    /// there.
    pub(crate) fn runtime(&self) -> &Handle {
        &self.shared.runtime
    }
}
