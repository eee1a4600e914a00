//! Free-standing notifications for call sites outside any mounted view.
//!
//! A [`StandaloneToast`] is its own display instance: it mounts immediately,
//! owns its expiry timer and tears itself down on expiry or manual close.
//! It needs no [`NotificationCenter`](crate::NotificationCenter).

use std::sync::{Arc, Mutex};
use std::time::Duration;

use indexwatch_core::{update_slot, Notification, Shown, Slot, SlotEffect, SlotMsg, SlotSettings};
use tokio::runtime::Handle;
use tokio::sync::watch;
use watch_logging::{watch_debug, watch_info};

use crate::center::{CloseCallback, NotifyError};
use crate::timer::{lock, TimerSlot};

struct ToastState {
    slot: Slot,
    mounted: bool,
    expiry: TimerSlot,
    on_close: Option<CloseCallback>,
}

struct ToastShared {
    state: Mutex<ToastState>,
    runtime: Handle,
    view_tx: watch::Sender<Option<Shown>>,
}

impl ToastShared {
    fn dispatch(self: &Arc<Self>, msg: SlotMsg) {
        let mut teardown = None;
        {
            let mut state = lock(&self.state);
            if !state.mounted {
                return;
            }
            let slot = std::mem::take(&mut state.slot);
            let (slot, effects) = update_slot(slot, msg);
            state.slot = slot;
            for effect in effects {
                match effect {
                    SlotEffect::Show { notification, .. } => {
                        watch_info!(
                            "standalone notification [{}] {}",
                            notification.kind,
                            notification.message
                        );
                        self.view_tx.send_replace(state.slot.visible().cloned());
                    }
                    SlotEffect::ScheduleExpiry { generation, after } => {
                        let shared = Arc::clone(self);
                        state.expiry.replace(&self.runtime, after, move || {
                            shared.dispatch(SlotMsg::Expired { generation });
                        });
                    }
                    SlotEffect::CancelExpiry => state.expiry.clear(),
                    SlotEffect::Dismissed { reason, .. } => {
                        watch_debug!("standalone notification dismissed ({:?})", reason);
                        state.mounted = false;
                        state.expiry.clear();
                        self.view_tx.send_replace(None);
                        teardown = state.on_close.take();
                    }
                    SlotEffect::StartDebounce { .. }
                    | SlotEffect::CancelDebounce
                    | SlotEffect::Dropped { .. } => {}
                }
            }
        }
        if let Some(on_close) = teardown {
            on_close();
        }
    }
}

/// Handle onto a standalone notification. Dropping the handle does not
/// dismiss it; it lives until it expires or is closed.
pub struct StandaloneToast {
    shared: Arc<ToastShared>,
}

impl StandaloneToast {
    /// Shows `notification` on the current tokio runtime.
    pub fn show(
        notification: Notification,
        on_close: Option<CloseCallback>,
    ) -> Result<Self, NotifyError> {
        let runtime = Handle::try_current().map_err(|_| NotifyError::NoRuntime)?;
        Ok(Self::show_on(runtime, notification, on_close))
    }

    /// Shows `notification` using timers on `runtime`; callable from any
    /// thread. A suppressed notification never mounts and its callback is
    /// dropped unused.
    pub fn show_on(
        runtime: Handle,
        notification: Notification,
        on_close: Option<CloseCallback>,
    ) -> Self {
        let settings = SlotSettings {
            debounce: Duration::ZERO,
            ..SlotSettings::default()
        };
        let (view_tx, _) = watch::channel(None);
        let (slot, effects) = update_slot(Slot::new(settings), SlotMsg::Notify(notification));
        let generation = effects.iter().find_map(|effect| match effect {
            SlotEffect::StartDebounce { generation, .. } => Some(*generation),
            _ => None,
        });
        let mounted = generation.is_some();
        let shared = Arc::new(ToastShared {
            state: Mutex::new(ToastState {
                slot,
                mounted,
                expiry: TimerSlot::default(),
                on_close: if mounted { on_close } else { None },
            }),
            runtime,
            view_tx,
        });
        match generation {
            // No coalescing on this path: commit straight away.
            Some(generation) => shared.dispatch(SlotMsg::DebounceElapsed { generation }),
            None => watch_debug!("standalone notification suppressed"),
        }
        Self { shared }
    }

    /// Dismisses the toast now, running its callback if not yet torn down.
    pub fn close(&self) {
        self.shared.dispatch(SlotMsg::Close);
    }

    pub fn is_mounted(&self) -> bool {
        lock(&self.shared.state).mounted
    }

    pub fn current(&self) -> Option<Shown> {
        self.shared.view_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Shown>> {
        self.shared.view_tx.subscribe()
    }
}
