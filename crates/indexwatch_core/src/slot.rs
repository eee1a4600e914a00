//! Single-notification display slot.
//!
//! The slot owns the de-duplication, debounce and expiry rules shared by the
//! mounted notification center and by standalone toasts. Timers are not run
//! here: the slot emits [`SlotEffect`]s naming the timer it wants and is fed
//! the firing back as a [`SlotMsg`] carrying the generation it was started
//! for. A firing whose generation no longer matches is stale and ignored.

use std::time::Duration;

use crate::notification::{LONG_DURATION, SHORT_DURATION};
use crate::{DismissReason, DropReason, Notification, SlotEffect, SlotMsg};

/// Default coalescing window for rapid notify calls.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotSettings {
    pub debounce: Duration,
    pub short_duration: Duration,
    pub long_duration: Duration,
}

impl Default for SlotSettings {
    fn default() -> Self {
        Self {
            debounce: DEBOUNCE_WINDOW,
            short_duration: SHORT_DURATION,
            long_duration: LONG_DURATION,
        }
    }
}

/// The notification currently occupying the slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shown {
    pub generation: u64,
    pub notification: Notification,
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Pending {
    generation: u64,
    notification: Notification,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Slot {
    settings: SlotSettings,
    visible: Option<Shown>,
    pending: Option<Pending>,
    last_generation: u64,
}

impl Slot {
    pub fn new(settings: SlotSettings) -> Self {
        Self {
            settings,
            visible: None,
            pending: None,
            last_generation: 0,
        }
    }

    pub fn settings(&self) -> &SlotSettings {
        &self.settings
    }

    pub fn visible(&self) -> Option<&Shown> {
        self.visible.as_ref()
    }

    pub fn pending(&self) -> Option<&Notification> {
        self.pending.as_ref().map(|pending| &pending.notification)
    }

    /// Generation assigned to the pending request, if one is waiting.
    pub fn pending_generation(&self) -> Option<u64> {
        self.pending.as_ref().map(|pending| pending.generation)
    }

    fn is_duplicate(&self, message: &str) -> bool {
        self.visible
            .as_ref()
            .is_some_and(|shown| shown.notification.message == message)
            || self
                .pending
                .as_ref()
                .is_some_and(|pending| pending.notification.message == message)
    }

    fn next_generation(&mut self) -> u64 {
        self.last_generation += 1;
        self.last_generation
    }
}

/// Pure update function for a notification slot.
pub fn update_slot(mut slot: Slot, msg: SlotMsg) -> (Slot, Vec<SlotEffect>) {
    let effects = match msg {
        SlotMsg::Notify(notification) => {
            if notification.suppress {
                vec![SlotEffect::Dropped {
                    message: notification.message,
                    reason: DropReason::Suppressed,
                }]
            } else if slot.is_duplicate(&notification.message) {
                vec![SlotEffect::Dropped {
                    message: notification.message,
                    reason: DropReason::Duplicate,
                }]
            } else {
                // A newer request replaces the pending one and restarts the window.
                let generation = slot.next_generation();
                slot.pending = Some(Pending {
                    generation,
                    notification,
                });
                vec![SlotEffect::StartDebounce {
                    generation,
                    delay: slot.settings.debounce,
                }]
            }
        }
        SlotMsg::DebounceElapsed { generation } => {
            match slot.pending.take() {
                Some(pending) if pending.generation == generation => commit(&mut slot, pending),
                other => {
                    slot.pending = other;
                    Vec::new()
                }
            }
        }
        SlotMsg::Expired { generation } => match slot.visible.take() {
            Some(shown) if shown.generation == generation => vec![SlotEffect::Dismissed {
                generation,
                notification: shown.notification,
                reason: DismissReason::Expired,
            }],
            other => {
                slot.visible = other;
                Vec::new()
            }
        },
        SlotMsg::Close => match slot.visible.take() {
            Some(shown) => vec![
                SlotEffect::CancelExpiry,
                SlotEffect::Dismissed {
                    generation: shown.generation,
                    notification: shown.notification,
                    reason: DismissReason::Closed,
                },
            ],
            None => Vec::new(),
        },
        SlotMsg::Clear => {
            let mut effects = Vec::new();
            if slot.pending.take().is_some() {
                effects.push(SlotEffect::CancelDebounce);
            }
            if let Some(shown) = slot.visible.take() {
                effects.push(SlotEffect::CancelExpiry);
                effects.push(SlotEffect::Dismissed {
                    generation: shown.generation,
                    notification: shown.notification,
                    reason: DismissReason::Unmounted,
                });
            }
            effects
        }
    };

    (slot, effects)
}

fn commit(slot: &mut Slot, pending: Pending) -> Vec<SlotEffect> {
    let mut effects = Vec::with_capacity(4);
    if let Some(previous) = slot.visible.take() {
        effects.push(SlotEffect::CancelExpiry);
        effects.push(SlotEffect::Dismissed {
            generation: previous.generation,
            notification: previous.notification,
            reason: DismissReason::Superseded,
        });
    }
    let duration = pending
        .notification
        .duration_or(slot.settings.short_duration, slot.settings.long_duration);
    effects.push(SlotEffect::Show {
        generation: pending.generation,
        notification: pending.notification.clone(),
    });
    effects.push(SlotEffect::ScheduleExpiry {
        generation: pending.generation,
        after: duration,
    });
    slot.visible = Some(Shown {
        generation: pending.generation,
        notification: pending.notification,
        duration,
    });
    effects
}
