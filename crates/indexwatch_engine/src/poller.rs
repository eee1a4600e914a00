//! Drives [`PollSession`] state machines on tokio.
//!
//! Each started session gets a driver task and a logout watcher. Both share
//! one [`CancellationToken`]; cancelling it (while holding the session lock)
//! is the single teardown step: it marks the session cancelled, drops the
//! pending wait and ends the logout subscription.

use std::sync::{Arc, Mutex};

use indexwatch_core::{
    update, FetchFailure, JobKey, JobStatus, JobViewModel, PollEffect, PollMsg, PollSession,
    RetryPolicy,
};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use watch_logging::{watch_debug, watch_info, watch_trace, watch_warn};

use crate::bus::{EventBus, SessionEvent};
use crate::center::Notifier;
use crate::client::JobClient;
use crate::timer::lock;

/// Invoked when a session observes a terminal phase (and by the control
/// facade after a resume) so the caller can refresh the enclosing document.
pub type TerminalCallback = Arc<dyn Fn() + Send + Sync + 'static>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollSettings {
    pub retry: RetryPolicy,
}

struct SessionShared {
    session: Mutex<PollSession>,
    token: CancellationToken,
    view_tx: watch::Sender<JobViewModel>,
}

impl SessionShared {
    fn apply(&self, msg: PollMsg) -> Vec<PollEffect> {
        let mut session = lock(&self.session);
        self.apply_locked(&mut session, msg)
    }

    fn apply_locked(&self, session: &mut PollSession, msg: PollMsg) -> Vec<PollEffect> {
        let (next, effects) = update(session.clone(), msg);
        *session = next;
        self.view_tx.send_replace(session.view());
        effects
    }

    /// Marks the session cancelled and cancels the token in one step.
    fn cancel(&self) {
        let mut session = lock(&self.session);
        self.apply_locked(&mut session, PollMsg::Cancel);
        self.token.cancel();
    }
}

/// Starts poll sessions against one client.
#[derive(Clone)]
pub struct StatusPoller {
    client: Arc<dyn JobClient>,
    bus: EventBus,
    notifier: Notifier,
    settings: PollSettings,
}

impl StatusPoller {
    pub fn new(
        client: Arc<dyn JobClient>,
        bus: EventBus,
        notifier: Notifier,
        settings: PollSettings,
    ) -> Self {
        Self {
            client,
            bus,
            notifier,
            settings,
        }
    }

    pub fn client(&self) -> Arc<dyn JobClient> {
        Arc::clone(&self.client)
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Begins polling `job_key`. The session's tasks run on the runtime the
    /// notifier's center was mounted on, so any thread may call this.
    pub fn start(&self, job_key: JobKey, on_terminal: TerminalCallback) -> PollHandle {
        let session = PollSession::with_policy(job_key, self.settings.retry.clone());
        let (view_tx, _) = watch::channel(session.view());
        let shared = Arc::new(SessionShared {
            session: Mutex::new(session),
            token: CancellationToken::new(),
            view_tx,
        });

        // Subscribe before spawning so a logout right after start is seen.
        let logout_rx = self.bus.subscribe_session();
        let runtime = self.notifier.runtime();
        runtime.spawn(watch_logout(Arc::clone(&shared), logout_rx));
        let task = runtime.spawn(drive(
            Arc::clone(&shared),
            Arc::clone(&self.client),
            self.notifier.clone(),
            on_terminal,
        ));

        PollHandle {
            shared,
            task: Some(task),
        }
    }
}

/// Owner's handle onto one running session. Dropping it stops the session.
pub struct PollHandle {
    shared: Arc<SessionShared>,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    /// Stops polling. A fetch already in flight completes but nothing is
    /// scheduled after it. Idempotent.
    pub fn stop(&self) {
        self.shared.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        lock(&self.shared.session).is_cancelled()
    }

    pub fn session(&self) -> PollSession {
        lock(&self.shared.session).clone()
    }

    pub fn latest_status(&self) -> Option<JobStatus> {
        lock(&self.shared.session).latest_status().cloned()
    }

    pub fn view(&self) -> JobViewModel {
        self.shared.view_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<JobViewModel> {
        self.shared.view_tx.subscribe()
    }

    /// Forgets the cached status; the display shows unknown progress until
    /// the next successful fetch.
    pub fn clear_status(&self) {
        self.shared.apply(PollMsg::ClearStatus);
    }

    /// Waits until the driver task has exited.
    pub async fn finished(&mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.shared.cancel();
    }
}

async fn watch_logout(
    shared: Arc<SessionShared>,
    mut logout_rx: broadcast::Receiver<SessionEvent>,
) {
    loop {
        tokio::select! {
            biased;
            _ = shared.token.cancelled() => break,
            event = logout_rx.recv() => match event {
                Ok(SessionEvent::LoggedOut) | Err(broadcast::error::RecvError::Lagged(_)) => {
                    watch_info!("logout observed; stopping status polling");
                    shared.cancel();
                    break;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    // No more logout signals can arrive; keep running until cancelled.
                    shared.token.cancelled().await;
                    break;
                }
            },
        }
    }
}

async fn drive(
    shared: Arc<SessionShared>,
    client: Arc<dyn JobClient>,
    notifier: Notifier,
    on_terminal: TerminalCallback,
) {
    // Whatever ends the loop also ends the logout subscription.
    let _teardown = shared.token.clone().drop_guard();
    let mut effects = shared.apply(PollMsg::Start);

    loop {
        let mut fetch = None;
        let mut wait = None;
        for effect in effects.drain(..) {
            match effect {
                PollEffect::Fetch(job_key) => fetch = Some(job_key),
                PollEffect::ScheduleCycle(delay) => wait = Some(delay),
                // The wait below races the token, so there is nothing to clear here.
                PollEffect::CancelScheduled => {}
                PollEffect::InvokeTerminal => {
                    watch_info!("indexing job reached a terminal phase");
                    on_terminal();
                }
                PollEffect::Notify(notification) => notifier.notify(notification),
            }
        }

        if let Some(job_key) = fetch {
            let msg = match client.fetch_job_status(&job_key).await {
                Ok(status) => {
                    watch_debug!(
                        "job {} is {} ({}%)",
                        job_key,
                        status.phase,
                        status.progress_percent()
                    );
                    PollMsg::FetchSucceeded(status)
                }
                Err(err) if err.is_unauthorized() => {
                    watch_warn!("status fetch for {} unauthorized; giving up", job_key);
                    PollMsg::FetchFailed(FetchFailure::Unauthorized)
                }
                Err(err) => {
                    watch_warn!("status fetch for {} failed: {}", job_key, err);
                    PollMsg::FetchFailed(FetchFailure::Transient)
                }
            };
            effects = shared.apply(msg);
            continue;
        }

        let Some(delay) = wait else {
            break;
        };
        tokio::select! {
            biased;
            _ = shared.token.cancelled() => break,
            _ = tokio::time::sleep(delay) => {
                watch_trace!("poll cycle due after {:?}", delay);
                effects = shared.apply(PollMsg::CycleDue);
            }
        }
    }
}
