use std::sync::Arc;

use indexwatch_core::{JobKey, JobViewModel, Notification};
use tokio::sync::watch;
use watch_logging::{watch_debug, watch_info, watch_warn};

use crate::center::Notifier;
use crate::client::{ClientError, JobClient};
use crate::poller::{PollHandle, StatusPoller, TerminalCallback};

pub const MODIFIED_MESSAGE: &str = "Modified successfully";
pub const NOT_MODIFIED_MESSAGE: &str = "Modified unsuccessfully";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Paused,
    Resumed,
}

/// Pause/resume calls with outcome notifications.
#[derive(Clone)]
pub struct JobControl {
    client: Arc<dyn JobClient>,
    notifier: Notifier,
}

impl JobControl {
    pub fn new(client: Arc<dyn JobClient>, notifier: Notifier) -> Self {
        Self { client, notifier }
    }

    /// Pauses the job if it is currently indexing, resumes it otherwise.
    ///
    /// Exactly one server call is made. Nothing local changes before the
    /// server confirms.
    pub async fn toggle_pause_resume(
        &self,
        job_key: &JobKey,
        currently_indexing: bool,
    ) -> Result<ToggleOutcome, ClientError> {
        let (result, outcome) = if currently_indexing {
            (self.client.pause_job(job_key).await, ToggleOutcome::Paused)
        } else {
            (self.client.resume_job(job_key).await, ToggleOutcome::Resumed)
        };
        match result {
            Ok(()) => {
                watch_info!("job {} {:?}", job_key, outcome);
                self.notifier.notify(Notification::success(MODIFIED_MESSAGE));
                Ok(outcome)
            }
            Err(err) => {
                watch_warn!("could not toggle job {}: {}", job_key, err);
                self.notifier.notify(Notification::error(NOT_MODIFIED_MESSAGE));
                Err(err)
            }
        }
    }
}

/// The per-job owner of a poll session: mounts polling for one job and
/// restarts it when the job is resumed. Dropping the view stops polling.
pub struct JobView {
    job_key: JobKey,
    poller: StatusPoller,
    control: JobControl,
    on_refresh: TerminalCallback,
    handle: PollHandle,
}

impl JobView {
    /// Mounts the view and starts polling on the notifier's runtime.
    pub fn mount(job_key: JobKey, poller: StatusPoller, on_refresh: TerminalCallback) -> Self {
        let control = JobControl::new(poller.client(), poller.notifier().clone());
        let handle = poller.start(job_key.clone(), Arc::clone(&on_refresh));
        Self {
            job_key,
            poller,
            control,
            on_refresh,
            handle,
        }
    }

    pub fn job_key(&self) -> &JobKey {
        &self.job_key
    }

    pub fn view(&self) -> JobViewModel {
        self.handle.view()
    }

    pub fn handle(&self) -> &PollHandle {
        &self.handle
    }

    pub fn handle_mut(&mut self) -> &mut PollHandle {
        &mut self.handle
    }

    /// Receiver of the current session's view. Replaced on resume.
    pub fn subscribe(&self) -> watch::Receiver<JobViewModel> {
        self.handle.subscribe()
    }

    /// Pauses while processing, resumes while paused.
    ///
    /// In any other activity (queued, nothing fetched yet, finished) no call
    /// is made and `InvalidRequest` is returned with the view untouched.
    /// On success the cached status is cleared. A resume starts a fresh poll
    /// session and triggers the refresh callback; a pause lets the running
    /// session observe the paused phase and stop by itself.
    pub async fn toggle_pause_resume(&mut self) -> Result<ToggleOutcome, ClientError> {
        let current = self.handle.view();
        let (can_pause, can_resume) = (current.can_pause(), current.can_resume());
        if !can_pause && !can_resume {
            watch_debug!(
                "ignoring toggle for {} while {:?}",
                self.job_key,
                current.activity
            );
            return Err(ClientError::InvalidRequest(format!(
                "job {} can be neither paused nor resumed",
                self.job_key
            )));
        }
        let outcome = self
            .control
            .toggle_pause_resume(&self.job_key, can_pause)
            .await?;

        self.handle.clear_status();
        if outcome == ToggleOutcome::Resumed {
            // Replacing the handle drops, and so stops, the old session.
            self.handle = self
                .poller
                .start(self.job_key.clone(), Arc::clone(&self.on_refresh));
            (self.on_refresh)();
        }
        Ok(outcome)
    }

    pub fn unmount(self) {
        self.handle.stop();
    }
}
