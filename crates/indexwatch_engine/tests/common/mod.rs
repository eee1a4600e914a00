#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use indexwatch_core::{JobKey, JobStatus, RuleSummary};
use indexwatch_engine::{CenterEvent, ClientError, JobClient, TerminalCallback};
use tokio::sync::broadcast;
use tokio::time::Instant;

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(watch_logging::initialize_for_tests);
}

pub fn key() -> JobKey {
    JobKey::new("ds-1", "doc-1")
}

/// Replays scripted status results; the last one repeats once the script
/// runs out.
#[derive(Default)]
pub struct ScriptedClient {
    statuses: Mutex<VecDeque<Result<JobStatus, ClientError>>>,
    last: Mutex<Option<Result<JobStatus, ClientError>>>,
    fetches: Mutex<Vec<Instant>>,
    pause_result: Mutex<Option<ClientError>>,
    resume_result: Mutex<Option<ClientError>>,
    pub pause_calls: AtomicUsize,
    pub resume_calls: AtomicUsize,
    pub rule_calls: AtomicUsize,
    rule_failures: AtomicUsize,
}

impl ScriptedClient {
    pub fn new(script: Vec<Result<JobStatus, ClientError>>) -> Arc<Self> {
        Arc::new(Self {
            statuses: Mutex::new(script.into()),
            ..Self::default()
        })
    }

    pub fn push(&self, result: Result<JobStatus, ClientError>) {
        self.statuses.lock().unwrap().push_back(result);
    }

    pub fn fail_pause(&self, err: ClientError) {
        *self.pause_result.lock().unwrap() = Some(err);
    }

    pub fn fail_resume(&self, err: ClientError) {
        *self.resume_result.lock().unwrap() = Some(err);
    }

    /// The next `count` rule summary fetches fail.
    pub fn fail_rules(&self, count: usize) {
        self.rule_failures.store(count, Ordering::SeqCst);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().unwrap().len()
    }

    pub fn fetch_times(&self) -> Vec<Instant> {
        self.fetches.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl JobClient for ScriptedClient {
    async fn fetch_job_status(&self, _job_key: &JobKey) -> Result<JobStatus, ClientError> {
        self.fetches.lock().unwrap().push(Instant::now());
        let next = self.statuses.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        match next {
            Some(result) => {
                *last = Some(result.clone());
                result
            }
            None => last
                .clone()
                .unwrap_or_else(|| Err(ClientError::Transport("empty script".into()))),
        }
    }

    async fn pause_job(&self, _job_key: &JobKey) -> Result<(), ClientError> {
        self.pause_calls.fetch_add(1, Ordering::SeqCst);
        match self.pause_result.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn resume_job(&self, _job_key: &JobKey) -> Result<(), ClientError> {
        self.resume_calls.fetch_add(1, Ordering::SeqCst);
        match self.resume_result.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn fetch_rule_summary(&self, _document_id: &str) -> Result<RuleSummary, ClientError> {
        self.rule_calls.fetch_add(1, Ordering::SeqCst);
        let failures = self.rule_failures.load(Ordering::SeqCst);
        if failures > 0 {
            self.rule_failures.store(failures - 1, Ordering::SeqCst);
            return Err(ClientError::Transport("rules unavailable".into()));
        }
        Ok(RuleSummary {
            max_tokens: Some(500),
            enabled_rules: vec!["remove_extra_spaces".into()],
            ..RuleSummary::default()
        })
    }
}

/// A terminal callback that counts its invocations.
pub fn counting_callback() -> (TerminalCallback, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let callback: TerminalCallback = Arc::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    (callback, calls)
}

/// Drains every event received so far.
pub fn drain(events: &mut broadcast::Receiver<CenterEvent>) -> Vec<CenterEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

/// Messages of the notifications shown, in order.
pub fn shown_messages(events: &[CenterEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            CenterEvent::Shown { notification, .. } => Some(notification.message.clone()),
            _ => None,
        })
        .collect()
}
