use std::time::Duration;

use crate::{
    FetchFailure, Notification, PollEffect, PollMsg, PollSession, PollState, TerminalReason,
};

/// Shown once when the server rejects the session mid-poll.
pub const LOGOUT_MESSAGE: &str = "Polling cancelled due to session logout";
const LOGOUT_DURATION: Duration = Duration::from_millis(5000);

/// Pure update function: applies a message to a poll session and returns the
/// effects the driver must perform.
pub fn update(mut session: PollSession, msg: PollMsg) -> (PollSession, Vec<PollEffect>) {
    let effects = match msg {
        PollMsg::Start => {
            if session.state() == PollState::Idle && !session.is_cancelled() {
                begin_cycle(&mut session)
            } else {
                Vec::new()
            }
        }
        PollMsg::CycleDue => {
            if session.is_cancelled() || session.is_terminal() || session.is_in_flight() {
                Vec::new()
            } else {
                begin_cycle(&mut session)
            }
        }
        PollMsg::FetchSucceeded(status) => {
            session.finish_fetch();
            if session.is_cancelled() {
                // Stopped while the request was out: keep the data, schedule nothing.
                session.record_status(status);
                return (session, Vec::new());
            }
            let phase = status.phase;
            session.record_status(status);
            if phase.is_terminal() {
                session.terminate(TerminalReason::Finished(phase));
                vec![PollEffect::InvokeTerminal]
            } else {
                vec![PollEffect::ScheduleCycle(session.policy().interval)]
            }
        }
        PollMsg::FetchFailed(failure) => {
            session.finish_fetch();
            if session.is_cancelled() {
                return (session, Vec::new());
            }
            match failure {
                FetchFailure::Unauthorized => {
                    session.terminate(TerminalReason::Unauthorized);
                    vec![
                        PollEffect::CancelScheduled,
                        PollEffect::Notify(
                            Notification::error(LOGOUT_MESSAGE)
                                .with_duration(LOGOUT_DURATION)
                                .closable(true),
                        ),
                    ]
                }
                FetchFailure::Transient => {
                    let failures = session.record_failure();
                    if session.policy().is_exhausted(failures) {
                        session.terminate(TerminalReason::RetriesExhausted);
                        vec![
                            PollEffect::CancelScheduled,
                            PollEffect::Notify(Notification::warning(format!(
                                "Status polling stopped after {failures} failed attempts"
                            ))),
                        ]
                    } else {
                        vec![PollEffect::ScheduleCycle(
                            session.policy().delay_after(failures),
                        )]
                    }
                }
            }
        }
        PollMsg::Cancel => {
            if session.is_cancelled() {
                Vec::new()
            } else {
                session.terminate(TerminalReason::Cancelled);
                vec![PollEffect::CancelScheduled]
            }
        }
        PollMsg::ClearStatus => {
            session.clear_status();
            Vec::new()
        }
    };

    (session, effects)
}

fn begin_cycle(session: &mut PollSession) -> Vec<PollEffect> {
    session.begin_fetch();
    vec![PollEffect::Fetch(session.job_key().clone())]
}
