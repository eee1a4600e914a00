use indexwatch_core::{JobStatus, Phase, UnknownPhase};

#[test]
fn zero_total_means_zero_percent() {
    assert_eq!(JobStatus::new(Phase::Indexing, 0, 0).progress_percent(), 0);
    assert_eq!(JobStatus::new(Phase::Indexing, 7, 0).progress_percent(), 0);
}

#[test]
fn percent_rounds_half_up() {
    assert_eq!(JobStatus::new(Phase::Indexing, 3, 10).progress_percent(), 30);
    assert_eq!(JobStatus::new(Phase::Indexing, 1, 3).progress_percent(), 33);
    assert_eq!(JobStatus::new(Phase::Indexing, 2, 3).progress_percent(), 67);
    assert_eq!(JobStatus::new(Phase::Indexing, 1, 8).progress_percent(), 13);
    assert_eq!(JobStatus::new(Phase::Indexing, 1, 200).progress_percent(), 1);
}

#[test]
fn malformed_counts_clamp_to_hundred() {
    assert_eq!(JobStatus::new(Phase::Indexing, 11, 10).progress_percent(), 100);
    assert_eq!(
        JobStatus::new(Phase::Indexing, u64::MAX, 1).progress_percent(),
        100
    );
}

#[test]
fn terminal_and_active_phases() {
    let terminal: Vec<_> = [
        Phase::Queued,
        Phase::Parsing,
        Phase::Cleaning,
        Phase::Splitting,
        Phase::Indexing,
        Phase::Completed,
        Phase::Paused,
        Phase::Error,
    ]
    .into_iter()
    .filter(|phase| phase.is_terminal())
    .collect();
    assert_eq!(terminal, vec![Phase::Completed, Phase::Paused, Phase::Error]);

    assert!(Phase::Splitting.is_active());
    assert!(!Phase::Queued.is_active());
    assert!(!Phase::Queued.is_terminal());
}

#[test]
fn phases_parse_from_server_names() {
    assert_eq!("indexing".parse::<Phase>(), Ok(Phase::Indexing));
    assert_eq!("waiting".parse::<Phase>(), Ok(Phase::Queued));
    assert_eq!(" Completed ".parse::<Phase>(), Ok(Phase::Completed));
    assert_eq!(
        "archived".parse::<Phase>(),
        Err(UnknownPhase("archived".to_string()))
    );
}
