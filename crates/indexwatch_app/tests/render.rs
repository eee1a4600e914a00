use std::time::Duration;

use chrono::{TimeZone, Utc};
use clap::Parser;
use indexwatch_app::cli::{Cli, Command, LogTarget};
use indexwatch_app::render::{notification_line, progress_line, rule_summary_lines};
use indexwatch_core::{
    Activity, JobKey, JobViewModel, Notification, ParentMode, Phase, RuleSummary,
    SegmentationMode, Shown,
};
use pretty_assertions::assert_eq;

fn model(
    activity: Activity,
    phase: Option<Phase>,
    done: u64,
    total: u64,
    percent: u8,
) -> JobViewModel {
    JobViewModel {
        job_key: JobKey::new("ds-1", "doc-1"),
        activity,
        phase,
        percent,
        completed_units: Some(done),
        total_units: Some(total),
        error: None,
        polling: true,
    }
}

#[test]
fn progress_line_shows_bar_phase_and_counts() {
    let line = progress_line(&model(Activity::Processing, Some(Phase::Splitting), 3, 10, 30));
    assert_eq!(
        line,
        "ds-1/doc-1 [######..............] processing (splitting) 3/10 · 30%"
    );
}

#[test]
fn progress_line_for_unknown_and_failed_jobs() {
    let mut unknown = model(Activity::Unknown, None, 0, 0, 0);
    unknown.completed_units = None;
    unknown.total_units = None;
    assert_eq!(
        progress_line(&unknown),
        "ds-1/doc-1 [....................] waiting for status --/-- · 0%"
    );

    let mut failed = model(Activity::Error, Some(Phase::Error), 4, 10, 40);
    failed.error = Some("embedding quota exceeded".into());
    assert!(progress_line(&failed).ends_with("error 4/10 · 40% - embedding quota exceeded"));
}

#[test]
fn notification_line_carries_time_and_kind() {
    let shown = Shown {
        generation: 1,
        notification: Notification::error("Polling cancelled due to session logout"),
        duration: Duration::from_millis(5000),
    };
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 5).unwrap();
    assert_eq!(
        notification_line(&shown, &at),
        "09:30:05 ERROR Polling cancelled due to session logout"
    );
}

#[test]
fn hierarchical_rules_list_parent_and_child_settings() {
    let summary = RuleSummary {
        mode: Some(SegmentationMode::Hierarchical),
        max_tokens: Some(1024),
        child_max_tokens: Some(256),
        parent_mode: Some(ParentMode::Paragraph),
        enabled_rules: vec!["remove_extra_spaces".into(), "remove_urls_emails".into()],
    };
    assert_eq!(
        rule_summary_lines("doc-1", &summary),
        vec![
            "document doc-1".to_string(),
            "  segmentation: hierarchical".to_string(),
            "  max tokens: 1024".to_string(),
            "  parent chunks: paragraph".to_string(),
            "  child max tokens: 256".to_string(),
            "  text preprocessing: remove_extra_spaces, remove_urls_emails".to_string(),
        ]
    );
}

#[test]
fn general_rules_skip_hierarchy_lines() {
    let lines = rule_summary_lines("doc-2", &RuleSummary::default());
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[3], "  text preprocessing: none");
}

#[test]
fn cli_parses_job_commands() {
    let cli =
        Cli::try_parse_from(["indexwatch", "--log", "both", "watch", "ds-1", "doc-1"]).unwrap();
    assert_eq!(cli.log, LogTarget::Both);
    match cli.command {
        Command::Watch(job) => {
            assert_eq!(job.dataset, "ds-1");
            assert_eq!(job.document, "doc-1");
        }
        other => panic!("unexpected command {other:?}"),
    }

    let cli = Cli::try_parse_from(["indexwatch", "rules", "doc-9"]).unwrap();
    assert!(matches!(cli.command, Command::Rules { document } if document == "doc-9"));
    assert!(Cli::try_parse_from(["indexwatch", "pause", "ds-1"]).is_err());
}
