//! Plain-text rendering of view models for the terminal.

use chrono::{DateTime, TimeZone};
use indexwatch_core::{
    Activity, JobViewModel, NotificationKind, ParentMode, RuleSummary, SegmentationMode, Shown,
};

const BAR_WIDTH: usize = 20;

pub fn progress_line(view: &JobViewModel) -> String {
    let activity = match view.activity {
        Activity::Unknown => "waiting for status",
        Activity::Queued => "queued",
        Activity::Processing => "processing",
        Activity::Completed => "completed",
        Activity::Paused => "paused",
        Activity::Error => "error",
    };
    let phase = match view.phase {
        Some(phase) if view.activity == Activity::Processing => format!(" ({phase})"),
        _ => String::new(),
    };
    let mut line = format!(
        "{} [{}] {}{} {}",
        view.job_key,
        progress_bar(view.percent),
        activity,
        phase,
        view.segments_label()
    );
    if let Some(error) = &view.error {
        line.push_str(&format!(" - {error}"));
    }
    line
}

fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) * BAR_WIDTH / 100;
    format!("{}{}", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

pub fn notification_line<Tz>(shown: &Shown, at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let label = match shown.notification.kind {
        NotificationKind::Success => "OK",
        NotificationKind::Info => "INFO",
        NotificationKind::Warning => "WARN",
        NotificationKind::Error => "ERROR",
    };
    format!(
        "{} {:<5} {}",
        at.format("%H:%M:%S"),
        label,
        shown.notification.message
    )
}

pub fn rule_summary_lines(document_id: &str, summary: &RuleSummary) -> Vec<String> {
    let mode = match summary.mode {
        Some(SegmentationMode::General) => "general",
        Some(SegmentationMode::Hierarchical) => "hierarchical",
        None => "--",
    };
    let tokens = |value: Option<u32>| value.map_or_else(|| "--".to_string(), |v| v.to_string());

    let mut lines = vec![
        format!("document {document_id}"),
        format!("  segmentation: {mode}"),
        format!("  max tokens: {}", tokens(summary.max_tokens)),
    ];
    if summary.mode == Some(SegmentationMode::Hierarchical) {
        let parent = match summary.parent_mode {
            Some(ParentMode::Paragraph) => "paragraph",
            Some(ParentMode::FullDoc) => "full document",
            None => "--",
        };
        lines.push(format!("  parent chunks: {parent}"));
        lines.push(format!(
            "  child max tokens: {}",
            tokens(summary.child_max_tokens)
        ));
    }
    let rules = if summary.enabled_rules.is_empty() {
        "none".to_string()
    } else {
        summary.enabled_rules.join(", ")
    };
    lines.push(format!("  text preprocessing: {rules}"));
    lines
}
