mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::{drain, init_logging, shown_messages};
use indexwatch_core::{DismissReason, DropReason, Notification, SlotSettings};
use indexwatch_engine::{ApiErrorEvent, CenterEvent, EventBus, NotificationCenter, NotifyError};
use pretty_assertions::assert_eq;
use tokio::time::sleep;

fn close_counter() -> (Box<dyn FnOnce() + Send>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    (
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
        calls,
    )
}

#[tokio::test(start_paused = true)]
async fn identical_requests_show_once() {
    init_logging();
    let center = NotificationCenter::mount(SlotSettings::default()).unwrap();
    let mut events = center.subscribe_events();
    let notifier = center.notifier();

    notifier.notify(Notification::error("quota exceeded"));
    notifier.notify(Notification::error("quota exceeded"));
    sleep(Duration::from_millis(100)).await;
    notifier.notify(Notification::error("quota exceeded"));
    sleep(Duration::from_millis(400)).await;

    let drained = drain(&mut events);
    assert_eq!(shown_messages(&drained), vec!["quota exceeded".to_string()]);
    let duplicates = drained
        .iter()
        .filter(|event| {
            matches!(
                event,
                CenterEvent::Dropped {
                    reason: DropReason::Duplicate,
                    ..
                }
            )
        })
        .count();
    assert_eq!(duplicates, 2);

    // Still visible: repeats of the shown message stay dropped.
    notifier.notify(Notification::error("quota exceeded"));
    sleep(Duration::from_millis(400)).await;
    assert!(shown_messages(&drain(&mut events)).is_empty());
}

#[tokio::test(start_paused = true)]
async fn suppressed_request_never_becomes_visible() {
    init_logging();
    let center = NotificationCenter::mount(SlotSettings::default()).unwrap();
    let mut events = center.subscribe_events();

    center
        .notifier()
        .notify(Notification::error("handled elsewhere").suppressed(true));
    sleep(Duration::from_secs(1)).await;

    assert_eq!(center.current(), None);
    assert_eq!(
        drain(&mut events),
        vec![CenterEvent::Dropped {
            message: "handled elsewhere".into(),
            reason: DropReason::Suppressed,
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn shows_after_debounce_and_expires_by_kind() {
    init_logging();
    let center = NotificationCenter::mount(SlotSettings::default()).unwrap();
    let notifier = center.notifier();

    notifier.notify(Notification::success("saved"));
    sleep(Duration::from_millis(299)).await;
    assert_eq!(center.current(), None);

    sleep(Duration::from_millis(2)).await;
    let shown = center.current().expect("visible after the window");
    assert_eq!(shown.notification.message, "saved");
    assert_eq!(shown.duration, Duration::from_millis(3000));

    sleep(Duration::from_millis(2990)).await;
    assert!(center.current().is_some());
    sleep(Duration::from_millis(20)).await;
    assert_eq!(center.current(), None);

    notifier.notify(Notification::warning("slow down"));
    sleep(Duration::from_millis(301)).await;
    assert_eq!(
        center.current().map(|shown| shown.duration),
        Some(Duration::from_millis(6000))
    );
}

#[tokio::test(start_paused = true)]
async fn rapid_distinct_requests_coalesce_to_the_last() {
    init_logging();
    let center = NotificationCenter::mount(SlotSettings::default()).unwrap();
    let mut events = center.subscribe_events();
    let notifier = center.notifier();

    notifier.notify(Notification::info("one"));
    sleep(Duration::from_millis(100)).await;
    notifier.notify(Notification::info("two"));
    sleep(Duration::from_millis(100)).await;
    notifier.notify(Notification::info("three"));
    sleep(Duration::from_millis(500)).await;

    assert_eq!(shown_messages(&drain(&mut events)), vec!["three".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn superseded_expiry_does_not_dismiss_the_replacement() {
    init_logging();
    let center = NotificationCenter::mount(SlotSettings::default()).unwrap();
    let mut events = center.subscribe_events();
    let notifier = center.notifier();

    notifier.notify(Notification::success("first"));
    sleep(Duration::from_millis(2500)).await;
    notifier.notify(Notification::success("second"));
    sleep(Duration::from_millis(301)).await;

    // The first one's expiry was due at 3300ms; the second must outlive it.
    sleep(Duration::from_millis(1000)).await;
    let shown = center.current().expect("second still visible");
    assert_eq!(shown.notification.message, "second");

    let reasons: Vec<_> = drain(&mut events)
        .into_iter()
        .filter_map(|event| match event {
            CenterEvent::Dismissed {
                notification,
                reason,
                ..
            } => Some((notification.message, reason)),
            _ => None,
        })
        .collect();
    assert_eq!(
        reasons,
        vec![("first".to_string(), DismissReason::Superseded)]
    );

    sleep(Duration::from_secs(3)).await;
    assert_eq!(center.current(), None);
}

#[tokio::test(start_paused = true)]
async fn close_runs_the_callback_exactly_once() {
    init_logging();
    let center = NotificationCenter::mount(SlotSettings::default()).unwrap();
    let notifier = center.notifier();
    let (on_close, calls) = close_counter();

    notifier.notify_with_close(Notification::error("disk full"), on_close);
    sleep(Duration::from_millis(301)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    notifier.close();
    notifier.close();
    assert_eq!(center.current(), None);
    sleep(Duration::from_secs(10)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn callback_of_a_coalesced_request_never_runs() {
    init_logging();
    let center = NotificationCenter::mount(SlotSettings::default()).unwrap();
    let notifier = center.notifier();
    let (dropped_close, dropped_calls) = close_counter();
    let (kept_close, kept_calls) = close_counter();

    notifier.notify_with_close(Notification::info("stale"), dropped_close);
    notifier.notify_with_close(Notification::info("fresh"), kept_close);
    sleep(Duration::from_secs(5)).await;

    assert_eq!(dropped_calls.load(Ordering::SeqCst), 0);
    assert_eq!(kept_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn error_channel_attaches_once_and_honours_suppression() {
    init_logging();
    let bus = EventBus::new();
    let center = NotificationCenter::mount(SlotSettings::default()).unwrap();
    let mut events = center.subscribe_events();

    center.attach_error_channel(&bus);
    center.attach_error_channel(&bus);
    assert_eq!(bus.api_error_subscribers(), 1);

    bus.publish_api_error(ApiErrorEvent {
        message: "status poll failed".into(),
        suppress_global_toast: true,
    });
    sleep(Duration::from_millis(400)).await;
    assert_eq!(center.current(), None);

    bus.publish_api_error(ApiErrorEvent {
        message: "rules unavailable".into(),
        suppress_global_toast: false,
    });
    sleep(Duration::from_millis(400)).await;
    assert_eq!(
        shown_messages(&drain(&mut events)),
        vec!["rules unavailable".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn unmount_dismisses_and_stops_everything() {
    init_logging();
    let bus = EventBus::new();
    let center = NotificationCenter::mount(SlotSettings::default()).unwrap();
    center.attach_error_channel(&bus);
    let notifier = center.notifier();
    let (on_close, calls) = close_counter();

    notifier.notify_with_close(Notification::info("bye"), on_close);
    sleep(Duration::from_millis(301)).await;
    notifier.notify(Notification::info("pending at unmount"));

    center.unmount();
    assert!(!center.is_mounted());
    assert_eq!(center.current(), None);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    sleep(Duration::from_secs(1)).await;
    assert_eq!(center.current(), None);
    assert_eq!(bus.api_error_subscribers(), 0);

    notifier.notify(Notification::info("after unmount"));
    sleep(Duration::from_secs(1)).await;
    assert_eq!(notifier.current(), None);
}

#[test]
fn mounting_needs_a_runtime() {
    assert!(matches!(
        NotificationCenter::mount(SlotSettings::default()),
        Err(NotifyError::NoRuntime)
    ));
}
