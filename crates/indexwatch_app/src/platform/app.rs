use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Local;
use indexwatch_core::{JobKey, Notification};
use indexwatch_engine::{
    EventBus, HttpJobClient, JobControl, JobView, NotificationCenter, RuleSummaryCache,
    StandaloneToast, StatusPoller, TerminalCallback, ToggleOutcome,
};
use tokio::task::JoinHandle;
use watch_logging::{watch_info, watch_warn};

use crate::cli::{Cli, Command, JobArgs};
use crate::config::{WatchConfig, TOKEN_ENV};
use crate::render;

/// Extra time after a debounce window for the last notification to land.
const SETTLE_MARGIN: Duration = Duration::from_millis(50);

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = WatchConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?
        .with_token_override(std::env::var(TOKEN_ENV).ok());

    match cli.command {
        Command::Watch(job) => watch(&config, job_key(job)).await,
        Command::Pause(job) => toggle(&config, job_key(job), true).await,
        Command::Resume(job) => toggle(&config, job_key(job), false).await,
        Command::Rules { document } => rules(&config, &document).await,
        Command::Config => {
            println!("{}", config.to_display_ron()?);
            Ok(())
        }
    }
}

fn job_key(args: JobArgs) -> JobKey {
    JobKey::new(args.dataset, args.document)
}

struct Services {
    bus: EventBus,
    client: Arc<HttpJobClient>,
    center: NotificationCenter,
    printer: NotificationPrinter,
    settle: Duration,
}

impl Services {
    fn new(config: &WatchConfig) -> anyhow::Result<Self> {
        let bus = EventBus::new();
        let client = HttpJobClient::new(config.client_settings()?)
            .context("building http client")?
            .with_error_bus(bus.clone());
        let slot_settings = config.slot_settings();
        let settle = slot_settings.debounce + SETTLE_MARGIN;
        let center = NotificationCenter::mount(slot_settings)?;
        center.attach_error_channel(&bus);
        let printer = NotificationPrinter::spawn(&center);
        Ok(Self {
            bus,
            client: Arc::new(client),
            center,
            printer,
            settle,
        })
    }

    /// Gives a notification still inside its debounce window time to show,
    /// then unmounts the center.
    async fn shutdown(self) {
        tokio::time::sleep(self.settle).await;
        self.center.unmount();
        drop(self.printer);
    }
}

/// Prints each notification the center shows, once.
struct NotificationPrinter {
    task: JoinHandle<()>,
}

impl NotificationPrinter {
    fn spawn(center: &NotificationCenter) -> Self {
        let mut shown_rx = center.subscribe();
        let task = tokio::spawn(async move {
            let mut last_generation = None;
            while shown_rx.changed().await.is_ok() {
                let shown = shown_rx.borrow_and_update().clone();
                if let Some(shown) = shown {
                    if last_generation != Some(shown.generation) {
                        last_generation = Some(shown.generation);
                        println!("{}", render::notification_line(&shown, &Local::now()));
                    }
                }
            }
        });
        Self { task }
    }
}

impl Drop for NotificationPrinter {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn watch(config: &WatchConfig, job_key: JobKey) -> anyhow::Result<()> {
    let services = Services::new(config)?;
    let poller = StatusPoller::new(
        services.client.clone(),
        services.bus.clone(),
        services.center.notifier(),
        config.poll_settings(),
    );
    let finished_key = job_key.clone();
    let on_terminal: TerminalCallback = Arc::new(move || {
        watch_info!("job {} reached a terminal phase", finished_key);
    });

    let view = JobView::mount(job_key.clone(), poller, on_terminal);
    let mut progress = view.subscribe();
    let mut last_line = String::new();
    println!("watching {job_key}");

    loop {
        tokio::select! {
            changed = progress.changed() => {
                if changed.is_err() {
                    break;
                }
                let model = progress.borrow_and_update().clone();
                let line = render::progress_line(&model);
                if line != last_line {
                    println!("{line}");
                    last_line = line;
                }
                if view.handle().session().is_terminal() {
                    break;
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("listening for ctrl-c")?;
                watch_info!("interrupted; publishing logout");
                services.bus.publish_logout();
                let toast = StandaloneToast::show(
                    Notification::info(format!("stopped watching {job_key}")),
                    None,
                )?;
                if let Some(shown) = toast.current() {
                    println!("{}", render::notification_line(&shown, &Local::now()));
                }
                break;
            }
        }
    }

    let session = view.handle().session();
    view.unmount();
    services.shutdown().await;
    watch_info!("watch of {} ended in {:?}", job_key, session.state());
    Ok(())
}

async fn toggle(config: &WatchConfig, job_key: JobKey, pause: bool) -> anyhow::Result<()> {
    let services = Services::new(config)?;
    let control = JobControl::new(services.client.clone(), services.center.notifier());
    let result = control.toggle_pause_resume(&job_key, pause).await;
    services.shutdown().await;

    let outcome = result.with_context(|| format!("could not update job {job_key}"))?;
    let label = match outcome {
        ToggleOutcome::Paused => "paused",
        ToggleOutcome::Resumed => "resumed",
    };
    println!("{job_key}: {label}");
    Ok(())
}

async fn rules(config: &WatchConfig, document_id: &str) -> anyhow::Result<()> {
    let services = Services::new(config)?;
    let cache = RuleSummaryCache::new(services.client.clone());
    let result = cache.get(document_id).await;
    services.shutdown().await;

    match result {
        Ok(summary) => {
            for line in render::rule_summary_lines(document_id, &summary) {
                println!("{line}");
            }
            Ok(())
        }
        Err(err) => {
            watch_warn!("rule summary for {} unavailable: {}", document_id, err);
            Err(err).with_context(|| format!("fetching rules for document {document_id}"))
        }
    }
}
