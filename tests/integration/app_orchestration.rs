//! The orchestrator wired to fake collaborators.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use nexus::assistant::{QueryPayload, local::UrlOpener};
use nexus::clipboard::Clipboard;
use nexus::update::UpdateTrigger;
use nexus::{Collaborators, EventLoop, Nexus, NexusConfig, UiEvent, ui_channel};
use tokio::runtime::Handle;

use crate::helpers::{
    FakeAi, FakeClipboard, FakeUpdater, FixedSampler, RecordingNotifier, RecordingSleeper,
    TestClock, collect_until,
};

struct App {
    nexus: Nexus<Vec<UiEvent>>,
    event_loop: EventLoop<Vec<UiEvent>>,
    clipboard: Arc<FakeClipboard>,
    updater: Arc<FakeUpdater>,
    notifier: Arc<RecordingNotifier>,
    sampler: Arc<FixedSampler>,
}

fn config(watch_clipboard: bool, auto_update: bool) -> NexusConfig {
    let mut config = NexusConfig::default();
    config.clipboard.enabled = watch_clipboard;
    config.clipboard.poll_interval_ms = 100;
    config.auto_update.enabled_at_start = auto_update;
    config.monitor.enabled = false;
    config
}

fn app(config: NexusConfig, clipboard: FakeClipboard, updater: FakeUpdater) -> App {
    let clipboard = Arc::new(clipboard);
    let updater = Arc::new(updater);
    let notifier = Arc::new(RecordingNotifier::default());
    let sampler = Arc::new(FixedSampler::new(63.0));
    let (poster, event_loop) = ui_channel::<Vec<UiEvent>>();
    let collaborators = Collaborators {
        updater: updater.clone(),
        ai: Arc::new(FakeAi::answering("42")),
        notifier: notifier.clone(),
        clipboard: clipboard.clone(),
        memory: sampler.clone(),
    };
    let nexus = Nexus::new(config, collaborators, poster, Handle::current())
        .with_clock(Arc::new(TestClock::at(2026, 3, 2, 12, 0)))
        .with_sleeper(Arc::new(RecordingSleeper::default()));
    App {
        nexus,
        event_loop,
        clipboard,
        updater,
        notifier,
        sampler,
    }
}

#[tokio::test(start_paused = true)]
async fn start_arms_update_and_watches_clipboard() {
    let mut a = app(
        config(true, true),
        FakeClipboard::new(&[Some("copied")]),
        FakeUpdater::ok(),
    );
    a.nexus.start();
    assert!(a.nexus.auto_update_enabled());
    assert_eq!(a.notifier.titles(), vec!["Auto Update Enabled"]);

    let mut events = Vec::new();
    collect_until(&mut a.event_loop, &mut events, Duration::from_secs(5), |e| {
        e.contains(&UiEvent::ClipboardHistoryChanged(vec!["copied".into()]))
    })
    .await;
    assert!(matches!(
        events[0],
        UiEvent::AutoUpdateChanged { enabled: true, next_fire_at: Some(_) }
    ));
    a.nexus.shutdown();
}

#[tokio::test(start_paused = true)]
async fn start_honors_disabled_components() {
    let mut a = app(
        config(false, false),
        FakeClipboard::new(&[Some("ignored")]),
        FakeUpdater::ok(),
    );
    a.nexus.start();
    assert!(!a.nexus.auto_update_enabled());
    assert!(!a.nexus.clear_clipboard_history());

    tokio::time::sleep(Duration::from_secs(2)).await;
    let mut events = Vec::new();
    a.event_loop.run_pending(&mut events);
    assert!(events.is_empty());
    assert!(a.notifier.titles().is_empty());
}

#[tokio::test(start_paused = true)]
async fn history_edits_reach_the_running_watcher() {
    let mut a = app(
        config(true, false),
        FakeClipboard::new(&[Some("a"), Some("b")]),
        FakeUpdater::ok(),
    );
    a.nexus.start();

    let mut events = Vec::new();
    let both = vec!["a".to_owned(), "b".to_owned()];
    collect_until(&mut a.event_loop, &mut events, Duration::from_secs(5), |e| {
        e.last() == Some(&UiEvent::ClipboardHistoryChanged(both.clone()))
    })
    .await;

    assert!(a.nexus.set_history_capacity(1));
    collect_until(&mut a.event_loop, &mut events, Duration::from_secs(5), |e| {
        e.last() == Some(&UiEvent::ClipboardHistoryChanged(vec!["b".into()]))
    })
    .await;

    assert!(a.nexus.clear_clipboard_history());
    collect_until(&mut a.event_loop, &mut events, Duration::from_secs(5), |e| {
        e.last() == Some(&UiEvent::ClipboardHistoryChanged(Vec::new()))
    })
    .await;

    a.clipboard.set_text("c").unwrap();
    collect_until(&mut a.event_loop, &mut events, Duration::from_secs(5), |e| {
        e.last() == Some(&UiEvent::ClipboardHistoryChanged(vec!["c".into()]))
    })
    .await;

    a.nexus.shutdown();
    assert!(!a.nexus.clear_clipboard_history());
}

#[tokio::test]
async fn copy_then_paste_round_trips_through_the_clipboard() {
    let mut a = app(config(false, false), FakeClipboard::new(&[]), FakeUpdater::ok());

    a.nexus.copy_to_clipboard("snippet".into());
    let mut events = Vec::new();
    collect_until(&mut a.event_loop, &mut events, Duration::from_secs(5), |e| {
        !e.is_empty()
    })
    .await;
    assert_eq!(events, vec![UiEvent::Notice("Copied to clipboard".into())]);
    assert_eq!(a.clipboard.current().as_deref(), Some("snippet"));

    a.nexus.paste_clipped_data();
    collect_until(&mut a.event_loop, &mut events, Duration::from_secs(5), |e| {
        e.len() == 2
    })
    .await;
    assert_eq!(events[1], UiEvent::PasteText("snippet".into()));
}

#[tokio::test]
async fn paste_from_empty_clipboard_posts_a_notice() {
    let mut a = app(config(false, false), FakeClipboard::new(&[]), FakeUpdater::ok());
    a.nexus.paste_clipped_data();

    let mut events = Vec::new();
    collect_until(&mut a.event_loop, &mut events, Duration::from_secs(5), |e| {
        !e.is_empty()
    })
    .await;
    assert_eq!(events, vec![UiEvent::Notice("Clipboard is empty".into())]);
}

#[tokio::test]
async fn manual_update_failure_is_reported() {
    let mut a = app(
        config(false, false),
        FakeClipboard::new(&[]),
        FakeUpdater::failing("no network"),
    );
    a.nexus.update_now();

    let mut events = Vec::new();
    collect_until(&mut a.event_loop, &mut events, Duration::from_secs(5), |e| {
        e.iter().any(|e| matches!(e, UiEvent::UpdateFinished { .. }))
    })
    .await;
    assert!(matches!(
        &events[1],
        UiEvent::UpdateFinished { trigger: UpdateTrigger::Manual, outcome }
            if !outcome.is_success()
    ));
    assert_eq!(a.updater.runs(), 1);
    assert_eq!(a.notifier.titles(), vec!["System Update", "Update Failed"]);
}

#[tokio::test(start_paused = true)]
async fn delayed_update_announces_then_runs() {
    let mut a = app(config(false, false), FakeClipboard::new(&[]), FakeUpdater::ok());
    a.nexus.update_after(Duration::from_secs(5));

    let mut events = Vec::new();
    collect_until(&mut a.event_loop, &mut events, Duration::from_secs(30), |e| {
        e.iter().any(|e| matches!(e, UiEvent::UpdateFinished { .. }))
    })
    .await;
    assert_eq!(
        events[0],
        UiEvent::Notice("System update will start in 5 seconds".into())
    );
    assert_eq!(
        events[1],
        UiEvent::UpdateStarted {
            trigger: UpdateTrigger::Delayed
        }
    );
    assert_eq!(a.updater.runs(), 1);
}

#[tokio::test]
async fn search_command_opens_a_browser_instead_of_asking_the_ai() {
    let opened = Arc::new(Mutex::new(Vec::new()));
    let sink = opened.clone();
    let opener: UrlOpener = Arc::new(move |url: &str| {
        sink.lock().unwrap().push(url.to_owned());
        Ok(())
    });
    let a = app(config(false, false), FakeClipboard::new(&[]), FakeUpdater::ok());
    let mut event_loop = a.event_loop;
    let nexus = a.nexus.with_url_opener(opener);

    let id = nexus.submit("search rust").unwrap();
    let mut events = Vec::new();
    collect_until(&mut event_loop, &mut events, Duration::from_secs(5), |e| {
        e.iter().any(|e| matches!(e, UiEvent::BusyCleared { .. }))
    })
    .await;

    let result = events
        .iter()
        .find_map(|e| match e {
            UiEvent::QueryFinished(r) if r.request_id == id => Some(r),
            _ => None,
        })
        .unwrap();
    assert_eq!(
        result.payload,
        QueryPayload::Success("Searching Google for: rust".into())
    );
    assert_eq!(opened.lock().unwrap().len(), 1);
    assert!(opened.lock().unwrap()[0].contains("q=rust"));
}

#[tokio::test(start_paused = true)]
async fn ram_monitor_posts_every_interval_and_stops_with_the_app() {
    let mut cfg = config(false, false);
    cfg.monitor.enabled = true;
    cfg.monitor.poll_interval_secs = 5;
    let mut a = app(cfg, FakeClipboard::new(&[]), FakeUpdater::ok());
    a.nexus.start();

    let started = tokio::time::Instant::now();
    let mut events = Vec::new();
    collect_until(&mut a.event_loop, &mut events, Duration::from_secs(60), |e| {
        e.len() == 3
    })
    .await;
    assert!(events.iter().all(|e| *e == UiEvent::RamUsage(63.0)));
    assert!(started.elapsed() >= Duration::from_secs(10));

    a.nexus.shutdown();
    tokio::task::yield_now().await;
    let reads = a.sampler.reads();
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(a.sampler.reads(), reads);
    let mut later = Vec::new();
    a.event_loop.run_pending(&mut later);
    assert!(later.is_empty());
}

#[tokio::test]
async fn clean_turns_clipboard_text_into_a_transcript_line() {
    let mut a = app(
        config(false, false),
        FakeClipboard::new(&[Some("  messy text \n")]),
        FakeUpdater::ok(),
    );
    a.nexus.clean_clipped_data();

    let mut events = Vec::new();
    collect_until(&mut a.event_loop, &mut events, Duration::from_secs(5), |e| {
        !e.is_empty()
    })
    .await;
    assert_eq!(
        events,
        vec![UiEvent::CleanedText("Cleaned Text: messy text".into())]
    );
}

#[tokio::test]
async fn manual_update_with_panicking_updater_still_finishes() {
    struct PanickingUpdater;

    #[async_trait::async_trait]
    impl nexus::update::Updater for PanickingUpdater {
        async fn run_update(&self) -> nexus::Result<nexus::update::UpdateReport> {
            panic!("package manager crashed");
        }
    }

    let notifier = Arc::new(RecordingNotifier::default());
    let (poster, mut event_loop) = ui_channel::<Vec<UiEvent>>();
    let collaborators = Collaborators {
        updater: Arc::new(PanickingUpdater),
        ai: Arc::new(FakeAi::answering("42")),
        notifier: notifier.clone(),
        clipboard: Arc::new(FakeClipboard::new(&[])),
        memory: Arc::new(FixedSampler::new(0.0)),
    };
    let nexus = Nexus::new(config(false, false), collaborators, poster, Handle::current());
    nexus.update_now();

    let mut events = Vec::new();
    collect_until(&mut event_loop, &mut events, Duration::from_secs(5), |e| {
        e.iter().any(|e| matches!(e, UiEvent::UpdateFinished { .. }))
    })
    .await;
    assert!(matches!(
        &events[1],
        UiEvent::UpdateFinished { trigger: UpdateTrigger::Manual, outcome }
            if !outcome.is_success()
    ));
    assert_eq!(notifier.titles(), vec!["System Update", "Update Failed"]);
}
