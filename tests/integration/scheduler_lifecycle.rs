//! Daily update scheduling driven by a paused tokio clock.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};
use nexus::scheduler::{EnableOutcome, JobPhase, RecurringJobScheduler};
use nexus::update::{UpdateJob, UpdateTrigger};
use nexus::{EventLoop, UiEvent, ui_channel};
use tokio::runtime::Handle;

use crate::helpers::{FakeUpdater, RecordingNotifier, TestClock};

fn local(year: i32, month: u32, day: u32) -> DateTime<Local> {
    Local
        .with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .unwrap()
}

struct Harness {
    scheduler: RecurringJobScheduler,
    updater: Arc<FakeUpdater>,
    notifier: Arc<RecordingNotifier>,
    event_loop: EventLoop<Vec<UiEvent>>,
}

fn harness(updater: FakeUpdater) -> Harness {
    let updater = Arc::new(updater);
    let notifier = Arc::new(RecordingNotifier::default());
    let (poster, event_loop) = ui_channel::<Vec<UiEvent>>();
    let job = UpdateJob::new(updater.clone(), notifier.clone(), poster);
    let scheduler = RecurringJobScheduler::new(Arc::new(job), Handle::current())
        .with_clock(Arc::new(TestClock::at(2026, 6, 15, 23, 59)));
    Harness {
        scheduler,
        updater,
        notifier,
        event_loop,
    }
}

#[tokio::test(start_paused = true)]
async fn fires_at_midnight_and_rearms_a_day_later() {
    let h = harness(FakeUpdater::ok());
    assert_eq!(h.scheduler.enable(), EnableOutcome::Armed(local(2026, 6, 16)));

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(h.updater.runs(), 0);

    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(h.updater.runs(), 1);
    assert_eq!(h.scheduler.phase(), JobPhase::Armed);
    assert_eq!(h.scheduler.next_fire_at(), Some(local(2026, 6, 17)));

    tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
    assert_eq!(h.updater.runs(), 2);
    assert_eq!(h.scheduler.fire_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn enabling_twice_keeps_one_timer() {
    let h = harness(FakeUpdater::ok());
    let first = h.scheduler.enable();
    let second = h.scheduler.enable();
    assert_eq!(second, EnableOutcome::AlreadyEnabled(first.next_fire_at()));

    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(h.updater.runs(), 1);
}

#[tokio::test(start_paused = true)]
async fn disabling_a_never_enabled_scheduler_is_a_no_op() {
    let h = harness(FakeUpdater::ok());
    assert!(!h.scheduler.disable());
    assert_eq!(h.scheduler.phase(), JobPhase::Disabled);
    assert_eq!(h.scheduler.next_fire_at(), None);
}

#[tokio::test(start_paused = true)]
async fn disabling_before_midnight_prevents_the_run() {
    let h = harness(FakeUpdater::ok());
    h.scheduler.enable();
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(h.scheduler.disable());

    tokio::time::sleep(Duration::from_secs(2 * 24 * 60 * 60)).await;
    assert_eq!(h.updater.runs(), 0);
    assert!(h.notifier.titles().is_empty());
}

#[tokio::test(start_paused = true)]
async fn failed_update_notifies_and_stays_armed() {
    let mut h = harness(FakeUpdater::failing("dpkg lock held"));
    h.scheduler.enable();

    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(h.updater.runs(), 1);
    assert_eq!(h.notifier.titles(), vec!["System Update", "Update Failed"]);
    assert!(h.scheduler.is_enabled());
    assert_eq!(h.scheduler.next_fire_at(), Some(local(2026, 6, 17)));

    let mut events = Vec::new();
    h.event_loop.run_pending(&mut events);
    assert_eq!(
        events[0],
        UiEvent::UpdateStarted {
            trigger: UpdateTrigger::Scheduled
        }
    );
    assert!(matches!(
        &events[1],
        UiEvent::UpdateFinished { trigger: UpdateTrigger::Scheduled, outcome }
            if !outcome.is_success()
    ));
}

#[tokio::test(start_paused = true)]
async fn rearm_hook_sees_each_new_fire_time() {
    let updater = Arc::new(FakeUpdater::ok());
    let notifier = Arc::new(RecordingNotifier::default());
    let (poster, _event_loop) = ui_channel::<Vec<UiEvent>>();
    let rearmed = Arc::new(Mutex::new(Vec::new()));
    let sink = rearmed.clone();
    let scheduler = RecurringJobScheduler::new(
        Arc::new(UpdateJob::new(updater, notifier, poster)),
        Handle::current(),
    )
    .with_clock(Arc::new(TestClock::at(2026, 6, 15, 23, 59)))
    .with_rearm_hook(Arc::new(move |at: DateTime<Local>| {
        sink.lock().unwrap().push(at);
    }));

    scheduler.enable();
    tokio::time::sleep(Duration::from_secs(61 + 24 * 60 * 60)).await;
    assert_eq!(
        *rearmed.lock().unwrap(),
        vec![local(2026, 6, 17), local(2026, 6, 18)]
    );
}
