//! Posting from worker threads around UI shutdown.

use std::thread;
use std::time::{Duration, Instant};

use nexus::ui_channel;

const THREADS: usize = 4;
const POSTS_PER_THREAD: usize = 250;

#[test]
fn posts_keep_per_thread_order() {
    let (poster, event_loop) = ui_channel::<Vec<(usize, usize)>>();

    let workers: Vec<_> = (0..THREADS)
        .map(|t| {
            let poster = poster.clone();
            thread::spawn(move || {
                for i in 0..POSTS_PER_THREAD {
                    poster.post(move |seen: &mut Vec<(usize, usize)>| seen.push((t, i)));
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }
    poster.request_shutdown();

    let mut seen = Vec::new();
    event_loop.run(&mut seen);

    assert_eq!(seen.len(), THREADS * POSTS_PER_THREAD);
    for t in 0..THREADS {
        let order: Vec<usize> = seen.iter().filter(|(s, _)| *s == t).map(|(_, i)| *i).collect();
        assert_eq!(order, (0..POSTS_PER_THREAD).collect::<Vec<_>>());
    }
}

#[test]
fn posts_after_shutdown_are_dropped() {
    let (poster, event_loop) = ui_channel::<Vec<&'static str>>();
    poster.post(|seen: &mut Vec<&'static str>| seen.push("before"));
    poster.request_shutdown();
    poster.post(|seen: &mut Vec<&'static str>| seen.push("after"));

    let mut seen = Vec::new();
    event_loop.run(&mut seen);
    assert_eq!(seen, vec!["before"]);
}

#[test]
fn posting_to_a_gone_event_loop_neither_blocks_nor_panics() {
    let (poster, event_loop) = ui_channel::<Vec<usize>>();
    poster.request_shutdown();
    event_loop.run(&mut Vec::new());
    assert!(poster.is_closed());

    let started = Instant::now();
    let workers: Vec<_> = (0..THREADS)
        .map(|_| {
            let poster = poster.clone();
            thread::spawn(move || {
                for i in 0..10_000 {
                    poster.post(move |seen: &mut Vec<usize>| seen.push(i));
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("posting thread panicked");
    }
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn dropping_the_event_loop_closes_posters() {
    let (poster, event_loop) = ui_channel::<()>();
    assert!(!poster.is_closed());
    drop(event_loop);
    assert!(poster.is_closed());
    poster.post(|_: &mut ()| unreachable!("event loop is gone"));
}

#[test]
fn a_panicking_callback_does_not_stop_the_loop() {
    let (poster, event_loop) = ui_channel::<Vec<u8>>();
    poster.post(|_: &mut Vec<u8>| panic!("boom"));
    poster.post(|seen: &mut Vec<u8>| seen.push(1));
    poster.request_shutdown();

    let mut seen = Vec::new();
    event_loop.run(&mut seen);
    assert_eq!(seen, vec![1]);
}
