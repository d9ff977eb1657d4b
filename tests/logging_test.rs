#![cfg(feature = "logging")]

use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use parking_lot::Mutex;
use weir::{
    cancel::TokenEvent,
    channel::{drain, from_values},
    logging::{
        clear_log, initialize_log, LogEntry, LogEvent, LogFilter, LogInterface, LogProcessor,
        MemoryLogger,
    },
    stage,
    structures::Identifier,
    CancellationToken, Halt, StageEvent,
};

/// Runs `body` with a memory logger attached to the current thread.
/// Returns every entry once all stages and watchers exited.
fn record<F: FnOnce()>(filter: LogFilter, body: F) -> Vec<LogEntry> {
    let (snd, rcv) = crossbeam::channel::unbounded();
    let entries = Arc::new(Mutex::new(vec![]));
    let mut logger = MemoryLogger::new(rcv, entries.clone());
    let processor = thread::spawn(move || logger.spawn());

    initialize_log(LogInterface::new(Identifier::new(), snd, Instant::now(), filter));
    body();
    clear_log();

    processor.join().unwrap();
    let recorded = entries.lock().clone();
    recorded
}

fn stage_events(entries: &[LogEntry]) -> Vec<StageEvent> {
    entries
        .iter()
        .filter(|entry| entry.event_type == StageEvent::NAME)
        .map(|entry| bson::from_bson(entry.event_data.clone()).unwrap())
        .collect()
}

#[test]
fn stages_report_start_and_finish() {
    let entries = record(LogFilter::AllowAll, || {
        let token = CancellationToken::new();
        let got = drain(stage::take(&token, from_values([1, 2, 3]), 2));
        assert_eq!(got, Some(vec![1, 2]));
    });
    let events = stage_events(&entries);
    assert!(events.contains(&StageEvent::Started {
        stage: "Take".to_string()
    }));
    assert!(events.contains(&StageEvent::Finished {
        stage: "Take".to_string(),
        halt: Halt::Completed
    }));
}

#[test]
fn every_or_stage_finishes_after_one_leaf() {
    let entries = record(LogFilter::AllowAll, || {
        let inputs: Vec<_> = (0..7).map(|_| CancellationToken::new()).collect();
        let combined = stage::or(&inputs);
        inputs[5].cancel();
        while !combined.is_cancelled() {
            thread::yield_now();
        }
    });
    let events = stage_events(&entries);
    let started = events
        .iter()
        .filter(|event| matches!(event, StageEvent::Started { stage } if stage == "Or"))
        .count();
    let finished = events
        .iter()
        .filter(|event| matches!(event, StageEvent::Finished { stage, .. } if stage == "Or"))
        .count();
    assert_eq!(started, 3);
    assert_eq!(finished, started);
}

#[test]
fn cancellations_are_logged() {
    let entries = record(LogFilter::AllowAll, || {
        let root = CancellationToken::new();
        let _child = CancellationToken::with_parent(&root);
        root.cancel();
        root.cancel();
    });
    let cancelled = token_events(&entries);
    // Root and child, each exactly once.
    assert_eq!(cancelled.len(), 2);
}

fn token_events(entries: &[LogEntry]) -> Vec<TokenEvent> {
    entries
        .iter()
        .filter(|entry| entry.event_type == TokenEvent::NAME)
        .map(|entry| bson::from_bson(entry.event_data.clone()).unwrap())
        .collect()
}

#[test]
fn expired_timeouts_are_logged() {
    let mut timed_id = None;
    let entries = record(LogFilter::AllowAll, || {
        let root = CancellationToken::new();
        let timed = CancellationToken::with_timeout(&root, Duration::from_millis(10));
        timed_id = Some(timed.id().id);
        while !timed.is_cancelled() {
            thread::yield_now();
        }
    });
    let cancelled = token_events(&entries);
    assert_eq!(
        cancelled,
        vec![TokenEvent::Cancelled {
            token: timed_id.unwrap()
        }]
    );
}

#[test]
fn closed_signals_are_logged() {
    let entries = record(LogFilter::AllowAll, || {
        let (signal, rcv) = crossbeam::channel::bounded::<()>(0);
        let token = CancellationToken::from_signal(Some(rcv));
        drop(signal);
        while !token.is_cancelled() {
            thread::yield_now();
        }
    });
    assert_eq!(token_events(&entries).len(), 1);
}

#[test]
fn filter_drops_unselected_events() {
    let filter = LogFilter::Some([TokenEvent::NAME.to_string()].into());
    filter.check().unwrap();
    let entries = record(filter, || {
        let token = CancellationToken::new();
        drain(stage::enumerate(from_values(["a"])));
        token.cancel();
    });
    assert!(!entries.is_empty());
    assert!(entries.iter().all(|entry| entry.event_type == TokenEvent::NAME));
}
