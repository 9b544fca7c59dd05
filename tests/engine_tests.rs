//! End-to-end engine scenarios driven through the public API.

use statecraft::{
    transition_table, Engine, Event, EventKind, Response, Rule, StateBuilder, StateId,
    TransitionTable,
};
use statecraft::Clock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const S1: StateId = StateId(1);
const S2: StateId = StateId(2);
const S3: StateId = StateId(3);
const EVENT_1: EventKind = EventKind(1);
const EVENT_2: EventKind = EventKind(2);
const EVENT_3: EventKind = EventKind(3);

/// Route engine diagnostics through the test harness; honors `RUST_LOG`.
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Test clock advanced by hand.
#[derive(Clone)]
struct TestClock(Arc<AtomicU64>);

impl TestClock {
    fn new() -> Self {
        Self(Arc::new(AtomicU64::new(0)))
    }

    fn advance_ms(&self, ms: u64) {
        self.0.fetch_add(ms * 1000, Ordering::Relaxed);
    }
}

impl Clock for TestClock {
    fn now_micros(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

fn three_state_engine() -> Engine {
    // S1 --EVENT_1(arg 1)--> S2; any state --EVENT_3(arg 2)--> push S3;
    // S3 --EVENT_2(arg 2)--> pop.
    let shared_table = transition_table! {
        EVENT_1, 1, S1 => Response::Switch(S2);
        EVENT_3, 2, _  => Response::Push(S3);
        EVENT_2, 2, S3 => Response::Pop;
    };

    Engine::builder()
        .state(
            StateBuilder::new(S1, "s1")
                .table(shared_table.clone())
                .build()
                .unwrap(),
        )
        .state(
            StateBuilder::new(S2, "s2")
                .table(shared_table.clone())
                .build()
                .unwrap(),
        )
        .state(
            StateBuilder::new(S3, "s3")
                .table(shared_table)
                .build()
                .unwrap(),
        )
        .build()
        .unwrap()
}

#[test]
fn switch_push_pop_scenario() {
    init_logging();
    let mut engine = three_state_engine();
    engine.begin_at(S1).unwrap();
    assert_eq!(engine.active_id(), S1);

    // Simple switch rule: S1 -> S2 on EVENT_1 with argument 1.
    engine.send_event(Event::new(EVENT_1, 1)).unwrap();
    engine.update().unwrap();
    assert_eq!(engine.active_id(), S2);

    // Push to S3; S2 is saved on the stack.
    engine.send_event(Event::new(EVENT_3, 2)).unwrap();
    engine.update().unwrap();
    assert_eq!(engine.active_id(), S3);
    assert_eq!(engine.stack_depth(), 1);

    // Pop back to S2; the stack empties.
    engine.send_event(Event::new(EVENT_2, 2)).unwrap();
    engine.update().unwrap();
    assert_eq!(engine.active_id(), S2);
    assert_eq!(engine.stack_depth(), 0);

    engine.end();
}

#[test]
fn queue_holds_exactly_its_capacity() {
    init_logging();
    let engine = Engine::builder().queue_capacity(10).build().unwrap();
    for i in 0..10 {
        engine.send_event(Event::new(EVENT_1, i)).unwrap();
    }
    assert!(engine.send_event(Event::new(EVENT_1, 10)).is_err());
    assert_eq!(engine.queued_events(), 10);
}

#[test]
fn engine_hook_wins_over_the_active_table() {
    // S1's table would switch to S2 on EVENT_1/arg 1; the hook claims the
    // same event first.
    init_logging();
    let hook_hits = Arc::new(AtomicU64::new(0));
    let hits = Arc::clone(&hook_hits);
    let mut engine = Engine::builder()
        .state(
            StateBuilder::new(S1, "s1")
                .table(TransitionTable::new().rule(Rule::on(EVENT_1).arg(1).switch_to(S2)))
                .build()
                .unwrap(),
        )
        .state(StateBuilder::new(S2, "s2").build().unwrap())
        .on_event(move |_active, event| {
            if event.kind == EVENT_1 {
                hits.fetch_add(1, Ordering::Relaxed);
                Response::Handled
            } else {
                Response::Unhandled
            }
        })
        .build()
        .unwrap();

    engine.begin_at(S1).unwrap();
    engine.send_event(Event::new(EVENT_1, 1)).unwrap();
    engine.update().unwrap();

    assert_eq!(engine.active_id(), S1, "hook consumed the event");
    assert_eq!(hook_hits.load(Ordering::Relaxed), 1);
}

#[test]
fn wildcard_rules_ignore_the_argument() {
    init_logging();
    let mut engine = Engine::builder()
        .state(
            StateBuilder::new(S1, "s1")
                .table(TransitionTable::new().rule(Rule::on(EVENT_1).switch_to(S2)))
                .build()
                .unwrap(),
        )
        .state(StateBuilder::new(S2, "s2").build().unwrap())
        .build()
        .unwrap();

    engine.begin_at(S1).unwrap();
    engine.send_event(Event::new(EVENT_1, 0xDEAD)).unwrap();
    engine.update().unwrap();
    assert_eq!(engine.active_id(), S2);
}

#[test]
fn events_from_other_threads_dispatch_in_send_order() {
    init_logging();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let journal = Arc::clone(&seen);
    let mut engine = Engine::builder()
        .state(StateBuilder::new(S1, "s1").build().unwrap())
        .on_event(move |_active, event| {
            journal.lock().unwrap().push(event.arg);
            Response::Handled
        })
        .build()
        .unwrap();
    engine.begin_at(S1).unwrap();

    let sender = engine.sender();
    let producer = std::thread::spawn(move || {
        for i in 0..5 {
            sender.send(Event::new(EVENT_2, i)).unwrap();
        }
    });
    producer.join().unwrap();

    engine.update().unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3, 4]);
}

#[test]
fn stop_from_a_sender_ends_a_running_engine() {
    init_logging();
    let mut engine = Engine::builder()
        .state(StateBuilder::new(S1, "s1").build().unwrap())
        .build()
        .unwrap();
    engine.begin_at(S1).unwrap();

    let sender = engine.sender();
    let engine_thread = std::thread::spawn(move || {
        engine.run(Duration::from_millis(500)).unwrap();
        engine
    });

    std::thread::sleep(Duration::from_millis(30));
    sender.stop();
    let engine = engine_thread.join().unwrap();
    assert_eq!(engine.active_id(), S1);
}

#[test]
fn delayed_events_respect_variable_tick_lengths() {
    init_logging();
    let clock = TestClock::new();
    let mut engine = Engine::builder()
        .state(
            StateBuilder::new(S1, "s1")
                .table(TransitionTable::new().rule(Rule::on(EVENT_1).switch_to(S2)))
                .build()
                .unwrap(),
        )
        .state(StateBuilder::new(S2, "s2").build().unwrap())
        .clock(clock.clone())
        .build()
        .unwrap();

    engine.begin_at(S1).unwrap();
    engine
        .send_delayed_event(Event::signal(EVENT_1), 100)
        .unwrap();

    // Uneven update intervals summing to just under the delay.
    for step in [30u64, 50, 19] {
        clock.advance_ms(step);
        engine.update().unwrap();
        assert_eq!(engine.active_id(), S1);
    }

    // The tick that crosses the threshold dispatches it.
    clock.advance_ms(1);
    engine.update().unwrap();
    assert_eq!(engine.active_id(), S2);
}

#[test]
fn earlier_deferred_events_do_not_block_later_immediate_ones() {
    init_logging();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let journal = Arc::clone(&seen);
    let clock = TestClock::new();
    let mut engine = Engine::builder()
        .state(StateBuilder::new(S1, "s1").build().unwrap())
        .on_event(move |_active, event| {
            journal.lock().unwrap().push(event.kind);
            Response::Handled
        })
        .clock(clock.clone())
        .build()
        .unwrap();
    engine.begin_at(S1).unwrap();

    engine
        .send_delayed_event(Event::signal(EVENT_1), 100)
        .unwrap();
    engine.send_event(Event::signal(EVENT_2)).unwrap();

    clock.advance_ms(1);
    engine.update().unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![EVENT_2]);

    clock.advance_ms(100);
    engine.update().unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![EVENT_2, EVENT_1]);
}

#[test]
fn state_context_can_chain_events() {
    // Entering S2 immediately requests EVENT_2, which switches to S3 on the
    // following tick.
    init_logging();
    let mut engine = Engine::builder()
        .state(
            StateBuilder::new(S1, "s1")
                .table(TransitionTable::new().rule(Rule::on(EVENT_1).switch_to(S2)))
                .build()
                .unwrap(),
        )
        .state(
            StateBuilder::new(S2, "s2")
                .on_enter(|ctx, _event| {
                    ctx.send_event(Event::signal(EVENT_2)).unwrap();
                })
                .table(TransitionTable::new().rule(Rule::on(EVENT_2).switch_to(S3)))
                .build()
                .unwrap(),
        )
        .state(StateBuilder::new(S3, "s3").build().unwrap())
        .build()
        .unwrap();

    engine.begin_at(S1).unwrap();
    engine.send_event(Event::signal(EVENT_1)).unwrap();
    engine.update().unwrap();
    assert_eq!(engine.active_id(), S2);
    engine.update().unwrap();
    assert_eq!(engine.active_id(), S3);
}

#[test]
fn timeout_event_reaches_the_transition_table() {
    init_logging();
    let clock = TestClock::new();
    let mut engine = Engine::builder()
        .state(
            StateBuilder::new(S1, "s1")
                .table(
                    TransitionTable::new().rule(Rule::on(EventKind::TIMEOUT).switch_to(S2)),
                )
                .build()
                .unwrap(),
        )
        .state(StateBuilder::new(S2, "s2").build().unwrap())
        .clock(clock.clone())
        .build()
        .unwrap();

    engine.begin_at(S1).unwrap();
    clock.advance_ms(25);
    assert!(engine.timeout(Duration::from_millis(20), true));
    engine.update().unwrap();
    assert_eq!(engine.active_id(), S2);
}

#[test]
fn failed_pop_restores_the_saved_identity() {
    // Arrange a pop whose saved identity equals the active identity: the
    // switch is then a no-op failure and the saved id must return to the
    // stack.
    init_logging();
    let mut engine = three_state_engine();
    engine.begin_at(S1).unwrap();

    // Push S3 from S1; stack holds S1.
    engine.send_event(Event::new(EVENT_3, 2)).unwrap();
    engine.update().unwrap();
    assert_eq!(engine.active_id(), S3);
    assert_eq!(engine.stack_depth(), 1);

    engine.set_event_hook(|_active, event| match event.kind {
        EVENT_1 => Response::Switch(S1),
        EVENT_2 => Response::Pop,
        _ => Response::Unhandled,
    });

    // Force the active state back to S1 without touching the stack.
    engine.send_event(Event::signal(EVENT_1)).unwrap();
    engine.update().unwrap();
    assert_eq!(engine.active_id(), S1);

    engine.send_event(Event::signal(EVENT_2)).unwrap();
    engine.update().unwrap();
    // Pop failed: still in S1 and the saved identity is back on the stack.
    assert_eq!(engine.active_id(), S1);
    assert_eq!(engine.stack_depth(), 1);
}

#[test]
fn nested_pushes_unwind_in_reverse_order() {
    init_logging();
    let mut engine = Engine::builder()
        .state(StateBuilder::new(S1, "s1").build().unwrap())
        .state(StateBuilder::new(S2, "s2").build().unwrap())
        .state(StateBuilder::new(S3, "s3").build().unwrap())
        .build()
        .unwrap();
    engine.set_event_hook(|_active, event| match event.kind {
        EVENT_1 => Response::Push(StateId(event.arg as u8)),
        EVENT_2 => Response::Pop,
        _ => Response::Unhandled,
    });
    engine.begin_at(S1).unwrap();

    engine.send_event(Event::new(EVENT_1, 2)).unwrap();
    engine.update().unwrap();
    engine.send_event(Event::new(EVENT_1, 3)).unwrap();
    engine.update().unwrap();
    assert_eq!(engine.active_id(), S3);
    assert_eq!(engine.stack_depth(), 2);

    engine.send_event(Event::signal(EVENT_2)).unwrap();
    engine.update().unwrap();
    assert_eq!(engine.active_id(), S2);

    engine.send_event(Event::signal(EVENT_2)).unwrap();
    engine.update().unwrap();
    assert_eq!(engine.active_id(), S1);
    assert_eq!(engine.stack_depth(), 0);
}
