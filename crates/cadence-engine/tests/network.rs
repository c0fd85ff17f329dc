//! End-to-end scheduling behaviour of explicit and implicit networks.

use std::cell::RefCell;
use std::rc::Rc;

use cadence_core::When;
use cadence_engine::{
    magic, network_operation, Clock, Network, NetworkOperation, RunError, Schedule, Unit,
};
use cadence_test_utils::{
    assert_time, fresh_registry, Counter, FailAfter, Preparer, Recorder, SharedLog, Stopper,
};

const MS: f64 = 1e-3;

#[test]
fn empty_network_runs() {
    fresh_registry();
    let mut net = Network::new();
    net.run(1.0).unwrap();
    assert_time(net.t(), 1.0);
}

#[test]
fn single_object() {
    fresh_registry();
    let x = Unit::new(Counter::new(), Schedule::default());
    let mut net = Network::from_members(&x);
    net.run(1.0 * MS).unwrap();
    assert_eq!(x.borrow().count, 10);
}

#[test]
fn two_objects_added_as_nested_group() {
    fresh_registry();
    let x = Unit::new(Counter::new(), Schedule::default().order(5));
    let y = Unit::new(Counter::new(), Schedule::default().order(6));
    let mut net = Network::new();
    net.add((&x, [&y]));
    let objects = net.objects();
    assert_eq!(objects.len(), 2);
    assert_eq!(objects[0].order(), 5);
    assert_eq!(objects[1].order(), 6);
    net.run(1.0 * MS).unwrap();
    assert_eq!(x.borrow().count, 10);
    assert_eq!(y.borrow().count, 10);
}

#[test]
fn different_clocks_interleave() {
    fresh_registry();
    let log = SharedLog::new();
    let clock1 = Clock::shared(1.0 * MS, 0).unwrap();
    let clock3 = Clock::shared(3.0 * MS, 1).unwrap();
    let x = Unit::new(Recorder::new("x", &log), Schedule::default().on(&clock1));
    let y = Unit::new(Recorder::new("y", &log), Schedule::default().on(&clock3));
    let mut net = Network::from_members((&x, &y));
    net.run(10.0 * MS).unwrap();
    assert_eq!(log.contents(), "xyxxxyxxxyxxxy");
}

#[test]
fn different_phases_alternate() {
    fresh_registry();
    let log = SharedLog::new();
    // Insert the late unit first so only the phase can order them.
    let y = Unit::new(Recorder::new("y", &log), Schedule::default().when(When::End));
    let x = Unit::new(Recorder::new("x", &log), Schedule::default().when(When::Start));
    let mut net = Network::from_members((&y, &x));
    net.run(0.3 * MS).unwrap();
    assert_eq!(log.contents(), "xyxyxy");
}

#[test]
fn prepare_runs_on_run_and_reinit_on_request() {
    fresh_registry();
    let x = Unit::new(Preparer::new(), Schedule::default());
    let mut net = Network::from_members(&x);
    assert!(!x.borrow().did_prepare);
    assert!(!x.borrow().did_reinit);
    net.run(1.0 * MS).unwrap();
    assert!(x.borrow().did_prepare);
    assert!(!x.borrow().did_reinit);
    net.reinit().unwrap();
    assert!(x.borrow().did_reinit);
}

#[test]
fn implicit_run_collects_every_live_unit() {
    fresh_registry();
    let x = Unit::new(Counter::new(), Schedule::default());
    let y = Unit::new(Counter::new(), Schedule::default());
    magic::run(10.0 * MS).unwrap();
    assert_eq!(x.borrow().count, 100);
    assert_eq!(y.borrow().count, 100);
}

#[test]
fn stop_through_handle_and_globally() {
    fresh_registry();
    let mut net = Network::new();
    let handle = net.stop_handle();
    let x = Unit::new(Stopper::new(10, move || handle.stop()), Schedule::default());
    net.add(&x);
    let report = net.run(10.0 * MS).unwrap();
    assert!(report.stopped);
    assert_time(magic::default_clock().t(), 1.0 * MS);
    assert_time(net.t(), 1.0 * MS);

    drop(net);
    magic::default_clock().reset();

    let x = Unit::new(Stopper::new(10, magic::stop), Schedule::default());
    let mut net = Network::from_members(&x);
    net.run(10.0 * MS).unwrap();
    assert_time(magic::default_clock().t(), 1.0 * MS);
}

#[test]
fn stale_global_stop_does_not_leak_into_next_run() {
    fresh_registry();
    magic::stop();
    let x = Unit::new(Counter::new(), Schedule::default());
    let mut net = Network::from_members(&x);
    let report = net.run(1.0 * MS).unwrap();
    assert!(!report.stopped);
    assert_eq!(x.borrow().count, 10);
}

#[test]
fn network_operations_follow_their_phase() {
    fresh_registry();
    let seq = Rc::new(RefCell::new(String::new()));
    let push = |tag: char| {
        let seq = Rc::clone(&seq);
        move || seq.borrow_mut().push(tag)
    };
    let _a = Unit::new(
        NetworkOperation::infallible(push('a')),
        Schedule::default().when(When::Start),
    );
    let b = push('b');
    let _b = network_operation(Schedule::default(), move |_| {
        b();
        Ok(())
    });
    let c = push('c');
    let _c = network_operation(Schedule::default().when(When::End).order(1), move |_| {
        c();
        Ok(())
    });
    magic::run(1.0 * MS).unwrap();
    assert_eq!(seq.borrow().as_str(), "abc".repeat(10));
}

#[test]
fn inactive_units_are_skipped() {
    fresh_registry();
    let x = Unit::new(Counter::new(), Schedule::default());
    let y = Unit::new(Counter::new(), Schedule::default());
    y.set_active(false);
    magic::run(1.0 * MS).unwrap();
    assert_eq!(x.borrow().count, 10);
    assert_eq!(y.borrow().count, 0);
}

#[test]
fn network_time_tracks_requested_end() {
    fresh_registry();
    let c1 = Clock::shared(1.0 * MS, 0).unwrap();
    let c2 = Clock::shared(2.0 * MS, 0).unwrap();
    let x = Unit::new(Counter::new(), Schedule::default().on(&c1));
    let y = Unit::new(Counter::new(), Schedule::default().on(&c2));
    let mut net = Network::from_members((&x, &y));

    // (duration, c1.t, c2.t, net.t, x.count, y.count)
    let steps = [
        (4.0, 4.0, 4.0, 4.0, 4, 2),
        (1.0, 5.0, 6.0, 5.0, 5, 3),
        // Only x is due.
        (0.5, 6.0, 6.0, 5.5, 6, 3),
        // Nothing is due.
        (0.5, 6.0, 6.0, 6.0, 6, 3),
        (0.5, 7.0, 8.0, 6.5, 7, 4),
    ];
    for (duration, t1, t2, t, nx, ny) in steps {
        net.run(duration * MS).unwrap();
        assert_time(c1.t(), t1 * MS);
        assert_time(c2.t(), t2 * MS);
        assert_time(net.t(), t * MS);
        assert_eq!(x.borrow().count, nx);
        assert_eq!(y.borrow().count, ny);
    }
}

#[test]
fn implicit_time_accumulates_across_runs() {
    fresh_registry();
    let c1 = Clock::shared(1.0 * MS, 0).unwrap();
    let c2 = Clock::shared(2.0 * MS, 0).unwrap();
    let x = Unit::new(Counter::new(), Schedule::default().on(&c1));
    let y = Unit::new(Counter::new(), Schedule::default().on(&c2));

    let steps = [
        (4.0, 4.0, 4.0, 4, 2),
        (4.0, 8.0, 8.0, 8, 4),
        (1.0, 9.0, 10.0, 9, 5),
    ];
    for (duration, t1, t2, nx, ny) in steps {
        magic::run(duration * MS).unwrap();
        assert_time(c1.t(), t1 * MS);
        assert_time(c2.t(), t2 * MS);
        assert_eq!(x.borrow().count, nx);
        assert_eq!(y.borrow().count, ny);
    }
    assert_time(magic::t(), 9.0 * MS);
}

#[test]
fn remove_by_original_or_listed_handle() {
    fresh_registry();
    let x = Unit::new(Counter::new(), Schedule::default());
    let y = Unit::new(Counter::new(), Schedule::default());
    let mut net = Network::from_members((&x, &y));
    net.remove(&y);
    net.run(1.0 * MS).unwrap();
    assert_eq!(x.borrow().count, 10);
    assert_eq!(y.borrow().count, 0);

    for obj in net.objects() {
        net.remove(&obj);
    }
    assert!(net.is_empty());
    net.run(1.0 * MS).unwrap();
    assert_eq!(x.borrow().count, 10);
    assert_eq!(y.borrow().count, 0);
}

#[test]
fn units_can_be_shared_between_networks() {
    fresh_registry();
    let x = Unit::new(Counter::new(), Schedule::default());
    let mut net = Network::from_members(&x);
    let mut net2 = Network::new();
    for obj in net.objects() {
        net2.add(&obj);
    }
    net2.run(1.0 * MS).unwrap();
    assert_eq!(x.borrow().count, 10);
    net.run(1.0 * MS).unwrap();
    assert_eq!(x.borrow().count, 20);
}

#[test]
fn failure_aborts_the_run_at_the_failing_substep() {
    fresh_registry();
    let x = Unit::new(Counter::new(), Schedule::default());
    let f = Unit::new(FailAfter::new(3, "diverged"), Schedule::default().named("solver"));
    let mut net = Network::from_members((&x, &f));
    match net.run(1.0 * MS) {
        Err(RunError::UnitFailed { name, t, .. }) => {
            assert_eq!(name, "solver");
            assert_time(t, 0.3 * MS);
        }
        other => panic!("expected UnitFailed, got {other:?}"),
    }
    // x ran in the failing sub-step before the solver did.
    assert_eq!(x.borrow().count, 4);
    assert_time(net.t(), 0.3 * MS);
}

#[test]
fn restore_initial_state_forgets_units() {
    fresh_registry();
    let x = Unit::new(Counter::new(), Schedule::default());
    magic::run(1.0 * MS).unwrap();
    magic::restore_initial_state();
    assert!(magic::units().is_empty());
    assert_eq!(magic::default_clock().t(), 0.0);
    magic::run(1.0 * MS).unwrap();
    assert_eq!(x.borrow().count, 10);
}

// ── Property tests ─────────────────────────────────────────────────

mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn every_unit_updates_once_per_tick_in_sorted_order(
            attrs in prop::collection::vec((0usize..6, -3i32..3), 1..8),
            ticks in 1u32..20,
        ) {
            fresh_registry();
            let log = SharedLog::new();
            let units: Vec<_> = attrs
                .iter()
                .enumerate()
                .map(|(i, &(phase, order))| {
                    let tag = char::from(b'a' + i as u8).to_string();
                    Unit::new(
                        Recorder::new(tag, &log),
                        Schedule::default().when(When::ALL[phase]).order(order),
                    )
                })
                .collect();
            let mut net = Network::from_members(&units);
            net.run(f64::from(ticks) * 1e-4).unwrap();

            let mut expected: Vec<(usize, &(usize, i32))> = attrs.iter().enumerate().collect();
            expected.sort_by_key(|&(i, &(phase, order))| (phase, order, i));
            let one_tick: String = expected
                .iter()
                .map(|&(i, _)| char::from(b'a' + i as u8))
                .collect();
            prop_assert_eq!(log.contents(), one_tick.repeat(ticks as usize));
        }
    }
}
