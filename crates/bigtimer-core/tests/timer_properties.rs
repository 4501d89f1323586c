//! Integration tests for the countdown and stopwatch engine.

use std::time::Duration;

use bigtimer_core::timer::{CountdownState, StopwatchState};
use bigtimer_core::{format_duration, Event, ManualScheduler, TimerEngine, TimerMode};
use proptest::prelude::*;

fn advance(engine: &mut TimerEngine, secs: u64) -> Vec<Event> {
    engine.scheduler_mut().advance(Duration::from_secs(secs));
    engine.pump()
}

proptest! {
    #[test]
    fn configured_seconds_follow_clamped_fields(
        h in -200i64..300,
        m in -200i64..300,
        s in -200i64..300,
    ) {
        let mut engine = TimerEngine::new(ManualScheduler::new());
        engine.configure_countdown(h, m, s);
        let expected = h.clamp(0, 99) * 3600 + m.clamp(0, 59) * 60 + s.clamp(0, 59);
        prop_assert_eq!(engine.countdown().configured_secs(), expected as u64);
        prop_assert_eq!(engine.countdown().remaining_secs(), expected as u64);
    }

    #[test]
    fn hidden_hours_fold_into_minutes(total in 0u64..1_000_000) {
        let shown = format_duration(total, Some(false));
        let (mm, ss) = shown.split_once(':').unwrap();
        prop_assert_eq!(mm.parse::<u64>().unwrap(), total / 60);
        prop_assert_eq!(ss.parse::<u64>().unwrap(), total % 60);
    }
}

#[test]
fn format_duration_reference_values() {
    assert_eq!(format_duration(3661, None), "01:01:01");
    assert_eq!(format_duration(59, None), "00:59");
    assert_eq!(format_duration(3600, Some(false)), "60:00");
    assert_eq!(format_duration(0, None), "00:00");
}

#[test]
fn countdown_finishes_once_and_stays_at_zero() {
    let mut engine = TimerEngine::default();
    engine.configure_countdown(0, 0, 3);
    assert!(engine.start_countdown().is_some());

    let events = advance(&mut engine, 10);
    let finished = events
        .iter()
        .filter(|e| matches!(e, Event::CountdownFinished { .. }))
        .count();
    assert_eq!(finished, 1);
    assert_eq!(engine.countdown().remaining_secs(), 0);
    assert_eq!(engine.countdown_state(), CountdownState::Finished);

    assert!(advance(&mut engine, 10).is_empty());
    assert!(engine.pause_countdown().is_none());
    assert_eq!(engine.countdown().remaining_secs(), 0);
}

#[test]
fn finished_countdown_can_run_again() {
    let mut engine = TimerEngine::default();
    engine.configure_countdown(0, 0, 2);
    engine.start_countdown();
    advance(&mut engine, 2);
    assert_eq!(engine.countdown_state(), CountdownState::Finished);

    assert!(engine.start_countdown().is_some());
    assert_eq!(engine.countdown().remaining_secs(), 2);
}

#[test]
fn edits_while_running_do_not_touch_the_live_value() {
    let mut engine = TimerEngine::default();
    engine.configure_countdown(0, 1, 0);
    engine.start_countdown();
    advance(&mut engine, 5);

    assert!(engine.configure_countdown(0, 10, 0).is_none());
    assert_eq!(engine.countdown().remaining_secs(), 55);

    engine.reset_countdown();
    assert_eq!(engine.countdown().remaining_secs(), 600);
}

#[test]
fn laps_are_numbered_in_call_order() {
    let mut engine = TimerEngine::default();
    engine.start_stopwatch();

    let mut laps = Vec::new();
    for secs in [3, 4, 5] {
        advance(&mut engine, secs);
        match engine.record_lap() {
            Some(Event::LapRecorded { lap }) => laps.push(lap),
            other => panic!("expected a lap, got {other:?}"),
        }
    }

    let ordinals: Vec<u32> = laps.iter().map(|l| l.ordinal).collect();
    let elapsed: Vec<u64> = laps.iter().map(|l| l.elapsed_secs).collect();
    assert_eq!(ordinals, vec![1, 2, 3]);
    assert_eq!(elapsed, vec![3, 7, 12]);
    assert_eq!(engine.stopwatch().laps(), laps.as_slice());
}

#[test]
fn both_timers_tick_independently() {
    let mut engine = TimerEngine::default();
    engine.configure_countdown(0, 0, 5);
    engine.start_countdown();
    engine.start_stopwatch();

    let events = advance(&mut engine, 2);
    let ticks = |mode| {
        events
            .iter()
            .filter_map(|e| match e {
                Event::Tick { mode: m, value } if *m == mode => Some(*value),
                _ => None,
            })
            .collect::<Vec<_>>()
    };
    assert_eq!(ticks(TimerMode::Countdown), vec![4, 3]);
    assert_eq!(ticks(TimerMode::Stopwatch), vec![1, 2]);

    engine.pause_stopwatch();
    advance(&mut engine, 1);
    assert_eq!(engine.stopwatch_state(), StopwatchState::Paused);
    assert_eq!(engine.stopwatch().elapsed_secs(), 2);
    assert_eq!(engine.countdown().remaining_secs(), 2);
}
