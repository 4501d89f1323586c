//! Timer engine implementation.
//!
//! The engine owns a countdown and a stopwatch. They are independent state
//! machines that may run at the same time, each with its own one-second
//! tick registered on a [`TickScheduler`]. The engine does not use internal
//! threads - the caller is responsible for calling `pump()` to deliver due
//! ticks.
//!
//! ## State Transitions
//!
//! ```text
//! Countdown: Idle -> Running -> (Paused -> Running)* -> (Idle on reset | Finished at zero)
//! Stopwatch: Idle -> Running -> (Paused -> Running)* -> Idle on reset
//! ```
//!
//! ## Usage
//!
//! ```
//! use std::time::Duration;
//! use bigtimer_core::{ManualScheduler, TimerEngine};
//!
//! let mut engine = TimerEngine::new(ManualScheduler::new());
//! engine.configure_countdown(0, 0, 3);
//! engine.start_countdown();
//! engine.scheduler_mut().advance(Duration::from_secs(3));
//! let events = engine.pump(); // three ticks and one CountdownFinished
//! assert_eq!(events.len(), 4);
//! ```

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::countdown::{Countdown, CountdownState, CountdownTick, TimeFields};
use super::format::format_duration;
use super::scheduler::{ManualScheduler, TickHandle, TickScheduler};
use super::stopwatch::{Stopwatch, StopwatchState};
use crate::events::Event;

/// Period of both tick sources.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Which sub-timer an event or command refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    Countdown,
    Stopwatch,
}

/// Core timer engine.
#[derive(Debug)]
pub struct TimerEngine<S: TickScheduler = ManualScheduler> {
    scheduler: S,
    countdown: Countdown,
    stopwatch: Stopwatch,
    countdown_tick: Option<TickHandle>,
    stopwatch_tick: Option<TickHandle>,
}

impl<S: TickScheduler> TimerEngine<S> {
    /// Create an engine with both sub-timers idle and nothing configured.
    pub fn new(scheduler: S) -> Self {
        Self {
            scheduler,
            countdown: Countdown::new(),
            stopwatch: Stopwatch::new(),
            countdown_tick: None,
            stopwatch_tick: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    pub fn stopwatch(&self) -> &Stopwatch {
        &self.stopwatch
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn countdown_state(&self) -> CountdownState {
        self.countdown.state()
    }

    pub fn stopwatch_state(&self) -> StopwatchState {
        self.stopwatch.state()
    }

    pub fn is_running(&self, mode: TimerMode) -> bool {
        match mode {
            TimerMode::Countdown => self.countdown.is_running(),
            TimerMode::Stopwatch => self.stopwatch.is_running(),
        }
    }

    /// Countdown clock face; carries hours when any are configured or left.
    pub fn countdown_display(&self) -> String {
        format_duration(
            self.countdown.remaining_secs(),
            Some(self.countdown.shows_hours()),
        )
    }

    /// Stopwatch clock face; hours appear from the sixtieth minute on.
    pub fn stopwatch_display(&self) -> String {
        format_duration(self.stopwatch.elapsed_secs(), None)
    }

    // ── Countdown commands ───────────────────────────────────────────

    /// Clamp and store the input fields. The live value is reloaded unless
    /// the countdown is running, in which case `None` is returned.
    pub fn configure_countdown(&mut self, hours: i64, minutes: i64, seconds: i64) -> Option<Event> {
        let fields = TimeFields::clamped(hours, minutes, seconds);
        if !self.countdown.configure(fields) {
            debug!(?fields, "countdown running; inputs stored without reload");
            return None;
        }
        Some(Event::CountdownConfigured {
            configured_secs: self.countdown.configured_secs(),
        })
    }

    /// Start or resume the countdown. `None` when already running or when
    /// there is nothing to count down.
    pub fn start_countdown(&mut self) -> Option<Event> {
        if !self.countdown.begin() {
            return None;
        }
        self.countdown_tick = Some(self.scheduler.schedule_repeating(TICK_PERIOD));
        debug!(remaining = self.countdown.remaining_secs(), "countdown started");
        Some(Event::CountdownStarted {
            remaining_secs: self.countdown.remaining_secs(),
            at: Utc::now(),
        })
    }

    pub fn pause_countdown(&mut self) -> Option<Event> {
        if !self.countdown.halt() {
            return None;
        }
        self.cancel_countdown_tick();
        Some(Event::CountdownPaused {
            remaining_secs: self.countdown.remaining_secs(),
            at: Utc::now(),
        })
    }

    /// Stop ticking and reload the remaining time from the inputs.
    pub fn reset_countdown(&mut self) -> Event {
        self.cancel_countdown_tick();
        self.countdown.reset();
        Event::CountdownReset {
            remaining_secs: self.countdown.remaining_secs(),
            at: Utc::now(),
        }
    }

    // ── Stopwatch commands ───────────────────────────────────────────

    pub fn start_stopwatch(&mut self) -> Option<Event> {
        if !self.stopwatch.begin() {
            return None;
        }
        self.stopwatch_tick = Some(self.scheduler.schedule_repeating(TICK_PERIOD));
        Some(Event::StopwatchStarted {
            elapsed_secs: self.stopwatch.elapsed_secs(),
            at: Utc::now(),
        })
    }

    pub fn pause_stopwatch(&mut self) -> Option<Event> {
        if !self.stopwatch.halt() {
            return None;
        }
        self.cancel_stopwatch_tick();
        Some(Event::StopwatchPaused {
            elapsed_secs: self.stopwatch.elapsed_secs(),
            at: Utc::now(),
        })
    }

    pub fn reset_stopwatch(&mut self) -> Event {
        self.cancel_stopwatch_tick();
        self.stopwatch.reset();
        Event::StopwatchReset { at: Utc::now() }
    }

    /// Snapshot the elapsed time. `None` unless the stopwatch is running or paused.
    pub fn record_lap(&mut self) -> Option<Event> {
        let lap = self.stopwatch.record_lap()?;
        Some(Event::LapRecorded { lap })
    }

    // ── Ticking ──────────────────────────────────────────────────────

    /// Deliver every tick that has come due, in firing order.
    pub fn pump(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Some(handle) = self.scheduler.next_due() {
            if Some(handle) == self.countdown_tick {
                self.tick_countdown(&mut events);
            } else if Some(handle) == self.stopwatch_tick {
                self.tick_stopwatch(&mut events);
            } else {
                trace!(handle = handle.id(), "dropping stale tick");
            }
        }
        events
    }

    fn tick_countdown(&mut self, events: &mut Vec<Event>) {
        match self.countdown.tick() {
            CountdownTick::Ignored => {}
            CountdownTick::Remaining(value) => events.push(Event::Tick {
                mode: TimerMode::Countdown,
                value,
            }),
            CountdownTick::Finished => {
                // Cancel before reporting so no further firing can be pulled.
                self.cancel_countdown_tick();
                debug!("countdown finished");
                events.push(Event::Tick {
                    mode: TimerMode::Countdown,
                    value: 0,
                });
                events.push(Event::CountdownFinished { at: Utc::now() });
            }
        }
    }

    fn tick_stopwatch(&mut self, events: &mut Vec<Event>) {
        if let Some(value) = self.stopwatch.tick() {
            events.push(Event::Tick {
                mode: TimerMode::Stopwatch,
                value,
            });
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn cancel_countdown_tick(&mut self) {
        if let Some(handle) = self.countdown_tick.take() {
            self.scheduler.cancel(handle);
        }
    }

    fn cancel_stopwatch_tick(&mut self) {
        if let Some(handle) = self.stopwatch_tick.take() {
            self.scheduler.cancel(handle);
        }
    }
}

impl Default for TimerEngine<ManualScheduler> {
    fn default() -> Self {
        Self::new(ManualScheduler::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn advance(engine: &mut TimerEngine, secs: u64) -> Vec<Event> {
        engine.scheduler_mut().advance(Duration::from_secs(secs));
        engine.pump()
    }

    #[test]
    fn start_pause_resume() {
        let mut engine = TimerEngine::default();
        engine.configure_countdown(0, 1, 0);
        assert_eq!(engine.countdown_state(), CountdownState::Idle);

        assert!(engine.start_countdown().is_some());
        assert_eq!(engine.countdown_state(), CountdownState::Running);
        assert!(engine.start_countdown().is_none());

        advance(&mut engine, 10);
        assert!(engine.pause_countdown().is_some());
        assert_eq!(engine.countdown_state(), CountdownState::Paused);
        assert_eq!(engine.countdown().remaining_secs(), 50);

        assert!(advance(&mut engine, 10).is_empty());
        assert!(engine.start_countdown().is_some());
        advance(&mut engine, 5);
        assert_eq!(engine.countdown().remaining_secs(), 45);
    }

    #[test]
    fn finish_is_atomic() {
        let mut engine = TimerEngine::default();
        engine.configure_countdown(0, 0, 2);
        engine.start_countdown();

        let events = advance(&mut engine, 10);
        let ticks: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                Event::Tick { value, .. } => Some(*value),
                _ => None,
            })
            .collect();
        assert_eq!(ticks, vec![1, 0]);
        assert!(matches!(events.last(), Some(Event::CountdownFinished { .. })));
        assert_eq!(engine.countdown_state(), CountdownState::Finished);
        assert_eq!(engine.scheduler().active(), 0);

        assert!(engine.pause_countdown().is_none());
        assert!(advance(&mut engine, 10).is_empty());
        assert_eq!(engine.countdown().remaining_secs(), 0);
    }

    #[test]
    fn start_after_finish_reloads_inputs() {
        let mut engine = TimerEngine::default();
        engine.configure_countdown(0, 0, 1);
        engine.start_countdown();
        advance(&mut engine, 1);
        assert_eq!(engine.countdown_state(), CountdownState::Finished);

        match engine.start_countdown() {
            Some(Event::CountdownStarted { remaining_secs, .. }) => assert_eq!(remaining_secs, 1),
            other => panic!("expected CountdownStarted, got {other:?}"),
        }
    }

    #[test]
    fn nothing_configured_does_not_start() {
        let mut engine = TimerEngine::default();
        assert!(engine.start_countdown().is_none());
        assert_eq!(engine.scheduler().active(), 0);
    }

    #[test]
    fn reset_reloads_and_cancels() {
        let mut engine = TimerEngine::default();
        engine.configure_countdown(0, 0, 30);
        engine.start_countdown();
        advance(&mut engine, 5);
        match engine.reset_countdown() {
            Event::CountdownReset { remaining_secs, .. } => assert_eq!(remaining_secs, 30),
            other => panic!("expected CountdownReset, got {other:?}"),
        }
        assert_eq!(engine.countdown_state(), CountdownState::Idle);
        assert!(advance(&mut engine, 5).is_empty());
    }

    #[test]
    fn sub_timers_tick_independently() {
        let mut engine = TimerEngine::default();
        engine.configure_countdown(0, 0, 10);
        engine.start_countdown();
        engine.start_stopwatch();

        advance(&mut engine, 3);
        assert_eq!(engine.countdown().remaining_secs(), 7);
        assert_eq!(engine.stopwatch().elapsed_secs(), 3);

        engine.pause_countdown();
        advance(&mut engine, 2);
        assert_eq!(engine.countdown().remaining_secs(), 7);
        assert_eq!(engine.stopwatch().elapsed_secs(), 5);
    }

    #[test]
    fn laps_carry_elapsed_at_call_time() {
        let mut engine = TimerEngine::default();
        assert!(engine.record_lap().is_none());
        engine.start_stopwatch();
        let mut laps = Vec::new();
        for secs in [4, 3, 10] {
            advance(&mut engine, secs);
            laps.push(engine.record_lap().unwrap());
        }
        let expected: Vec<_> = [(1, 4), (2, 7), (3, 17)]
            .into_iter()
            .map(|(ordinal, elapsed_secs)| Event::LapRecorded {
                lap: crate::timer::Lap { ordinal, elapsed_secs },
            })
            .collect();
        assert_eq!(laps, expected);

        engine.reset_stopwatch();
        assert!(engine.stopwatch().laps().is_empty());
        assert_eq!(engine.stopwatch_state(), StopwatchState::Idle);
    }

    #[test]
    fn displays() {
        let mut engine = TimerEngine::default();
        engine.configure_countdown(1, 0, 5);
        assert_eq!(engine.countdown_display(), "01:00:05");
        engine.configure_countdown(0, 5, 0);
        assert_eq!(engine.countdown_display(), "05:00");

        engine.start_stopwatch();
        advance(&mut engine, 3599);
        assert_eq!(engine.stopwatch_display(), "59:59");
        advance(&mut engine, 1);
        assert_eq!(engine.stopwatch_display(), "01:00:00");
    }
}
