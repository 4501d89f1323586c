//! Countdown sub-timer state.
//!
//! Pure state: no scheduling, no events. [`TimerEngine`](super::TimerEngine)
//! owns the tick source and turns these transitions into events.

use serde::{Deserialize, Serialize};

pub const MAX_HOURS: u8 = 99;
pub const MAX_MINUTES: u8 = 59;
pub const MAX_SECONDS: u8 = 59;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountdownState {
    Idle,
    Running,
    Paused,
    /// Reached zero. Stays here until a reset, a reconfigure or a new start.
    Finished,
}

/// The three bounded input fields a countdown is configured from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeFields {
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
}

impl TimeFields {
    /// Clamp raw input into range: hours 0..=99, minutes and seconds 0..=59.
    pub fn clamped(hours: i64, minutes: i64, seconds: i64) -> Self {
        Self {
            hours: hours.clamp(0, MAX_HOURS as i64) as u8,
            minutes: minutes.clamp(0, MAX_MINUTES as i64) as u8,
            seconds: seconds.clamp(0, MAX_SECONDS as i64) as u8,
        }
    }

    pub fn total_secs(&self) -> u64 {
        self.hours as u64 * 3600 + self.minutes as u64 * 60 + self.seconds as u64
    }
}

/// Outcome of one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownTick {
    /// Not running; the tick was dropped.
    Ignored,
    /// Decremented, still above zero.
    Remaining(u64),
    /// Decremented to zero and moved to `Finished`.
    Finished,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Countdown {
    fields: TimeFields,
    configured_secs: u64,
    remaining_secs: u64,
    state: CountdownState,
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Countdown {
    pub fn new() -> Self {
        Self {
            fields: TimeFields::default(),
            configured_secs: 0,
            remaining_secs: 0,
            state: CountdownState::Idle,
        }
    }

    pub fn state(&self) -> CountdownState {
        self.state
    }

    pub fn fields(&self) -> TimeFields {
        self.fields
    }

    pub fn configured_secs(&self) -> u64 {
        self.configured_secs
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.state == CountdownState::Running
    }

    /// Fraction of the configured duration still left, 0.0 ..= 1.0.
    pub fn progress(&self) -> f64 {
        if self.configured_secs == 0 {
            return 0.0;
        }
        (self.remaining_secs as f64 / self.configured_secs as f64).min(1.0)
    }

    /// Whether the display should carry an hour field.
    pub fn shows_hours(&self) -> bool {
        self.fields.hours > 0 || self.remaining_secs >= 3600
    }

    /// Store new input fields. Returns `true` when the live value was
    /// reloaded; a running countdown keeps its remaining time.
    pub fn configure(&mut self, fields: TimeFields) -> bool {
        self.fields = fields;
        self.configured_secs = fields.total_secs();
        if self.is_running() {
            return false;
        }
        self.remaining_secs = self.configured_secs;
        if self.state == CountdownState::Finished {
            self.state = CountdownState::Idle;
        }
        true
    }

    /// Enter `Running`. Returns `false` when already running or when there
    /// is nothing to count down even after reloading from the inputs.
    pub fn begin(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        if self.remaining_secs == 0 {
            self.remaining_secs = self.configured_secs;
        }
        if self.remaining_secs == 0 {
            return false;
        }
        self.state = CountdownState::Running;
        true
    }

    /// Leave `Running` for `Paused`. Returns `false` in any other state.
    pub fn halt(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.state = CountdownState::Paused;
        true
    }

    /// Back to `Idle` with the remaining time reloaded from the inputs.
    pub fn reset(&mut self) {
        self.state = CountdownState::Idle;
        self.remaining_secs = self.configured_secs;
    }

    pub fn tick(&mut self) -> CountdownTick {
        if !self.is_running() {
            return CountdownTick::Ignored;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.state = CountdownState::Finished;
            CountdownTick::Finished
        } else {
            CountdownTick::Remaining(self.remaining_secs)
        }
    }
}
