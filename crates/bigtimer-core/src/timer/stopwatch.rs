//! Stopwatch sub-timer state and laps.

use serde::{Deserialize, Serialize};

use super::format::format_duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopwatchState {
    Idle,
    Running,
    Paused,
}

/// Snapshot of elapsed stopwatch time. Never altered once recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lap {
    /// 1-based position in the lap list.
    pub ordinal: u32,
    pub elapsed_secs: u64,
}

impl Lap {
    pub fn label(&self) -> String {
        format!("Lap {}", self.ordinal)
    }

    pub fn display(&self) -> String {
        format_duration(self.elapsed_secs, None)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stopwatch {
    elapsed_secs: u64,
    state: StopwatchState,
    laps: Vec<Lap>,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    pub fn new() -> Self {
        Self {
            elapsed_secs: 0,
            state: StopwatchState::Idle,
            laps: Vec::new(),
        }
    }

    pub fn state(&self) -> StopwatchState {
        self.state
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn laps(&self) -> &[Lap] {
        &self.laps
    }

    pub fn is_running(&self) -> bool {
        self.state == StopwatchState::Running
    }

    pub fn begin(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        self.state = StopwatchState::Running;
        true
    }

    pub fn halt(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.state = StopwatchState::Paused;
        true
    }

    /// Zero the elapsed time and drop every lap.
    pub fn reset(&mut self) {
        self.state = StopwatchState::Idle;
        self.elapsed_secs = 0;
        self.laps.clear();
    }

    /// Returns the new elapsed value, or `None` when not running.
    pub fn tick(&mut self) -> Option<u64> {
        if !self.is_running() {
            return None;
        }
        self.elapsed_secs = self.elapsed_secs.saturating_add(1);
        Some(self.elapsed_secs)
    }

    /// Append a lap. Only valid while running or paused.
    pub fn record_lap(&mut self) -> Option<Lap> {
        if self.state == StopwatchState::Idle {
            return None;
        }
        let lap = Lap {
            ordinal: self.laps.len() as u32 + 1,
            elapsed_secs: self.elapsed_secs,
        };
        self.laps.push(lap);
        Some(lap)
    }
}
