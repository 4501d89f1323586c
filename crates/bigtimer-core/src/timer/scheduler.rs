//! Periodic tick sources.
//!
//! The engine never sleeps or spawns. It registers a repeating tick with a
//! [`TickScheduler`] and the caller pumps due firings back into it. Two
//! schedulers are provided: [`ManualScheduler`] runs on virtual time and is
//! what tests drive, [`WallClockScheduler`] follows `Instant::now()`.

use std::time::{Duration, Instant};

/// Identifies one registration with a scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TickHandle(u64);

impl TickHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Register/cancel interface for repeating ticks.
pub trait TickScheduler {
    /// Register a callback that fires every `period`, first firing one
    /// period from now.
    fn schedule_repeating(&mut self, period: Duration) -> TickHandle;

    /// Cancel a registration. Unknown or already cancelled handles are ignored.
    fn cancel(&mut self, handle: TickHandle);

    /// Pop the next firing that has come due, earliest first.
    ///
    /// Returns one firing at a time so a cancellation made while handling
    /// it suppresses every later firing of that handle.
    fn next_due(&mut self) -> Option<TickHandle>;
}

#[derive(Debug, Clone)]
struct Entry<T> {
    handle: TickHandle,
    period: Duration,
    next_due: T,
}

fn pop_due<T: Copy + Ord + std::ops::Add<Duration, Output = T>>(
    entries: &mut [Entry<T>],
    now: T,
) -> Option<TickHandle> {
    let entry = entries
        .iter_mut()
        .filter(|e| e.next_due <= now)
        .min_by_key(|e| (e.next_due, e.handle))?;
    entry.next_due = entry.next_due + entry.period;
    Some(entry.handle)
}

/// Scheduler driven by explicit [`advance`](ManualScheduler::advance) calls.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    now: Duration,
    next_id: u64,
    entries: Vec<Entry<Duration>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move virtual time forward. Firings that become due are returned by
    /// subsequent [`next_due`](TickScheduler::next_due) calls.
    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }

    /// Virtual time elapsed since construction.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of live registrations.
    pub fn active(&self) -> usize {
        self.entries.len()
    }
}

impl TickScheduler for ManualScheduler {
    fn schedule_repeating(&mut self, period: Duration) -> TickHandle {
        self.next_id += 1;
        let handle = TickHandle(self.next_id);
        self.entries.push(Entry {
            handle,
            period,
            next_due: self.now + period,
        });
        handle
    }

    fn cancel(&mut self, handle: TickHandle) {
        self.entries.retain(|e| e.handle != handle);
    }

    fn next_due(&mut self) -> Option<TickHandle> {
        pop_due(&mut self.entries, self.now)
    }
}

/// Scheduler backed by the monotonic system clock.
///
/// Firings missed while the caller was not pumping are delivered in a burst
/// on the next pump, one per elapsed period.
#[derive(Debug, Clone, Default)]
pub struct WallClockScheduler {
    next_id: u64,
    entries: Vec<Entry<Instant>>,
}

impl WallClockScheduler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TickScheduler for WallClockScheduler {
    fn schedule_repeating(&mut self, period: Duration) -> TickHandle {
        self.next_id += 1;
        let handle = TickHandle(self.next_id);
        self.entries.push(Entry {
            handle,
            period,
            next_due: Instant::now() + period,
        });
        handle
    }

    fn cancel(&mut self, handle: TickHandle) {
        self.entries.retain(|e| e.handle != handle);
    }

    fn next_due(&mut self) -> Option<TickHandle> {
        pop_due(&mut self.entries, Instant::now())
    }
}
