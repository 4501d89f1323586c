mod countdown;
mod engine;
mod format;
mod scheduler;
mod stopwatch;

pub use countdown::{Countdown, CountdownState, TimeFields, MAX_HOURS, MAX_MINUTES, MAX_SECONDS};
pub use engine::{TimerEngine, TimerMode, TICK_PERIOD};
pub use format::format_duration;
pub use scheduler::{ManualScheduler, TickHandle, TickScheduler, WallClockScheduler};
pub use stopwatch::{Lap, Stopwatch, StopwatchState};
