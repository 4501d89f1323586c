use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entitlement::Plan;
use crate::timer::{Lap, TimerMode};

/// Every state change in the core produces an Event.
/// The presentation layer receives them through a [`Presenter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    CountdownConfigured {
        configured_secs: u64,
    },
    CountdownStarted {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    CountdownPaused {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    CountdownReset {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// Countdown reached zero. Emitted exactly once per run.
    CountdownFinished {
        at: DateTime<Utc>,
    },
    StopwatchStarted {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    StopwatchPaused {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    StopwatchReset {
        at: DateTime<Utc>,
    },
    Tick {
        mode: TimerMode,
        value: u64,
    },
    LapRecorded {
        lap: Lap,
    },
    AuthorizationDenied {
        reason: String,
    },
    UsageRecorded {
        used: u32,
        limit: u32,
    },
    PremiumActivated {
        plan: Plan,
        at: DateTime<Utc>,
    },
}

/// Callbacks consumed by the presentation layer.
///
/// All methods default to no-ops so a presenter only implements what it
/// renders. `on_event` sees every event before the specific callback.
pub trait Presenter {
    fn on_tick(&mut self, _mode: TimerMode, _value: u64) {}
    fn on_finished(&mut self) {}
    fn on_lap_recorded(&mut self, _lap: &Lap) {}
    fn on_authorization_denied(&mut self, _reason: &str) {}
    fn on_premium_activated(&mut self, _plan: Plan) {}
    fn on_event(&mut self, _event: &Event) {}
}

impl Presenter for () {}

/// Route one event to the matching presenter callback.
pub fn dispatch<P: Presenter + ?Sized>(presenter: &mut P, event: &Event) {
    presenter.on_event(event);
    match event {
        Event::Tick { mode, value } => presenter.on_tick(*mode, *value),
        Event::CountdownFinished { .. } => presenter.on_finished(),
        Event::LapRecorded { lap } => presenter.on_lap_recorded(lap),
        Event::AuthorizationDenied { reason } => presenter.on_authorization_denied(reason),
        Event::PremiumActivated { plan, .. } => presenter.on_premium_activated(*plan),
        _ => {}
    }
}

/// Presenter that keeps every event, in order.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Remove and return everything recorded so far.
    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Values carried by tick events for one sub-timer.
    pub fn ticks(&self, mode: TimerMode) -> Vec<u64> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Tick { mode: m, value } if *m == mode => Some(*value),
                _ => None,
            })
            .collect()
    }

    pub fn count_finished(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, Event::CountdownFinished { .. }))
            .count()
    }
}

impl Presenter for EventLog {
    fn on_event(&mut self, event: &Event) {
        self.events.push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        ticks: usize,
        finished: usize,
        denied: Vec<String>,
    }

    impl Presenter for Counter {
        fn on_tick(&mut self, _mode: TimerMode, _value: u64) {
            self.ticks += 1;
        }
        fn on_finished(&mut self) {
            self.finished += 1;
        }
        fn on_authorization_denied(&mut self, reason: &str) {
            self.denied.push(reason.to_string());
        }
    }

    #[test]
    fn dispatch_routes_to_callbacks() {
        let mut counter = Counter::default();
        dispatch(&mut counter, &Event::Tick { mode: TimerMode::Countdown, value: 3 });
        dispatch(&mut counter, &Event::CountdownFinished { at: Utc::now() });
        dispatch(&mut counter, &Event::AuthorizationDenied { reason: "nope".into() });
        dispatch(&mut counter, &Event::StopwatchReset { at: Utc::now() });

        assert_eq!(counter.ticks, 1);
        assert_eq!(counter.finished, 1);
        assert_eq!(counter.denied, vec!["nope".to_string()]);
    }

    #[test]
    fn event_log_filters_ticks_by_mode() {
        let mut log = EventLog::new();
        dispatch(&mut log, &Event::Tick { mode: TimerMode::Countdown, value: 2 });
        dispatch(&mut log, &Event::Tick { mode: TimerMode::Stopwatch, value: 1 });
        dispatch(&mut log, &Event::Tick { mode: TimerMode::Countdown, value: 1 });

        assert_eq!(log.ticks(TimerMode::Countdown), vec![2, 1]);
        assert_eq!(log.ticks(TimerMode::Stopwatch), vec![1]);
        assert_eq!(log.drain().len(), 3);
        assert!(log.events().is_empty());
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let json = serde_json::to_value(Event::Tick { mode: TimerMode::Stopwatch, value: 7 }).unwrap();
        assert_eq!(json["type"], "tick");
        assert_eq!(json["mode"], "stopwatch");
        assert_eq!(json["value"], 7);
    }
}
