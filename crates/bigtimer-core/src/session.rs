//! One Big Timer session: the engine, the gate and a presenter wired
//! together.
//!
//! Construct one per running UI and hand it to whatever routes input. The
//! freemium check is part of starting a countdown: authorize, start, then
//! count the start. Resuming a paused countdown counts as a start.
//! Stopwatch starts are not gated.

use url::Url;

use crate::checkout::{strip_return_params, CheckoutProvider, CheckoutReturn, CheckoutSession};
use crate::entitlement::{Decision, DenyReason, EntitlementGate, Plan};
use crate::error::CheckoutError;
use crate::events::{dispatch, Event, Presenter};
use crate::storage::CheckoutConfig;
use crate::timer::{CountdownState, Lap, TickScheduler, TimerEngine, TimerMode};

/// Result of asking for a countdown start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new run began and was counted against the daily allowance.
    Started,
    /// A paused run continued and was counted against the daily allowance.
    Resumed,
    AlreadyRunning,
    /// Nothing is configured, so there is nothing to count down.
    NothingToRun,
    Denied(DenyReason),
}

/// What the start/pause toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggled {
    Countdown(StartOutcome),
    CountdownPaused,
    StopwatchStarted,
    StopwatchPaused,
}

pub struct BigTimer<S: TickScheduler, P: Presenter> {
    engine: TimerEngine<S>,
    gate: EntitlementGate,
    presenter: P,
    checkout: Box<dyn CheckoutProvider>,
    checkout_config: CheckoutConfig,
    visible: TimerMode,
}

impl<S: TickScheduler, P: Presenter> BigTimer<S, P> {
    pub fn new(
        engine: TimerEngine<S>,
        gate: EntitlementGate,
        presenter: P,
        checkout: Box<dyn CheckoutProvider>,
        checkout_config: CheckoutConfig,
    ) -> Self {
        Self {
            engine,
            gate,
            presenter,
            checkout,
            checkout_config,
            visible: TimerMode::Countdown,
        }
    }

    pub fn engine(&self) -> &TimerEngine<S> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut TimerEngine<S> {
        &mut self.engine
    }

    pub fn gate(&self) -> &EntitlementGate {
        &self.gate
    }

    pub fn gate_mut(&mut self) -> &mut EntitlementGate {
        &mut self.gate
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn visible_mode(&self) -> TimerMode {
        self.visible
    }

    /// Change which sub-timer is shown. Both keep their state.
    pub fn switch_mode(&mut self, mode: TimerMode) {
        self.visible = mode;
    }

    // ── Countdown ────────────────────────────────────────────────────

    pub fn configure_countdown(&mut self, hours: i64, minutes: i64, seconds: i64) {
        if let Some(event) = self.engine.configure_countdown(hours, minutes, seconds) {
            self.emit(event);
        }
    }

    /// Start or resume the countdown. Both are authorized and counted
    /// against the daily allowance.
    pub fn start_countdown(&mut self) -> StartOutcome {
        let countdown = self.engine.countdown();
        let resuming = match countdown.state() {
            CountdownState::Running => return StartOutcome::AlreadyRunning,
            CountdownState::Paused => true,
            CountdownState::Idle | CountdownState::Finished => false,
        };
        if !resuming && countdown.remaining_secs() == 0 && countdown.configured_secs() == 0 {
            return StartOutcome::NothingToRun;
        }

        if let Decision::Deny(reason) = self.gate.authorize_timer_start() {
            self.emit(Event::AuthorizationDenied {
                reason: reason.to_string(),
            });
            return StartOutcome::Denied(reason);
        }

        let Some(started) = self.engine.start_countdown() else {
            return StartOutcome::NothingToRun;
        };
        let used = self.gate.record_timer_start();
        self.emit(started);
        self.emit(Event::UsageRecorded {
            used,
            limit: self.gate.free_daily_limit(),
        });
        if resuming {
            StartOutcome::Resumed
        } else {
            StartOutcome::Started
        }
    }

    pub fn pause_countdown(&mut self) -> bool {
        self.emit_some(|engine| engine.pause_countdown())
    }

    pub fn reset_countdown(&mut self) {
        let event = self.engine.reset_countdown();
        self.emit(event);
    }

    // ── Stopwatch ────────────────────────────────────────────────────

    pub fn start_stopwatch(&mut self) -> bool {
        self.emit_some(|engine| engine.start_stopwatch())
    }

    pub fn pause_stopwatch(&mut self) -> bool {
        self.emit_some(|engine| engine.pause_stopwatch())
    }

    pub fn reset_stopwatch(&mut self) {
        let event = self.engine.reset_stopwatch();
        self.emit(event);
    }

    pub fn record_lap(&mut self) -> Option<Lap> {
        let event = self.engine.record_lap()?;
        let lap = match &event {
            Event::LapRecorded { lap } => Some(*lap),
            _ => None,
        };
        self.emit(event);
        lap
    }

    // ── Routing ──────────────────────────────────────────────────────

    /// Start/pause whichever sub-timer is visible (the space bar).
    pub fn toggle_visible(&mut self) -> Toggled {
        match self.visible {
            TimerMode::Countdown if self.engine.is_running(TimerMode::Countdown) => {
                self.pause_countdown();
                Toggled::CountdownPaused
            }
            TimerMode::Countdown => Toggled::Countdown(self.start_countdown()),
            TimerMode::Stopwatch if self.engine.is_running(TimerMode::Stopwatch) => {
                self.pause_stopwatch();
                Toggled::StopwatchPaused
            }
            TimerMode::Stopwatch => {
                self.start_stopwatch();
                Toggled::StopwatchStarted
            }
        }
    }

    /// Deliver due ticks to the presenter. Returns how many events went out.
    pub fn pump(&mut self) -> usize {
        let events = self.engine.pump();
        let count = events.len();
        for event in events {
            self.emit(event);
        }
        count
    }

    // ── Checkout ─────────────────────────────────────────────────────

    /// Build a checkout for `plan` and return where to send the user.
    pub fn begin_checkout(&self, plan: Plan) -> Result<Url, CheckoutError> {
        let session =
            CheckoutSession::new(plan, &self.gate.record().user_id, &self.checkout_config)?;
        self.checkout.redirect_to_checkout(&session)
    }

    /// Handle a return from the hosted checkout. Activates premium on a
    /// success signal and hands back the location with the checkout
    /// parameters removed, which the caller should display instead.
    pub fn complete_checkout(
        &mut self,
        location: &Url,
    ) -> Result<(CheckoutReturn, Url), CheckoutError> {
        let outcome = CheckoutReturn::from_url(location)?;
        if let CheckoutReturn::Success(plan) = outcome {
            self.gate.activate_premium(plan);
            let at = self.gate.record().activated_at.unwrap_or_else(chrono::Utc::now);
            self.emit(Event::PremiumActivated { plan, at });
        }
        Ok((outcome, strip_return_params(location)))
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn emit(&mut self, event: Event) {
        dispatch(&mut self.presenter, &event);
    }

    fn emit_some(&mut self, command: impl FnOnce(&mut TimerEngine<S>) -> Option<Event>) -> bool {
        match command(&mut self.engine) {
            Some(event) => {
                self.emit(event);
                true
            }
            None => false,
        }
    }
}
