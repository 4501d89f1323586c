//! Freemium gate.
//!
//! Owns the entitlement record and decides whether a timer start is
//! permitted. Premium and trial users always pass; free users get a fixed
//! number of timer starts per local calendar day.
//!
//! The record is written back after every mutation. Writes are fire and
//! forget: a failed write is logged and dropped, which at worst costs the
//! user their premium or trial standing on the next load. A gate whose
//! initial read failed never writes, so it cannot clobber a record it
//! could not see.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::clock::Clock;
use super::plan::{Plan, Theme, Tier};
use super::record::EntitlementRecord;
use crate::storage::{GateConfig, KeyValueStore};

/// Why an action was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DenyReason {
    DailyLimitReached { limit: u32 },
    PremiumTheme { theme: Theme },
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::DailyLimitReached { limit } => {
                write!(f, "You've reached your daily limit of {limit} timers.")
            }
            DenyReason::PremiumTheme { theme } => {
                write!(f, "Unlock premium themes to use {}.", theme.name())
            }
        }
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Daily usage as shown on the free-tier meter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageMeter {
    pub used: u32,
    pub limit: u32,
}

impl UsageMeter {
    /// Fill fraction of the meter. May exceed 1.0 if the limit was lowered.
    pub fn ratio(&self) -> f64 {
        if self.limit == 0 {
            return 1.0;
        }
        self.used as f64 / self.limit as f64
    }

    pub fn label(&self) -> String {
        format!("Daily timers: {}/{}", self.used, self.limit)
    }
}

/// Account overview for status displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountSummary {
    pub user_id: String,
    pub tier: Tier,
    pub plan: Option<Plan>,
    pub trial_days_left: Option<i64>,
    pub usage: Option<UsageMeter>,
}

pub struct EntitlementGate {
    record: EntitlementRecord,
    store: Box<dyn KeyValueStore>,
    clock: Box<dyn Clock>,
    config: GateConfig,
    /// Set when the stored record could not be read. The session then runs
    /// on an in-memory record and leaves the store alone.
    detached: bool,
}

impl fmt::Debug for EntitlementGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntitlementGate")
            .field("record", &self.record)
            .field("config", &self.config)
            .field("detached", &self.detached)
            .finish_non_exhaustive()
    }
}

impl EntitlementGate {
    /// Load the stored record, or create and persist a fresh one when it is
    /// missing or corrupt. When the store cannot be read at all, a fresh
    /// record is used for this session only and nothing is written back.
    pub fn load(
        store: Box<dyn KeyValueStore>,
        clock: Box<dyn Clock>,
        config: GateConfig,
    ) -> Self {
        let (stored, detached) = match store.get(&config.storage_key) {
            Ok(blob) => (blob, false),
            Err(e) => {
                warn!(error = %e, "entitlement store unreadable; using an in-memory record");
                (None, true)
            }
        };

        let existing = stored.and_then(|blob| match EntitlementRecord::decode(&blob) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, "discarding corrupt entitlement record");
                None
            }
        });

        let record = existing.unwrap_or_else(|| {
            let record = EntitlementRecord::new(clock.now(), clock.today(), config.trial_days);
            debug!(user_id = %record.user_id, trial_ends_at = %record.trial_ends_at, "created entitlement record");
            record
        });

        let mut gate = Self {
            record,
            store,
            clock,
            config,
            detached,
        };
        gate.persist();
        gate.refresh_daily_window();
        gate
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn record(&self) -> &EntitlementRecord {
        &self.record
    }

    /// Whether this gate is running without its store after a failed read.
    pub fn is_detached(&self) -> bool {
        self.detached
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn free_daily_limit(&self) -> u32 {
        self.config.free_daily_limit
    }

    pub fn is_premium(&self) -> bool {
        self.record.is_premium
    }

    pub fn is_trial_active(&self) -> bool {
        self.record.is_trial_active(self.clock.now())
    }

    pub fn tier(&self) -> Tier {
        if self.record.is_premium {
            Tier::Premium
        } else if self.is_trial_active() {
            Tier::Trial
        } else {
            Tier::Free
        }
    }

    /// Days left in the trial, for the trial banner. `None` unless the
    /// account is in its trial and not premium.
    pub fn trial_days_left(&self) -> Option<i64> {
        (self.tier() == Tier::Trial).then(|| self.record.trial_days_left(self.clock.now()))
    }

    pub fn summary(&mut self) -> AccountSummary {
        let usage = self.usage_meter();
        AccountSummary {
            user_id: self.record.user_id.clone(),
            tier: self.tier(),
            plan: self.record.plan,
            trial_days_left: self.trial_days_left(),
            usage,
        }
    }

    // ── Daily window ─────────────────────────────────────────────────

    /// Zero the usage count when the stored date is not today. Returns
    /// `true` when a reset happened.
    pub fn refresh_daily_window(&mut self) -> bool {
        let today = self.clock.today();
        if self.record.last_usage_reset_date == today {
            return false;
        }
        debug!(
            previous = %self.record.last_usage_reset_date,
            %today,
            "resetting daily usage"
        );
        self.record.daily_usage_count = 0;
        self.record.last_usage_reset_date = today;
        self.persist();
        true
    }

    /// Today's usage count, after rolling the window if needed.
    pub fn daily_usage(&mut self) -> u32 {
        self.refresh_daily_window();
        self.record.daily_usage_count
    }

    /// Meter for the free tier. `None` for premium and trial accounts.
    pub fn usage_meter(&mut self) -> Option<UsageMeter> {
        self.refresh_daily_window();
        (self.tier() == Tier::Free).then(|| UsageMeter {
            used: self.record.daily_usage_count,
            limit: self.config.free_daily_limit,
        })
    }

    pub fn usage_ratio(&mut self) -> Option<f64> {
        self.usage_meter().map(|m| m.ratio())
    }

    // ── Authorization ────────────────────────────────────────────────

    /// May a timer be started now? A denial leaves the record untouched.
    pub fn authorize_timer_start(&mut self) -> Decision {
        self.refresh_daily_window();
        let decision = if self.record.is_premium
            || self.is_trial_active()
            || self.record.daily_usage_count < self.config.free_daily_limit
        {
            Decision::Allow
        } else {
            Decision::Deny(DenyReason::DailyLimitReached {
                limit: self.config.free_daily_limit,
            })
        };
        debug!(?decision, used = self.record.daily_usage_count, "timer start authorization");
        decision
    }

    /// Count one granted timer start. Call at most once per allowed start.
    pub fn record_timer_start(&mut self) -> u32 {
        self.refresh_daily_window();
        self.record.daily_usage_count = self.record.daily_usage_count.saturating_add(1);
        self.persist();
        self.record.daily_usage_count
    }

    pub fn authorize_theme(&self, theme: Theme) -> Decision {
        if !theme.is_premium() || self.tier().is_unrestricted() {
            Decision::Allow
        } else {
            Decision::Deny(DenyReason::PremiumTheme { theme })
        }
    }

    // ── Premium ──────────────────────────────────────────────────────

    /// Switch the account to premium. One-way.
    pub fn activate_premium(&mut self, plan: Plan) {
        self.record.activate_premium(plan, self.clock.now());
        info!(user_id = %self.record.user_id, %plan, "premium activated");
        self.persist();
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn persist(&mut self) {
        if self.detached {
            debug!("entitlement gate detached; skipping write");
            return;
        }
        let blob = match self.record.encode() {
            Ok(blob) => blob,
            Err(e) => {
                warn!(error = %e, "could not encode entitlement record");
                return;
            }
        };
        if let Err(e) = self.store.set(&self.config.storage_key, &blob) {
            warn!(error = %e, "entitlement record not persisted");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entitlement::clock::{Clock, ManualClock};
    use crate::storage::MemoryStore;
    use chrono::{Duration, TimeZone, Utc};

    fn setup() -> (EntitlementGate, MemoryStore, ManualClock) {
        let store = MemoryStore::new();
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap());
        let gate = EntitlementGate::load(
            Box::new(store.clone()),
            Box::new(clock.clone()),
            GateConfig::default(),
        );
        (gate, store, clock)
    }

    fn expire_trial(clock: &ManualClock) {
        clock.advance(Duration::days(8));
    }

    #[test]
    fn load_creates_and_persists_record() {
        let (gate, store, _clock) = setup();
        let stored = store.raw("bigTimerUser").unwrap();
        assert_eq!(EntitlementRecord::decode(&stored).unwrap(), *gate.record());
        assert_eq!(gate.tier(), Tier::Trial);
        assert_eq!(gate.trial_days_left(), Some(7));
    }

    #[test]
    fn load_reuses_stored_record() {
        let (gate, store, clock) = setup();
        let again = EntitlementGate::load(
            Box::new(store.clone()),
            Box::new(clock.clone()),
            GateConfig::default(),
        );
        assert_eq!(again.record().user_id, gate.record().user_id);
        assert_eq!(again.record().trial_ends_at, gate.record().trial_ends_at);
    }

    #[test]
    fn corrupt_record_is_replaced() {
        let store = MemoryStore::new();
        store.insert_raw("bigTimerUser", "{not json");
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap());
        let gate = EntitlementGate::load(Box::new(store.clone()), Box::new(clock), GateConfig::default());
        assert_eq!(gate.tier(), Tier::Trial);
        let stored = store.raw("bigTimerUser").unwrap();
        assert_eq!(EntitlementRecord::decode(&stored).unwrap(), *gate.record());
    }

    #[test]
    fn free_tier_limit() {
        let (mut gate, _store, clock) = setup();
        expire_trial(&clock);
        for _ in 0..4 {
            gate.record_timer_start();
        }
        assert_eq!(gate.authorize_timer_start(), Decision::Allow);
        gate.record_timer_start();
        assert_eq!(
            gate.authorize_timer_start(),
            Decision::Deny(DenyReason::DailyLimitReached { limit: 5 })
        );
        assert_eq!(gate.daily_usage(), 5);
    }

    #[test]
    fn deny_reason_message() {
        let reason = DenyReason::DailyLimitReached { limit: 5 };
        assert_eq!(reason.to_string(), "You've reached your daily limit of 5 timers.");
    }

    #[test]
    fn trial_ignores_usage() {
        let (mut gate, _store, _clock) = setup();
        for _ in 0..20 {
            gate.record_timer_start();
        }
        assert_eq!(gate.authorize_timer_start(), Decision::Allow);
        assert!(gate.usage_meter().is_none());
    }

    #[test]
    fn new_day_resets_usage() {
        let (mut gate, store, clock) = setup();
        expire_trial(&clock);
        for _ in 0..5 {
            gate.record_timer_start();
        }
        assert!(!gate.authorize_timer_start().is_allowed());

        clock.advance(Duration::days(1));
        assert!(gate.refresh_daily_window());
        assert_eq!(gate.authorize_timer_start(), Decision::Allow);
        let stored = EntitlementRecord::decode(&store.raw("bigTimerUser").unwrap()).unwrap();
        assert_eq!(stored.daily_usage_count, 0);
        assert_eq!(stored.last_usage_reset_date, clock.today());
    }

    #[test]
    fn premium_is_one_way() {
        let (mut gate, store, clock) = setup();
        gate.activate_premium(Plan::Yearly);
        expire_trial(&clock);
        for _ in 0..50 {
            gate.record_timer_start();
        }
        assert_eq!(gate.authorize_timer_start(), Decision::Allow);
        assert_eq!(gate.tier(), Tier::Premium);
        assert!(gate.trial_days_left().is_none());
        assert!(gate.usage_ratio().is_none());

        let reloaded = EntitlementGate::load(Box::new(store), Box::new(clock), GateConfig::default());
        assert!(reloaded.is_premium());
        assert_eq!(reloaded.record().plan, Some(Plan::Yearly));
    }

    #[test]
    fn usage_meter_for_free_tier() {
        let (mut gate, _store, clock) = setup();
        expire_trial(&clock);
        gate.record_timer_start();
        gate.record_timer_start();
        let meter = gate.usage_meter().unwrap();
        assert_eq!(meter.label(), "Daily timers: 2/5");
        assert!((meter.ratio() - 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn summary_tracks_tier() {
        let (mut gate, _store, clock) = setup();
        let trial = gate.summary();
        assert_eq!(trial.tier, Tier::Trial);
        assert_eq!(trial.trial_days_left, Some(7));
        assert!(trial.usage.is_none());

        expire_trial(&clock);
        gate.record_timer_start();
        let free = gate.summary();
        assert_eq!(free.tier, Tier::Free);
        assert_eq!(free.usage, Some(UsageMeter { used: 1, limit: 5 }));
        assert_eq!(free.user_id, gate.record().user_id);
    }

    #[test]
    fn write_failures_are_swallowed() {
        let (mut gate, store, clock) = setup();
        expire_trial(&clock);
        store.reject_writes(true);
        assert_eq!(gate.record_timer_start(), 1);
        assert_eq!(gate.daily_usage(), 1);

        let stored = EntitlementRecord::decode(&store.raw("bigTimerUser").unwrap()).unwrap();
        assert_eq!(stored.daily_usage_count, 0);
    }

    #[test]
    fn unreadable_store_is_left_untouched() {
        let (mut gate, store, clock) = setup();
        gate.activate_premium(Plan::Lifetime);
        let saved = store.raw("bigTimerUser").unwrap();

        store.reject_reads(true);
        let mut fallback = EntitlementGate::load(
            Box::new(store.clone()),
            Box::new(clock.clone()),
            GateConfig::default(),
        );
        assert!(fallback.is_detached());
        assert!(!fallback.is_premium());
        assert_ne!(fallback.record().user_id, gate.record().user_id);
        fallback.record_timer_start();
        fallback.activate_premium(Plan::Monthly);
        assert_eq!(store.raw("bigTimerUser").unwrap(), saved);

        store.reject_reads(false);
        let recovered = EntitlementGate::load(Box::new(store), Box::new(clock), GateConfig::default());
        assert!(!recovered.is_detached());
        assert!(recovered.is_premium());
        assert_eq!(recovered.record().plan, Some(Plan::Lifetime));
        assert_eq!(recovered.record().user_id, gate.record().user_id);
    }

    #[test]
    fn themes_locked_on_free_tier() {
        let (mut gate, _store, clock) = setup();
        assert!(gate.authorize_theme(Theme::OceanBlue).is_allowed());
        expire_trial(&clock);
        assert!(gate.authorize_theme(Theme::Default).is_allowed());
        assert_eq!(
            gate.authorize_theme(Theme::GalaxyPurple),
            Decision::Deny(DenyReason::PremiumTheme { theme: Theme::GalaxyPurple })
        );
        gate.activate_premium(Plan::Lifetime);
        assert!(gate.authorize_theme(Theme::GalaxyPurple).is_allowed());
    }
}
