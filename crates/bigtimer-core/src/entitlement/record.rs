//! The persisted entitlement record.
//!
//! Stored as a flat JSON document under one key. Field names follow the
//! blob the web widget writes (`id`, `dailyUsage`, `lastUsageReset`, ...)
//! so a record written by either side loads in the other.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::plan::Plan;

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Timestamps are stored with millisecond precision. A valid record holds
/// millisecond-aligned instants (everything built here is), and for those
/// `decode(encode(r)) == r`. Finer instants set by hand are truncated on
/// encode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementRecord {
    /// Opaque identifier, stable for the lifetime of the record.
    #[serde(rename = "id")]
    pub user_id: String,
    #[serde(default)]
    pub email: Option<String>,
    pub is_premium: bool,
    /// Set once at creation, never moved.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub trial_ends_at: DateTime<Utc>,
    #[serde(rename = "dailyUsage")]
    pub daily_usage_count: u32,
    #[serde(rename = "lastUsageReset", with = "usage_date")]
    pub last_usage_reset_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<Plan>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub activated_at: Option<DateTime<Utc>>,
}

impl EntitlementRecord {
    /// Fresh free-tier record whose trial runs `trial_days` from `now`.
    pub fn new(now: DateTime<Utc>, today: NaiveDate, trial_days: u32) -> Self {
        Self {
            user_id: generate_user_id(),
            email: None,
            is_premium: false,
            trial_ends_at: truncate_to_millis(now) + Duration::days(trial_days as i64),
            daily_usage_count: 0,
            last_usage_reset_date: today,
            plan: None,
            activated_at: None,
        }
    }

    /// Copy with every timestamp truncated to the stored precision.
    pub fn normalized(&self) -> Self {
        Self {
            trial_ends_at: truncate_to_millis(self.trial_ends_at),
            activated_at: self.activated_at.map(truncate_to_millis),
            ..self.clone()
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn decode(blob: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(blob)
    }

    pub fn is_trial_active(&self, now: DateTime<Utc>) -> bool {
        now < self.trial_ends_at
    }

    /// Whole days left in the trial, rounded up. Zero once it has ended.
    pub fn trial_days_left(&self, now: DateTime<Utc>) -> i64 {
        let left_ms = (self.trial_ends_at - now).num_milliseconds();
        if left_ms <= 0 {
            return 0;
        }
        (left_ms + MS_PER_DAY - 1) / MS_PER_DAY
    }

    /// Mark the record premium. There is no way back.
    pub fn activate_premium(&mut self, plan: Plan, now: DateTime<Utc>) {
        self.is_premium = true;
        self.plan = Some(plan);
        self.activated_at = Some(truncate_to_millis(now));
    }
}

pub fn generate_user_id() -> String {
    format!("user_{}", Uuid::new_v4().simple())
}

/// The stored form keeps millisecond precision only.
pub fn truncate_to_millis(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(at.timestamp_millis()).unwrap_or(at)
}

/// `lastUsageReset` is written as `YYYY-MM-DD`. The web widget's
/// `Mon Oct 19 2026` form is accepted on read.
mod usage_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    const ISO: &str = "%Y-%m-%d";
    const LEGACY: &str = "%a %b %d %Y";

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(ISO))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(&raw, ISO)
            .or_else(|_| NaiveDate::parse_from_str(&raw, LEGACY))
            .map_err(|_| de::Error::custom(format!("unrecognised usage date '{raw}'")))
    }
}
