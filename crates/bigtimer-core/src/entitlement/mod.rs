//! Freemium entitlement: the persisted account record, the daily usage
//! window and the timer-start authorization decision.

mod clock;
mod gate;
mod plan;
mod record;

pub use clock::{Clock, ManualClock, SystemClock};
pub use gate::{AccountSummary, Decision, DenyReason, EntitlementGate, UsageMeter};
pub use plan::{BillingMode, Plan, Theme, Tier};
pub use record::{generate_user_id, EntitlementRecord};
