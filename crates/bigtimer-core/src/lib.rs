//! # Big Timer Core Library
//!
//! Core logic for Big Timer, a large-digit countdown and stopwatch with a
//! freemium usage gate. Every operation is available through the `bigtimer`
//! CLI; any other front end is a thin presenter over the same library.
//!
//! ## Architecture
//!
//! - **Timer Engine**: countdown and stopwatch state machines driven by a
//!   [`TickScheduler`]. Commands return [`Event`]s and due ticks are
//!   collected with `pump()`.
//! - **Entitlement**: the persisted account record, the daily free-tier
//!   window and the start authorization decision.
//! - **Checkout**: building a hosted checkout redirect and reading the
//!   return location back.
//! - **Storage**: key-value persistence (SQLite or in-memory) and TOML
//!   configuration.
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: countdown and stopwatch state machines
//! - [`EntitlementGate`]: free, trial and premium rules
//! - [`BigTimer`]: engine, gate and presenter wired into one session
//! - [`Config`]: application configuration management

pub mod checkout;
pub mod entitlement;
pub mod error;
pub mod events;
pub mod session;
pub mod storage;
pub mod timer;

pub use checkout::{strip_return_params, CheckoutProvider, CheckoutReturn, CheckoutSession, StubCheckout};
pub use entitlement::{
    AccountSummary, Clock, Decision, DenyReason, EntitlementGate, EntitlementRecord, ManualClock,
    Plan, SystemClock, Theme, Tier,
};
pub use error::{CheckoutError, ConfigError, CoreError, StorageError};
pub use events::{dispatch, Event, EventLog, Presenter};
pub use session::{BigTimer, StartOutcome, Toggled};
pub use storage::{Config, Database, KeyValueStore, MemoryStore};
pub use timer::{
    format_duration, Lap, ManualScheduler, TickScheduler, TimerEngine, TimerMode, WallClockScheduler,
};
