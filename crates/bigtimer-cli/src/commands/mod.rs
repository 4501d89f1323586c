pub mod account;
pub mod config;
pub mod format;
pub mod stopwatch;
pub mod timer;

mod session;
