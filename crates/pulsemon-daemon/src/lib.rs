//! PulseMon Daemon
//!
//! Acquisition daemon for PulseMon - drives the serial ECG reader and
//! publishes the live Lead II window for the dashboard.

pub mod config;
pub mod session;

pub use config::Config;
pub use session::{AcquisitionSession, TickOutcome};
