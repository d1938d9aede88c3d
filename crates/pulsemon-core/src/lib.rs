//! PulseMon Core Library
//!
//! Core library for PulseMon - 12-lead ECG acquisition and reporting.
//! Provides the serial line protocol, lead derivation, waveform buffers,
//! JSON-backed stores and CSV/HTML output.

pub mod buffer;
pub mod demo;
pub mod error;
pub mod export;
pub mod frame;
pub mod metrics;
pub mod report;
pub mod serial;
pub mod store;
pub mod types;

pub use buffer::{LeadBuffer, LeadBufferSet};
pub use demo::DemoSignal;
pub use error::{Error, Result};
pub use frame::{LeadFrame, RawFrame};
pub use metrics::IntervalMetrics;
pub use report::{PatientDetails, ReportInput};
pub use serial::{SampleSource, SerialEcgReader};
pub use store::live::{LiveLeadFile, LiveSnapshot};
pub use store::settings::{Settings, SettingsManager};
pub use store::users::UserStore;
pub use types::{AcquisitionStats, Lead, TestMode};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
