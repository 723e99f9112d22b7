//! Patient vitals dashboard.
//!
//! Readings flow from a capture adapter into the per-vital stores; trends,
//! critical flags and chart series are derived on read, and a hosted model
//! turns the history into caregiver-facing insights.

pub mod ai;
pub mod capture;
pub mod care;
pub mod chart;
pub mod config;
pub mod dashboard;
pub mod patient;
pub mod vitals;


pub use capture::{CaptureAdapter, CaptureError, NewVitalData};
pub use config::Config;
pub use dashboard::{Dashboard, VitalCard};
pub use patient::Patient;
