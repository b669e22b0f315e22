//! Quality-assurance analytics for recorded sales calls.
//!
//! The crate turns synced call, tag-assessment and raw-signal records into
//! weighted quality scores, audits how faithfully raw signals were aggregated
//! into tag evidence, and checks whether the resulting scores track business
//! outcomes.

pub mod analytics;
pub mod config;
pub mod error;
pub mod telemetry;
