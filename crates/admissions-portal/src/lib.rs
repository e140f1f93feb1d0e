//! Student admissions portal domain library.
//!
//! The crate is organized around the admission application lifecycle: a
//! four-step form wizard, the submission orchestration behind it, and the
//! administrator review console. Persistence, identity, and blob storage are
//! reached through traits so the HTTP service can supply real adapters while
//! tests run entirely in memory.

pub mod admissions;
pub mod config;
pub mod error;
pub mod telemetry;
