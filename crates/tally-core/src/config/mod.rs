//! Configuration types for Tally.
//!
//! Only the audit pipeline's settings live here; transport and upstream
//! database configuration belong to their own layers.

pub mod audit;

pub use audit::AuditConfig;
