//! The change-detection and adaptive-scheduling engine.
//!
//! - `reconcile`: diff fresh observations against known state
//! - `catalog`: sequential full-catalog pagination pass
//! - `probe`: direct detail probes of priority items
//! - `schedule`: polling mode/interval selection
//! - `session`: top-level loop and failure policy

pub mod catalog;
pub mod probe;
pub mod reconcile;
pub mod schedule;
pub mod session;

pub use catalog::run_catalog_pass;
pub use probe::run_probe_pass;
pub use reconcile::{PassOutcome, Reconciler};
pub use schedule::{Mode, Schedule};
pub use session::{Monitor, RunState};
