//! # Workflows Module
//!
//! End-to-end procedures built from the lower layers, one entry point per command.
//!
//! - **Simulation** ([`simulate`]) - Template loading, system assembly and restraint wiring,
//!   then minimization and reporter-driven stepping of one job with its output files
//! - **Analysis** ([`analyze`]) - Per-run observable extraction over every run, reduction and
//!   report writing
//! - **Error Handling** ([`error`]) - The workflow-level error wrapping every layer below

pub mod analyze;
pub mod error;
pub mod simulate;
