//! # Analysis Module
//!
//! Turns simulation trajectories into statistics: per-frame observables are extracted run by
//! run, folded into per-run series and reduced across runs into tables.
//!
//! - **Input** ([`trajectory`]) - Streams the topology and frames of one run
//! - **Extractors** ([`heights`], [`hbonds`], [`order`], [`sasa`]) - Per-frame observables,
//!   `None` for species that are not present
//! - **Contacts** ([`contacts`]) - Hydrogen-bond classification, the directed tally and
//!   contact matrices
//! - **Reduction** ([`run`], [`aggregate`], [`stats`]) - Per-run accumulation, pooling,
//!   run-aligned means, density estimates
//! - **Reports** ([`report`]) - CSV tables

pub mod aggregate;
pub mod contacts;
pub mod error;
pub mod hbonds;
pub mod heights;
pub mod order;
pub mod report;
pub mod run;
pub mod sasa;
pub mod selection;
pub mod stats;
pub mod trajectory;
