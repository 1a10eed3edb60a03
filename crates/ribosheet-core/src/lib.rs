//! # Ribosheet Core Library
//!
//! Builds chiral sugar monolayers on a nucleobase sheet, drives restrained simulations of them
//! and turns the resulting trajectories into hydrogen-bond and structural statistics.
//!
//! ## Layers
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Topology`, `Frame`, `PeriodicBox`),
//!   geometry helpers and the structure/trajectory file formats (SDF, PDB, DCD).
//!
//! - **[`engine`]: The Logic Core.** Sheet assembly and sugar sampling, solvation, position
//!   restraints, configuration, progress reporting and the simulation seam with its reference
//!   Langevin backend.
//!
//! - **[`analysis`]: Trajectory Observables.** Hydrogen-bond detection and classification, base
//!   heights, nematic order, solvent-accessible surface, cross-run aggregation and CSV reports.
//!
//! - **[`workflows`]: The Public API.** One call per procedure: run a simulation job, or analyze
//!   a set of finished runs.

pub mod analysis;
pub mod core;
pub mod engine;
pub mod workflows;
