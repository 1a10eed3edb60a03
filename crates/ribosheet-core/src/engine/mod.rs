//! # Engine Module
//!
//! The stateful half of the library: turns loaded templates into an assembled monolayer and
//! drives a physics backend over it.
//!
//! - **Configuration** ([`config`]) - Validated simulation and analysis settings with builders
//! - **Assembly** ([`assembly`], [`presets`], [`solvation`]) - Regular and randomized sheet
//!   placement, the fixed monolayer layout and water fill
//! - **Restraints** ([`restraints`]) - Harmonic position restraints for the base wall
//! - **Simulation** ([`simulation`], [`reference`]) - The backend seam, reporter-driven
//!   stepping and a restraint-only Langevin backend
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Error Handling** ([`error`]) - Assembly, restraint and simulation errors

pub mod assembly;
pub mod config;
pub mod error;
pub mod presets;
pub mod progress;
pub mod reference;
pub mod restraints;
pub mod simulation;
pub mod solvation;
pub mod utils;
