//! Provides input/output for the structure and trajectory formats used by the pipeline.
//!
//! SDF files supply molecule templates, PDB files carry the topology of an assembled system
//! together with its periodic box, and DCD files stream trajectory frames. [`naming`] fixes
//! the per-job file names shared by simulation and analysis.

pub mod dcd;
pub mod naming;
pub mod pdb;
pub mod sdf;
pub mod traits;
