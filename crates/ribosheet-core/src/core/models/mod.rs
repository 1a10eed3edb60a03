//! # Core Models Module
//!
//! Data structures shared by every layer of the library: atoms, residues, the concatenated
//! topology of an assembled system, the immutable molecule templates it is built from, and
//! the segment manifest recording which build step produced which atoms.
//!
//! ## Key Components
//!
//! - [`atom`] - Elements, atom roles and the per-atom record of a topology
//! - [`residue`] - Residue kinds (sugar enantiomers, nucleobases, water) and residue records
//! - [`topology`] - Bonds and the append-only [`topology::Topology`]
//! - [`template`] - Molecule templates and the [`template::TemplateLibrary`] that owns them
//! - [`system`] - The [`system::AssembledSystem`] with its segment manifest
//! - [`frame`] - Periodic boxes and trajectory frames
//! - [`ids`] - Typed keys for library lookups
//!
//! ```ignore
//! use ribosheet::core::models::system::{AssembledSystem, Segment};
//!
//! let mut system = AssembledSystem::new();
//! let range = system.add_instance(&template, template.conformation().to_vec())?;
//! system.record_segment(Segment::SugarLayer, range)?;
//! ```

pub mod atom;
pub mod frame;
pub mod ids;
pub mod residue;
pub mod system;
pub mod template;
pub mod topology;
