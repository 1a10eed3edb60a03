//! # Core Module
//!
//! Stateless building blocks shared by the engine, analysis and workflow layers.
//!
//! - **Molecular Representation** ([`models`]) - Templates, topologies, assembled systems and
//!   trajectory frames
//! - **File I/O** ([`io`]) - SDF, PDB and DCD readers and writers
//! - **Geometry** ([`utils`]) - Rigid transforms, principal axes and neighbor queries

pub mod io;
pub mod models;
pub mod utils;
