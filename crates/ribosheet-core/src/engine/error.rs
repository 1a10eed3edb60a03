use crate::core::io::dcd::DcdError;
use crate::core::io::pdb::PdbError;
use crate::core::models::system::SystemError;
use crate::core::models::template::TemplateError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("Target count {target} is outside 0..={sites} available sites")]
    TargetOutOfRange { target: usize, sites: usize },

    #[error("{templates} templates were given with {positions} position lists")]
    TemplateCountMismatch { templates: usize, positions: usize },

    #[error("Position list {index} has {found} points but its template has {expected} atoms")]
    ConformationMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("At least {required} templates are required, got {found}")]
    NotEnoughTemplates { required: usize, found: usize },

    #[error("Sheet spacing must be a finite positive distance, got {0}")]
    InvalidSpacing(f64),

    #[error(transparent)]
    System(#[from] SystemError),

    #[error(transparent)]
    Template(#[from] TemplateError),
}

#[derive(Debug, Error, PartialEq)]
pub enum RestraintError {
    #[error("Range {start}..{end} exceeds the {atom_count} available positions")]
    RangeOutOfBounds {
        start: usize,
        end: usize,
        atom_count: usize,
    },

    #[error("Spring constant must be finite and non-negative, got {0}")]
    InvalidSpringConstant(f64),

    #[error("Anchor position of atom {0} is not finite")]
    NonFiniteAnchor(usize),
}

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Invalid simulation input: {0}")]
    InvalidInput(String),

    #[error("Engine failure at step {step}: {reason}")]
    Engine { step: u64, reason: String },

    #[error("Failed to assemble the system: {source}")]
    Assembly {
        #[from]
        source: AssemblyError,
    },

    #[error("Failed to wire restraints: {source}")]
    Restraint {
        #[from]
        source: RestraintError,
    },

    #[error("Failed to write trajectory: {source}")]
    Trajectory {
        #[from]
        source: DcdError,
    },

    #[error("Failed to write topology: {source}")]
    Topology {
        #[from]
        source: PdbError,
    },

    #[error("Failed to write state report: {source}")]
    StateReport {
        #[from]
        source: csv::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
