use crate::analysis::error::AnalysisError;
use crate::core::io::sdf::SdfError;
use crate::core::models::ids::TemplateId;
use crate::core::models::system::SystemError;
use crate::engine::config::ConfigError;
use crate::engine::error::{AssemblyError, RestraintError, SimulationError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to load {residue} template from {path}: {source}")]
    TemplateLoad {
        residue: &'static str,
        path: PathBuf,
        #[source]
        source: SdfError,
    },

    #[error("Template {0:?} is not in the library")]
    MissingTemplate(TemplateId),

    #[error("Failed to assemble the sheet: {0}")]
    Assembly(#[from] AssemblyError),

    #[error("Invalid system layout: {0}")]
    System(#[from] SystemError),

    #[error("Failed to build restraints: {0}")]
    Restraint(#[from] RestraintError),

    #[error("Simulation failed: {0}")]
    Simulation(#[from] SimulationError),

    #[error("Analysis failed: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
