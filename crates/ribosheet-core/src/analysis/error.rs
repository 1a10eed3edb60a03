use crate::core::io::dcd::DcdError;
use crate::core::io::pdb::PdbError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Failed to read topology {path}: {source}")]
    Topology {
        path: PathBuf,
        #[source]
        source: PdbError,
    },

    #[error("Failed to read trajectory {path}: {source}")]
    Trajectory {
        path: PathBuf,
        #[source]
        source: DcdError,
    },

    #[error("Run {run}: topology has {topology} atoms but trajectory frames have {trajectory}")]
    AtomCountMismatch {
        run: usize,
        topology: usize,
        trajectory: usize,
    },

    #[error("No runs to analyze")]
    NoRuns,

    #[error("Failed to write report: {0}")]
    Report(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
