use std::path::{Path, PathBuf};

/// File names produced by one simulation job and consumed by the analysis of that run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunFiles {
    pub job: usize,
    pub l_count: usize,
    pub steps: u64,
}

impl RunFiles {
    pub fn new(job: usize, l_count: usize, steps: u64) -> Self {
        Self {
            job,
            l_count,
            steps,
        }
    }

    fn stem(&self) -> String {
        format!("{}_lconc_{}_steps_{}", self.job, self.l_count, self.steps)
    }

    pub fn state_csv(&self, dir: &Path) -> PathBuf {
        dir.join(format!("state_{}.csv", self.stem()))
    }

    pub fn topology_pdb(&self, dir: &Path) -> PathBuf {
        dir.join(format!("topology_{}.pdb", self.stem()))
    }

    pub fn trajectory_dcd(&self, dir: &Path) -> PathBuf {
        dir.join(format!("traj_{}.dcd", self.stem()))
    }
}
