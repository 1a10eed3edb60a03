use super::error::AnalysisError;
use crate::core::io::dcd::DcdReader;
use crate::core::io::naming::RunFiles;
use crate::core::io::pdb::PdbFile;
use crate::core::io::traits::StructureFile;
use crate::core::models::frame::{Frame, PeriodicBox};
use crate::core::models::topology::Topology;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The topology and streaming frames of one simulation run.
pub struct RunTrajectory {
    run: usize,
    topology: Topology,
    fallback_box: Option<PeriodicBox>,
    path: PathBuf,
    reader: DcdReader<BufReader<File>>,
}

impl RunTrajectory {
    /// Opens the topology PDB and trajectory DCD named after `files` in `dir`.
    pub fn open(dir: &Path, files: RunFiles) -> Result<Self, AnalysisError> {
        let topology_path = files.topology_pdb(dir);
        let structure =
            PdbFile::read_from_path(&topology_path).map_err(|source| AnalysisError::Topology {
                path: topology_path.clone(),
                source,
            })?;

        let path = files.trajectory_dcd(dir);
        let reader = DcdReader::open(&path).map_err(|source| AnalysisError::Trajectory {
            path: path.clone(),
            source,
        })?;

        let trajectory_atoms = reader.header().atom_count as usize;
        if trajectory_atoms != structure.topology.atom_count() {
            return Err(AnalysisError::AtomCountMismatch {
                run: files.job,
                topology: structure.topology.atom_count(),
                trajectory: trajectory_atoms,
            });
        }

        debug!(
            run = files.job,
            atoms = trajectory_atoms,
            frames = reader.header().frame_count,
            "Opened run trajectory."
        );

        Ok(Self {
            run: files.job,
            topology: structure.topology,
            fallback_box: structure.periodic_box,
            path,
            reader,
        })
    }

    pub fn run(&self) -> usize {
        self.run
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn declared_frames(&self) -> usize {
        self.reader.header().frame_count as usize
    }

    /// Next chunk of at most `max_frames` frames; `None` once the trajectory is exhausted.
    ///
    /// Frames without a unit cell inherit the box recorded in the topology file.
    pub fn next_chunk(&mut self, max_frames: usize) -> Result<Option<Vec<Frame>>, AnalysisError> {
        let mut frames = self
            .reader
            .read_chunk(max_frames.max(1))
            .map_err(|source| AnalysisError::Trajectory {
                path: self.path.clone(),
                source,
            })?;
        if frames.is_empty() {
            return Ok(None);
        }
        for frame in frames.iter_mut().filter(|f| f.periodic_box.is_none()) {
            frame.periodic_box = self.fallback_box;
        }
        Ok(Some(frames))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::dcd::DcdWriter;
    use crate::core::io::pdb::PdbStructure;
    use crate::core::models::atom::Element;
    use nalgebra::Point3;
    use tempfile::tempdir;

    fn write_run(dir: &Path, files: RunFiles, trajectory_atoms: usize, frames: usize) {
        let mut topology = Topology::new();
        topology.add_residue("DRI", [("C1", Element::C), ("O1", Element::O)]);
        let structure = PdbStructure {
            topology,
            positions: vec![Point3::origin(), Point3::new(1.4, 0.0, 0.0)],
            periodic_box: Some(PeriodicBox::new(20.0, 20.0, 20.0)),
        };
        PdbFile::write_to_path(&structure, files.topology_pdb(dir)).unwrap();

        let mut writer = DcdWriter::create(files.trajectory_dcd(dir), trajectory_atoms, 1, 0.004).unwrap();
        for i in 0..frames {
            let positions = vec![Point3::new(i as f64, 0.0, 0.0); trajectory_atoms];
            writer.write_frame(&positions, None).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn streams_frames_in_chunks_and_inherits_the_box() {
        let dir = tempdir().unwrap();
        let files = RunFiles::new(0, 1, 10);
        write_run(dir.path(), files, 2, 5);

        let mut run = RunTrajectory::open(dir.path(), files).unwrap();
        assert_eq!(run.declared_frames(), 5);
        let mut sizes = Vec::new();
        while let Some(chunk) = run.next_chunk(2).unwrap() {
            assert!(chunk.iter().all(|f| f.periodic_box.is_some()));
            sizes.push(chunk.len());
        }
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[test]
    fn mismatched_atom_counts_are_rejected() {
        let dir = tempdir().unwrap();
        let files = RunFiles::new(3, 1, 10);
        write_run(dir.path(), files, 3, 1);
        assert!(matches!(
            RunTrajectory::open(dir.path(), files),
            Err(AnalysisError::AtomCountMismatch { run: 3, .. })
        ));
    }

    #[test]
    fn missing_files_report_the_path() {
        let dir = tempdir().unwrap();
        let err = RunTrajectory::open(dir.path(), RunFiles::new(0, 0, 1)).err().unwrap();
        assert!(matches!(err, AnalysisError::Topology { .. }));
    }
}
