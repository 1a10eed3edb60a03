use crate::core::models::frame::Frame;
use crate::core::models::residue::{Enantiomer, ResidueKind};
use crate::core::models::topology::Topology;
use nalgebra::Point3;
use std::ops::Range;
use tracing::info;

/// Atom ranges of every sugar residue of one enantiomer, resolved once per topology.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesSelection {
    pub enantiomer: Enantiomer,
    residues: Vec<Range<usize>>,
}

impl SpeciesSelection {
    /// `None` when the topology holds no residue of that enantiomer.
    pub fn new(topology: &Topology, enantiomer: Enantiomer) -> Option<Self> {
        let kind = ResidueKind::Sugar(enantiomer);
        if !topology.contains_kind(kind) {
            info!(species = %kind, "Species not present in topology; its observables are skipped.");
            return None;
        }
        Some(Self {
            enantiomer,
            residues: topology
                .residues_of_kind(kind)
                .map(|r| r.atoms.clone())
                .collect(),
        })
    }

    pub fn residues(&self) -> &[Range<usize>] {
        &self.residues
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    /// Residue coordinates made whole across periodic boundaries, relative to the first atom.
    pub fn residue_positions(&self, frame: &Frame, residue: usize) -> Vec<Point3<f64>> {
        let atoms = self.residues[residue].clone();
        let anchor = atoms.start;
        atoms
            .map(|i| frame.positions[anchor] + frame.displacement(anchor, i))
            .collect()
    }
}
