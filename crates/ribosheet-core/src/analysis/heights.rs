use super::selection::SpeciesSelection;
use crate::core::models::frame::Frame;
use crate::core::models::residue::{Enantiomer, ResidueKind};
use crate::core::models::topology::Topology;
use crate::core::utils::geometry::centroid;
use tracing::info;

/// Height of each sugar residue above the base sheet: the minimum distance from the residue
/// centroid to any base atom.
#[derive(Debug, Clone)]
pub struct HeightExtractor {
    selection: SpeciesSelection,
    base_atoms: Vec<usize>,
}

impl HeightExtractor {
    /// `None` when the species or the base sheet is absent.
    pub fn new(topology: &Topology, enantiomer: Enantiomer) -> Option<Self> {
        let selection = SpeciesSelection::new(topology, enantiomer)?;
        let base_atoms = topology.atom_indices_where(|kind| kind.is_base());
        if base_atoms.is_empty() {
            info!(species = %ResidueKind::Sugar(enantiomer), "No base sheet present; heights are skipped.");
            return None;
        }
        Some(Self {
            selection,
            base_atoms,
        })
    }

    /// One height per residue, in topology order.
    pub fn extract(&self, frame: &Frame) -> Vec<f64> {
        (0..self.selection.len())
            .filter_map(|residue| {
                let center = centroid(&self.selection.residue_positions(frame, residue))?;
                self.base_atoms
                    .iter()
                    .map(|&atom| {
                        let position = &frame.positions[atom];
                        match &frame.periodic_box {
                            Some(cell) => cell.minimum_image(&center, position).norm(),
                            None => (position - center).norm(),
                        }
                    })
                    .min_by(f64::total_cmp)
            })
            .collect()
    }
}
