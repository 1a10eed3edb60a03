use super::selection::SpeciesSelection;
use crate::core::models::frame::Frame;
use crate::core::models::residue::Enantiomer;
use crate::core::models::topology::Topology;
use crate::core::utils::geometry::principal_axis;
use nalgebra::{Matrix3, SymmetricEigen};

/// Nematic order parameter of one sugar species.
///
/// Each residue contributes its director (principal axis of the gyration tensor); the order
/// parameter is the largest eigenvalue of `Q = <3/2 u u^T - 1/2 I>`.
#[derive(Debug, Clone)]
pub struct NematicOrder {
    selection: SpeciesSelection,
}

impl NematicOrder {
    pub fn new(topology: &Topology, enantiomer: Enantiomer) -> Option<Self> {
        SpeciesSelection::new(topology, enantiomer).map(|selection| Self { selection })
    }

    /// `None` when no residue has a defined director (single-atom residues).
    pub fn extract(&self, frame: &Frame) -> Option<f64> {
        let directors: Vec<_> = (0..self.selection.len())
            .filter_map(|residue| principal_axis(&self.selection.residue_positions(frame, residue)))
            .collect();
        if directors.is_empty() {
            return None;
        }

        let q = directors.iter().fold(Matrix3::zeros(), |acc, u| {
            acc + (u.into_inner() * u.transpose()) * 1.5 - Matrix3::identity() * 0.5
        }) / directors.len() as f64;

        SymmetricEigen::new(q).eigenvalues.iter().copied().max_by(f64::total_cmp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Element;
    use nalgebra::Point3;

    fn rods(directions: &[[f64; 3]]) -> (Topology, Frame) {
        let mut topology = Topology::new();
        let mut positions = Vec::new();
        for (i, d) in directions.iter().enumerate() {
            topology.add_residue("LRI", [("C1", Element::C), ("C2", Element::C)]);
            let base = Point3::new(i as f64 * 5.0, 0.0, 0.0);
            positions.push(base);
            positions.push(base + nalgebra::Vector3::new(d[0], d[1], d[2]));
        }
        (topology, Frame::new(positions, None))
    }

    #[test]
    fn aligned_rods_are_perfectly_ordered() {
        let (topology, frame) = rods(&[[0.0, 0.0, 1.0], [0.0, 0.0, -2.0], [0.0, 0.0, 1.5]]);
        let s = NematicOrder::new(&topology, Enantiomer::L).unwrap().extract(&frame).unwrap();
        assert!((s - 1.0).abs() < 1e-9);
    }

    #[test]
    fn orthogonal_rods_are_partially_ordered() {
        let (topology, frame) = rods(&[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
        let s = NematicOrder::new(&topology, Enantiomer::L).unwrap().extract(&frame).unwrap();
        assert!(s.abs() < 1e-9);
    }

    #[test]
    fn absent_species_is_none() {
        let (topology, _) = rods(&[[1.0, 0.0, 0.0]]);
        assert!(NematicOrder::new(&topology, Enantiomer::D).is_none());
    }
}
