//! Shrake-Rupley solvent accessible surface area.
//!
//! Test points are spread over each atom's probe-inflated sphere (Fibonacci lattice); the
//! accessible fraction of points times the sphere area gives the atom's SASA. Solvent atoms
//! never occlude, so the area is that of the solute in vacuum.

use super::selection::SpeciesSelection;
use crate::core::models::frame::Frame;
use crate::core::models::residue::{Enantiomer, ResidueKind};
use crate::core::models::topology::Topology;
use crate::core::utils::neighbors::NeighborIndex;
use crate::engine::config::SasaParameters;
use nalgebra::{Point3, Vector3};
use std::f64::consts::PI;

#[derive(Debug, Clone)]
pub struct ShrakeRupley {
    probe_radius: f64,
    sphere: Vec<Vector3<f64>>,
}

impl ShrakeRupley {
    pub fn new(parameters: &SasaParameters) -> Self {
        Self {
            probe_radius: parameters.probe_radius,
            sphere: fibonacci_sphere(parameters.sphere_points.max(1)),
        }
    }

    pub fn probe_radius(&self) -> f64 {
        self.probe_radius
    }

    /// SASA of `atom` against the `neighbors` that may occlude it.
    fn atom_area(
        &self,
        positions: &[Point3<f64>],
        radii: &[f64],
        atom: usize,
        neighbors: &[usize],
    ) -> f64 {
        let radius = radii[atom] + self.probe_radius;
        let center = positions[atom];
        let accessible = self
            .sphere
            .iter()
            .filter(|unit| {
                let point = center + *unit * radius;
                neighbors.iter().all(|&j| {
                    let reach = radii[j] + self.probe_radius;
                    (positions[j] - point).norm_squared() >= reach * reach
                })
            })
            .count();
        4.0 * PI * radius * radius * accessible as f64 / self.sphere.len() as f64
    }
}

fn fibonacci_sphere(count: usize) -> Vec<Vector3<f64>> {
    let golden_ratio = (1.0 + 5.0_f64.sqrt()) / 2.0;
    let angle_increment = 2.0 * PI / golden_ratio;
    (0..count)
        .map(|i| {
            let t = (i as f64 + 0.5) / count as f64;
            let inclination = (1.0 - 2.0 * t).acos();
            let azimuth = angle_increment * i as f64;
            Vector3::new(
                inclination.sin() * azimuth.cos(),
                inclination.sin() * azimuth.sin(),
                inclination.cos(),
            )
        })
        .collect()
}

/// Per-residue SASA (Å²) of one sugar species.
#[derive(Debug, Clone)]
pub struct SasaExtractor {
    selection: SpeciesSelection,
    occluders: Vec<usize>,
    radii: Vec<f64>,
    max_radius: f64,
    calculator: ShrakeRupley,
}

impl SasaExtractor {
    pub fn new(topology: &Topology, enantiomer: Enantiomer, parameters: &SasaParameters) -> Option<Self> {
        let selection = SpeciesSelection::new(topology, enantiomer)?;
        let radii: Vec<f64> = topology
            .atoms()
            .iter()
            .map(|atom| atom.element.vdw_radius())
            .collect();
        let max_radius = radii.iter().copied().fold(0.0, f64::max);
        Some(Self {
            selection,
            occluders: topology.atom_indices_where(|kind| kind != ResidueKind::Water),
            radii,
            max_radius,
            calculator: ShrakeRupley::new(parameters),
        })
    }

    pub fn extract(&self, frame: &Frame) -> Vec<f64> {
        let probe = self.calculator.probe_radius();
        let occluders = NeighborIndex::new(&frame.positions, self.occluders.iter().copied());

        self.selection
            .residues()
            .iter()
            .map(|atoms| {
                atoms
                    .clone()
                    .map(|atom| {
                        let reach = self.radii[atom] + self.max_radius + 2.0 * probe;
                        let neighbors: Vec<usize> = occluders
                            .within(&frame.positions[atom], reach)
                            .into_iter()
                            .filter(|&j| j != atom)
                            .collect();
                        self.calculator
                            .atom_area(&frame.positions, &self.radii, atom, &neighbors)
                    })
                    .sum()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Element;

    fn single_carbon(extra: Option<(&str, Point3<f64>)>) -> (Topology, Frame) {
        let mut topology = Topology::new();
        topology.add_residue("DRI", [("C1", Element::C)]);
        let mut positions = vec![Point3::origin()];
        if let Some((residue, position)) = extra {
            topology.add_residue(residue, [("O1", Element::O)]);
            positions.push(position);
        }
        (topology, Frame::new(positions, None))
    }

    #[test]
    fn isolated_atom_exposes_its_full_sphere() {
        let (topology, frame) = single_carbon(None);
        let extractor = SasaExtractor::new(&topology, Enantiomer::D, &SasaParameters::default()).unwrap();
        let area = extractor.extract(&frame);
        let expected = 4.0 * PI * (1.70_f64 + 1.4).powi(2);
        assert_eq!(area.len(), 1);
        assert!((area[0] - expected).abs() < 1e-9);
    }

    #[test]
    fn neighboring_solute_buries_part_of_the_surface() {
        let (topology, frame) = single_carbon(Some(("GUA", Point3::new(2.0, 0.0, 0.0))));
        let extractor = SasaExtractor::new(&topology, Enantiomer::D, &SasaParameters::default()).unwrap();
        let full = 4.0 * PI * (1.70_f64 + 1.4).powi(2);
        let area = extractor.extract(&frame)[0];
        assert!(area < full * 0.9);
        assert!(area > 0.0);
    }

    #[test]
    fn solvent_does_not_occlude() {
        let (topology, frame) = single_carbon(Some(("HOH", Point3::new(2.0, 0.0, 0.0))));
        let extractor = SasaExtractor::new(&topology, Enantiomer::D, &SasaParameters::default()).unwrap();
        let full = 4.0 * PI * (1.70_f64 + 1.4).powi(2);
        assert!((extractor.extract(&frame)[0] - full).abs() < 1e-9);
    }

    #[test]
    fn sphere_points_lie_on_the_unit_sphere() {
        for point in fibonacci_sphere(50) {
            assert!((point.norm() - 1.0).abs() < 1e-12);
        }
    }
}
