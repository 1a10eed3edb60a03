use crate::core::models::atom::Element;
use crate::core::models::frame::{Frame, PeriodicBox};
use crate::core::models::residue::ResidueKind;
use crate::core::models::topology::Topology;
use crate::core::utils::neighbors::NeighborIndex;
use crate::engine::config::HydrogenBondCriteria;
use nalgebra::{Point3, Vector3};
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A detected donor-hydrogen-acceptor triple (global atom indices).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HydrogenBond {
    pub donor: usize,
    pub hydrogen: usize,
    pub acceptor: usize,
}

/// Finds the hydrogen bonds present in a single frame.
pub trait HydrogenBondDetector {
    fn detect(&self, frame: &Frame) -> Vec<HydrogenBond>;
}

/// Baker-Hubbard geometric criterion: H···A distance below a cutoff and D-H···A angle above
/// a cutoff.
///
/// Donors are N/O atoms covalently bonded to a hydrogen, acceptors are N/O atoms. Water is
/// excluded from both sets. Donor and acceptor sets are resolved once from the topology.
#[derive(Debug, Clone)]
pub struct BakerHubbard {
    distance_cutoff: f64,
    cos_angle_cutoff: f64,
    donors: Vec<(usize, usize)>,
    acceptors: Vec<usize>,
}

impl BakerHubbard {
    pub fn new(topology: &Topology, criteria: &HydrogenBondCriteria) -> Self {
        let neighbors = topology.bonded_neighbors();
        let candidate = |index: usize| {
            let atom = &topology.atoms()[index];
            matches!(atom.element, Element::N | Element::O)
                && topology
                    .residue_of(index)
                    .is_some_and(|r| r.kind != ResidueKind::Water)
        };

        let acceptors: Vec<usize> = (0..topology.atom_count()).filter(|&i| candidate(i)).collect();
        let donors: Vec<(usize, usize)> = acceptors
            .iter()
            .flat_map(|&heavy| {
                neighbors[heavy]
                    .iter()
                    .filter(|&&h| topology.atoms()[h].element == Element::H)
                    .map(move |&h| (heavy, h))
            })
            .collect();

        debug!(
            donors = donors.len(),
            acceptors = acceptors.len(),
            "Resolved hydrogen-bond donor and acceptor sets."
        );

        Self {
            distance_cutoff: criteria.distance_cutoff,
            cos_angle_cutoff: criteria.angle_cutoff_degrees.to_radians().cos(),
            donors,
            acceptors,
        }
    }

    pub fn donor_count(&self) -> usize {
        self.donors.len()
    }

    pub fn acceptor_count(&self) -> usize {
        self.acceptors.len()
    }

    fn bonds_from(
        &self,
        frame: &Frame,
        wrapped: &[Point3<f64>],
        acceptors: &NeighborIndex,
        (donor, hydrogen): (usize, usize),
    ) -> Vec<HydrogenBond> {
        let mut candidates: Vec<usize> = image_shifts(&wrapped[hydrogen], frame.periodic_box.as_ref(), self.distance_cutoff)
            .into_iter()
            .flat_map(|shift| acceptors.within(&(wrapped[hydrogen] + shift), self.distance_cutoff))
            .collect();
        candidates.sort_unstable();
        candidates.dedup();

        candidates
            .into_iter()
            .filter(|&acceptor| acceptor != donor)
            .filter(|&acceptor| {
                let to_acceptor = frame.displacement(hydrogen, acceptor);
                let to_donor = frame.displacement(hydrogen, donor);
                let (ha, hd) = (to_acceptor.norm(), to_donor.norm());
                if ha >= self.distance_cutoff || ha == 0.0 || hd == 0.0 {
                    return false;
                }
                to_acceptor.dot(&to_donor) / (ha * hd) < self.cos_angle_cutoff
            })
            .map(|acceptor| HydrogenBond {
                donor,
                hydrogen,
                acceptor,
            })
            .collect()
    }
}

impl HydrogenBondDetector for BakerHubbard {
    fn detect(&self, frame: &Frame) -> Vec<HydrogenBond> {
        if self.donors.is_empty() || self.acceptors.is_empty() {
            return Vec::new();
        }
        let wrapped = wrap_positions(&frame.positions, frame.periodic_box.as_ref());
        let acceptors = NeighborIndex::new(&wrapped, self.acceptors.iter().copied());

        #[cfg(not(feature = "parallel"))]
        let iterator = self.donors.iter();

        #[cfg(feature = "parallel")]
        let iterator = self.donors.par_iter();

        let mut bonds: Vec<HydrogenBond> = iterator
            .map(|&pair| self.bonds_from(frame, &wrapped, &acceptors, pair))
            .flatten()
            .collect();
        bonds.sort_unstable();
        bonds
    }
}

fn wrap_positions(positions: &[Point3<f64>], periodic_box: Option<&PeriodicBox>) -> Vec<Point3<f64>> {
    match periodic_box {
        Some(cell) if cell.is_valid() => {
            let lengths = cell.lengths();
            positions
                .iter()
                .map(|p| {
                    Point3::from(Vector3::from_fn(|i, _| {
                        p[i] - lengths[i] * (p[i] / lengths[i]).floor()
                    }))
                })
                .collect()
        }
        _ => positions.to_vec(),
    }
}

/// Translations under which a wrapped point may see neighbors across a box face.
fn image_shifts(point: &Point3<f64>, periodic_box: Option<&PeriodicBox>, reach: f64) -> Vec<Vector3<f64>> {
    let Some(cell) = periodic_box.filter(|cell| cell.is_valid()) else {
        return vec![Vector3::zeros()];
    };
    let lengths = cell.lengths();
    let per_axis: Vec<Vec<f64>> = (0..3)
        .map(|i| {
            let mut offsets = vec![0.0];
            if point[i] < reach {
                offsets.push(lengths[i]);
            }
            if point[i] > lengths[i] - reach {
                offsets.push(-lengths[i]);
            }
            offsets
        })
        .collect();

    let mut shifts = Vec::new();
    for &x in &per_axis[0] {
        for &y in &per_axis[1] {
            for &z in &per_axis[2] {
                shifts.push(Vector3::new(x, y, z));
            }
        }
    }
    shifts
}
