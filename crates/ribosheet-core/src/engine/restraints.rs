use super::error::RestraintError;
use nalgebra::{Point3, Vector3};
use std::collections::BTreeSet;
use std::ops::Range;
use tracing::debug;

/// Harmonic positional restraints sharing one spring constant.
///
/// Each restrained atom appears once, anchored at the position it had when the set was
/// built. The energy of an atom is `k * |x - x0|^2`.
#[derive(Debug, Clone, PartialEq)]
pub struct RestraintSet {
    spring_constant: f64,
    anchors: Vec<(usize, Point3<f64>)>,
}

impl RestraintSet {
    pub fn empty() -> Self {
        Self {
            spring_constant: 0.0,
            anchors: Vec::new(),
        }
    }

    pub fn spring_constant(&self) -> f64 {
        self.spring_constant
    }

    /// `(atom index, anchor)` pairs in ascending atom order.
    pub fn anchors(&self) -> &[(usize, Point3<f64>)] {
        &self.anchors
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    pub fn energy(&self, positions: &[Point3<f64>]) -> f64 {
        self.anchors
            .iter()
            .map(|(i, anchor)| self.spring_constant * (positions[*i] - anchor).norm_squared())
            .sum()
    }

    /// Adds the restraint forces `-2k (x - x0)` to `forces`.
    pub fn apply_forces(&self, positions: &[Point3<f64>], forces: &mut [Vector3<f64>]) {
        for (i, anchor) in &self.anchors {
            forces[*i] -= 2.0 * self.spring_constant * (positions[*i] - anchor);
        }
    }
}

/// Restrains every atom covered by `index_ranges` to its current position.
pub fn build_position_restraints(
    index_ranges: &[Range<usize>],
    positions: &[Point3<f64>],
    spring_constant: f64,
) -> Result<RestraintSet, RestraintError> {
    if !(spring_constant.is_finite() && spring_constant >= 0.0) {
        return Err(RestraintError::InvalidSpringConstant(spring_constant));
    }
    let mut atoms = BTreeSet::new();
    for range in index_ranges {
        if range.start > range.end || range.end > positions.len() {
            return Err(RestraintError::RangeOutOfBounds {
                start: range.start,
                end: range.end,
                atom_count: positions.len(),
            });
        }
        atoms.extend(range.clone());
    }
    let anchors = atoms
        .into_iter()
        .map(|i| {
            let anchor = positions[i];
            if anchor.iter().all(|c| c.is_finite()) {
                Ok((i, anchor))
            } else {
                Err(RestraintError::NonFiniteAnchor(i))
            }
        })
        .collect::<Result<Vec<_>, _>>()?;
    debug!(
        restrained = anchors.len(),
        spring_constant, "Position restraints built."
    );
    Ok(RestraintSet {
        spring_constant,
        anchors,
    })
}
