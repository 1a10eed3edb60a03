use super::template::MoleculeTemplate;
use super::topology::{Topology, TopologyError};
use nalgebra::Point3;
use std::fmt;
use std::ops::Range;
use thiserror::Error;

/// Logical sub-structure of an assembled system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    BaseSheet,
    SugarLayer,
    Solvent,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Segment::BaseSheet => "base sheet",
            Segment::SugarLayer => "sugar layer",
            Segment::Solvent => "solvent",
        })
    }
}

/// A half-open atom-index span `[start, end)` contributed by one build step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRange {
    pub segment: Segment,
    pub start: usize,
    pub end: usize,
}

impl IndexRange {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn indices(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices().contains(&index)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SystemError {
    #[error("Instance of '{residue_name}' expects {expected} positions but got {found}")]
    ConformationMismatch {
        residue_name: String,
        expected: usize,
        found: usize,
    },
    #[error("Segment '{segment}' range {start}..{end} exceeds the {atom_count} atoms in the system")]
    SegmentOutOfBounds {
        segment: Segment,
        start: usize,
        end: usize,
        atom_count: usize,
    },
    #[error("Segment '{segment}' range {start}..{end} overlaps an existing segment")]
    SegmentOverlap {
        segment: Segment,
        start: usize,
        end: usize,
    },
    #[error(transparent)]
    Topology(#[from] TopologyError),
}

/// The union of every placed molecule: one topology, one positions array and a manifest of
/// the segment ranges recorded while building.
#[derive(Debug, Clone, Default)]
pub struct AssembledSystem {
    topology: Topology,
    positions: Vec<Point3<f64>>,
    manifest: Vec<IndexRange>,
}

impl AssembledSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    pub fn manifest(&self) -> &[IndexRange] {
        &self.manifest
    }

    pub fn atom_count(&self) -> usize {
        self.positions.len()
    }

    /// Appends one instance of `template` at the given coordinates and returns its atom range.
    pub fn add_instance(
        &mut self,
        template: &MoleculeTemplate,
        positions: Vec<Point3<f64>>,
    ) -> Result<Range<usize>, SystemError> {
        if positions.len() != template.atom_count() {
            return Err(SystemError::ConformationMismatch {
                residue_name: template.residue_name().to_string(),
                expected: template.atom_count(),
                found: positions.len(),
            });
        }
        let start = self.topology.atom_count();
        self.topology.add_residue(
            template.residue_name(),
            template
                .atoms()
                .iter()
                .map(|a| (a.name.as_str(), a.element)),
        );
        for bond in template.bonds() {
            let global = bond.offset(start);
            self.topology
                .add_bond(global.atom1, global.atom2, global.order)?;
        }
        self.positions.extend(positions);
        Ok(start..self.topology.atom_count())
    }

    /// Records `range` as belonging to `segment` in the manifest.
    pub fn record_segment(
        &mut self,
        segment: Segment,
        range: Range<usize>,
    ) -> Result<IndexRange, SystemError> {
        let atom_count = self.atom_count();
        if range.start > range.end || range.end > atom_count {
            return Err(SystemError::SegmentOutOfBounds {
                segment,
                start: range.start,
                end: range.end,
                atom_count,
            });
        }
        let overlaps = self
            .manifest
            .iter()
            .any(|r| range.start < r.end && r.start < range.end);
        if overlaps {
            return Err(SystemError::SegmentOverlap {
                segment,
                start: range.start,
                end: range.end,
            });
        }
        let entry = IndexRange {
            segment,
            start: range.start,
            end: range.end,
        };
        self.manifest.push(entry);
        Ok(entry)
    }

    pub fn segments(&self, segment: Segment) -> impl Iterator<Item = &IndexRange> {
        self.manifest.iter().filter(move |r| r.segment == segment)
    }

    pub fn into_parts(self) -> (Topology, Vec<Point3<f64>>, Vec<IndexRange>) {
        (self.topology, self.positions, self.manifest)
    }
}
