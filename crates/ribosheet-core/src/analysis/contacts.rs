use super::hbonds::HydrogenBond;
use crate::core::models::atom::AtomRole;
use crate::core::models::residue::{Enantiomer, Nucleobase, ResidueKind};
use crate::core::models::topology::Topology;
use std::collections::BTreeMap;
use std::fmt;

/// Fixed, direction-insensitive contact categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContactCategory {
    DSugarGuanine,
    DSugarCytosine,
    LSugarGuanine,
    LSugarCytosine,
    DD,
    DL,
    LL,
}

impl ContactCategory {
    pub const ALL: [ContactCategory; 7] = [
        ContactCategory::DSugarGuanine,
        ContactCategory::DSugarCytosine,
        ContactCategory::LSugarGuanine,
        ContactCategory::LSugarCytosine,
        ContactCategory::DD,
        ContactCategory::DL,
        ContactCategory::LL,
    ];

    /// Category of a contact between two residue kinds, in either order. `None` when the
    /// pair does not fall in any category (base-base, solvent, unknown residues).
    pub fn classify(a: ResidueKind, b: ResidueKind) -> Option<Self> {
        use ContactCategory::*;
        use ResidueKind::{Base, Sugar};
        match (a, b) {
            (Sugar(e), Base(base)) | (Base(base), Sugar(e)) => Some(match (e, base) {
                (Enantiomer::D, Nucleobase::Guanine) => DSugarGuanine,
                (Enantiomer::D, Nucleobase::Cytosine) => DSugarCytosine,
                (Enantiomer::L, Nucleobase::Guanine) => LSugarGuanine,
                (Enantiomer::L, Nucleobase::Cytosine) => LSugarCytosine,
            }),
            (Sugar(Enantiomer::D), Sugar(Enantiomer::D)) => Some(DD),
            (Sugar(Enantiomer::L), Sugar(Enantiomer::L)) => Some(LL),
            (Sugar(_), Sugar(_)) => Some(DL),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ContactCategory::DSugarGuanine => "DG",
            ContactCategory::DSugarCytosine => "DC",
            ContactCategory::LSugarGuanine => "LG",
            ContactCategory::LSugarCytosine => "LC",
            ContactCategory::DD => "DD",
            ContactCategory::DL => "DL",
            ContactCategory::LL => "LL",
        }
    }

    /// The sugar species a category is normalized by; `None` for cross D-L contacts, which
    /// are normalized by the total sugar count.
    pub fn species(&self) -> Option<Enantiomer> {
        match self {
            ContactCategory::DSugarGuanine | ContactCategory::DSugarCytosine | ContactCategory::DD => {
                Some(Enantiomer::D)
            }
            ContactCategory::LSugarGuanine | ContactCategory::LSugarCytosine | ContactCategory::LL => {
                Some(Enantiomer::L)
            }
            ContactCategory::DL => None,
        }
    }

    fn slot(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for ContactCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Directed residue pair of a hydrogen bond: which kind donates and which accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResiduePairKey {
    pub donor: ResidueKind,
    pub acceptor: ResidueKind,
}

impl fmt::Display for ResiduePairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.donor, self.acceptor)
    }
}

/// Template atom roles of the donor heavy atom and the acceptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AtomRolePair {
    pub donor: AtomRole,
    pub acceptor: AtomRole,
}

/// Occurrence counts of hydrogen bonds keyed by residue pair, then atom-role pair.
///
/// Counts only ever increase; merging adds counts key by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HydrogenBondTally {
    counts: BTreeMap<ResiduePairKey, BTreeMap<AtomRolePair, u64>>,
}

impl HydrogenBondTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, key: ResiduePairKey, roles: AtomRolePair) {
        *self.counts.entry(key).or_default().entry(roles).or_insert(0) += 1;
    }

    pub fn merge(&mut self, other: &HydrogenBondTally) {
        for (key, inner) in &other.counts {
            let target = self.counts.entry(*key).or_default();
            for (roles, count) in inner {
                *target.entry(*roles).or_insert(0) += count;
            }
        }
    }

    pub fn count(&self, key: &ResiduePairKey, roles: &AtomRolePair) -> u64 {
        self.counts
            .get(key)
            .and_then(|inner| inner.get(roles))
            .copied()
            .unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.values().flat_map(|inner| inner.values()).sum()
    }

    /// Number of distinct `(residue pair, role pair)` entries.
    pub fn len(&self) -> usize {
        self.counts.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ResiduePairKey, &AtomRolePair, u64)> {
        self.counts
            .iter()
            .flat_map(|(key, inner)| inner.iter().map(move |(roles, count)| (key, roles, *count)))
    }
}

/// Per-category contact counts of one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameContactCounts {
    counts: [u32; 7],
    /// Bonds detected in the frame, classified or not.
    pub detected: usize,
    /// Bonds involving solvent or unknown residues.
    pub dropped: usize,
}

impl FrameContactCounts {
    pub fn get(&self, category: ContactCategory) -> u32 {
        self.counts[category.slot()]
    }

    /// All sugar-base contacts of one enantiomer (guanine plus cytosine).
    pub fn sugar_base(&self, enantiomer: Enantiomer) -> u32 {
        match enantiomer {
            Enantiomer::D => {
                self.get(ContactCategory::DSugarGuanine) + self.get(ContactCategory::DSugarCytosine)
            }
            Enantiomer::L => {
                self.get(ContactCategory::LSugarGuanine) + self.get(ContactCategory::LSugarCytosine)
            }
        }
    }

    pub fn classified(&self) -> u32 {
        self.counts.iter().sum()
    }
}

/// Classifies one frame's bonds into the fixed categories and records tracked pairs in the
/// tally.
pub fn classify_frame(
    topology: &Topology,
    bonds: &[HydrogenBond],
    tally: &mut HydrogenBondTally,
) -> FrameContactCounts {
    let mut frame = FrameContactCounts {
        detected: bonds.len(),
        ..Default::default()
    };

    for bond in bonds {
        let resolved = topology
            .residue_of(bond.donor)
            .zip(topology.residue_of(bond.acceptor))
            .zip(topology.atom(bond.donor).zip(topology.atom(bond.acceptor)));
        let Some(((donor_residue, acceptor_residue), (donor_atom, acceptor_atom))) = resolved else {
            frame.dropped += 1;
            continue;
        };
        let (donor_kind, acceptor_kind) = (donor_residue.kind, acceptor_residue.kind);

        if !donor_kind.is_tracked() || !acceptor_kind.is_tracked() {
            frame.dropped += 1;
            continue;
        }

        if let Some(category) = ContactCategory::classify(donor_kind, acceptor_kind) {
            frame.counts[category.slot()] += 1;
        }

        tally.record(
            ResiduePairKey {
                donor: donor_kind,
                acceptor: acceptor_kind,
            },
            AtomRolePair {
                donor: donor_atom.role,
                acceptor: acceptor_atom.role,
            },
        );
    }

    frame
}

/// Frame-ordered contact counts of one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactSeries {
    frames: Vec<FrameContactCounts>,
}

impl ContactSeries {
    pub fn push(&mut self, counts: FrameContactCounts) {
        self.frames.push(counts);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[FrameContactCounts] {
        &self.frames
    }

    pub fn category(&self, category: ContactCategory) -> Vec<f64> {
        self.frames.iter().map(|f| f.get(category) as f64).collect()
    }

    pub fn sugar_base(&self, enantiomer: Enantiomer) -> Vec<f64> {
        self.frames
            .iter()
            .map(|f| f.sugar_base(enantiomer) as f64)
            .collect()
    }

    pub fn dropped(&self) -> usize {
        self.frames.iter().map(|f| f.dropped).sum()
    }
}

/// Donor-role by acceptor-role contact counts between one sugar enantiomer and the bases.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactMatrix {
    pub enantiomer: Enantiomer,
    pub row_labels: Vec<String>,
    pub column_labels: Vec<String>,
    /// `counts[row][column]`.
    pub counts: Vec<Vec<u64>>,
}

type RoleLabel = (ResidueKind, AtomRole);

fn role_label((kind, role): &RoleLabel) -> String {
    format!("{kind}-{role}")
}

impl ContactMatrix {
    /// Builds the matrix from every tally entry pairing `enantiomer` sugar with a base, in
    /// either direction.
    ///
    /// Labels sort by residue kind (D-sugar, L-sugar, C, G) and then role index; columns are
    /// listed in reverse order.
    pub fn from_tally(tally: &HydrogenBondTally, enantiomer: Enantiomer) -> Self {
        let sugar = ResidueKind::Sugar(enantiomer);
        let relevant = |key: &ResiduePairKey| {
            (key.donor == sugar && key.acceptor.is_base())
                || (key.acceptor == sugar && key.donor.is_base())
        };

        let mut cells: BTreeMap<(RoleLabel, RoleLabel), u64> = BTreeMap::new();
        for (key, roles, count) in tally.iter().filter(|(key, _, _)| relevant(key)) {
            *cells
                .entry(((key.donor, roles.donor), (key.acceptor, roles.acceptor)))
                .or_insert(0) += count;
        }

        let mut rows: Vec<RoleLabel> = cells.keys().map(|(row, _)| *row).collect();
        rows.sort();
        rows.dedup();
        let mut columns: Vec<RoleLabel> = cells.keys().map(|(_, column)| *column).collect();
        columns.sort();
        columns.dedup();
        columns.reverse();

        let counts = rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|column| cells.get(&(*row, *column)).copied().unwrap_or(0))
                    .collect()
            })
            .collect();

        Self {
            enantiomer,
            row_labels: rows.iter().map(role_label).collect(),
            column_labels: columns.iter().map(role_label).collect(),
            counts,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.row_labels.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }
}
