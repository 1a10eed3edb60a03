use super::atom::{Atom, AtomRole, Element};
use super::residue::{Residue, ResidueKind};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum BondOrder {
    #[default]
    Single = 1,
    Double = 2,
    Triple = 3,
    Aromatic = 4,
}

impl BondOrder {
    /// Maps a CTfile (MOL/SDF) bond type code to a bond order.
    pub fn from_ctfile(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Single),
            2 => Some(Self::Double),
            3 => Some(Self::Triple),
            4 => Some(Self::Aromatic),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
#[error("Invalid bond order string")]
pub struct ParseBondOrderError;

impl FromStr for BondOrder {
    type Err = ParseBondOrderError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1" | "s" | "single" => Ok(Self::Single),
            "2" | "d" | "double" => Ok(Self::Double),
            "3" | "t" | "triple" => Ok(Self::Triple),
            "4" | "ar" | "aromatic" => Ok(Self::Aromatic),
            _ => Err(ParseBondOrderError),
        }
    }
}

impl fmt::Display for BondOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Single => "Single",
            Self::Double => "Double",
            Self::Triple => "Triple",
            Self::Aromatic => "Aromatic",
        })
    }
}

/// A covalent bond between two atoms, stored with `atom1 < atom2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bond {
    pub atom1: usize,
    pub atom2: usize,
    pub order: BondOrder,
}

impl Bond {
    pub fn new(a: usize, b: usize, order: BondOrder) -> Self {
        Self {
            atom1: a.min(b),
            atom2: a.max(b),
            order,
        }
    }

    pub fn contains(&self, atom: usize) -> bool {
        self.atom1 == atom || self.atom2 == atom
    }

    pub fn offset(&self, by: usize) -> Self {
        Self::new(self.atom1 + by, self.atom2 + by, self.order)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TopologyError {
    #[error("Bond {atom1}-{atom2} references an atom outside 0..{atom_count}")]
    BondOutOfRange {
        atom1: usize,
        atom2: usize,
        atom_count: usize,
    },
    #[error("Atom {0} cannot be bonded to itself")]
    SelfBond(usize),
}

/// Atoms, residues and bonds of a molecular system, in insertion order.
///
/// Residues always own a contiguous atom range and atoms are appended residue by residue,
/// so an atom index is valid for the lifetime of the topology.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Topology {
    atoms: Vec<Atom>,
    residues: Vec<Residue>,
    bonds: Vec<Bond>,
    bonded_pairs: HashSet<(usize, usize)>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn residues(&self) -> &[Residue] {
        &self.residues
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn residue_count(&self) -> usize {
        self.residues.len()
    }

    pub fn atom(&self, index: usize) -> Option<&Atom> {
        self.atoms.get(index)
    }

    pub fn residue(&self, index: usize) -> Option<&Residue> {
        self.residues.get(index)
    }

    /// Residue owning the given atom.
    pub fn residue_of(&self, atom_index: usize) -> Option<&Residue> {
        self.atoms
            .get(atom_index)
            .and_then(|atom| self.residues.get(atom.residue))
    }

    /// Appends a residue made of the given `(name, element)` atoms and returns its index.
    ///
    /// Atom roles are assigned in the given order, starting at zero.
    pub fn add_residue<'a>(
        &mut self,
        residue_name: &str,
        atoms: impl IntoIterator<Item = (&'a str, Element)>,
    ) -> usize {
        let residue_index = self.residues.len();
        let start = self.atoms.len();
        for (role, (name, element)) in atoms.into_iter().enumerate() {
            self.atoms
                .push(Atom::new(name, element, residue_index, AtomRole(role)));
        }
        let end = self.atoms.len();
        self.residues
            .push(Residue::new(residue_name, residue_index + 1, start..end));
        residue_index
    }

    /// Adds a bond between two existing atoms (global indices). Duplicates are ignored.
    pub fn add_bond(&mut self, a: usize, b: usize, order: BondOrder) -> Result<(), TopologyError> {
        if a == b {
            return Err(TopologyError::SelfBond(a));
        }
        let atom_count = self.atoms.len();
        if a >= atom_count || b >= atom_count {
            return Err(TopologyError::BondOutOfRange {
                atom1: a,
                atom2: b,
                atom_count,
            });
        }
        let bond = Bond::new(a, b, order);
        if self.bonded_pairs.insert((bond.atom1, bond.atom2)) {
            self.bonds.push(bond);
        }
        Ok(())
    }

    /// Explicit presence query for a residue kind.
    pub fn contains_kind(&self, kind: ResidueKind) -> bool {
        self.residues.iter().any(|r| r.kind == kind)
    }

    pub fn residues_of_kind(&self, kind: ResidueKind) -> impl Iterator<Item = &Residue> {
        self.residues.iter().filter(move |r| r.kind == kind)
    }

    pub fn count_kind(&self, kind: ResidueKind) -> usize {
        self.residues_of_kind(kind).count()
    }

    /// Atom indices of every residue matching the predicate, in topology order.
    pub fn atom_indices_where(&self, predicate: impl Fn(ResidueKind) -> bool) -> Vec<usize> {
        self.residues
            .iter()
            .filter(|r| predicate(r.kind))
            .flat_map(|r| r.atoms.clone())
            .collect()
    }

    /// Adjacency lists built from the bond table.
    pub fn bonded_neighbors(&self) -> Vec<Vec<usize>> {
        let mut adjacency = vec![Vec::new(); self.atoms.len()];
        for bond in &self.bonds {
            adjacency[bond.atom1].push(bond.atom2);
            adjacency[bond.atom2].push(bond.atom1);
        }
        adjacency
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::residue::{Enantiomer, Nucleobase};

    fn water_and_sugar() -> Topology {
        let mut topology = Topology::new();
        topology.add_residue("HOH", [("O1", Element::O), ("H1", Element::H), ("H2", Element::H)]);
        topology.add_residue("DRI", [("C1", Element::C), ("O1", Element::O)]);
        topology
    }

    #[test]
    fn bond_order_from_str_parses_valid_strings() {
        assert_eq!("1".parse::<BondOrder>().unwrap(), BondOrder::Single);
        assert_eq!("D".parse::<BondOrder>().unwrap(), BondOrder::Double);
        assert_eq!("triple".parse::<BondOrder>().unwrap(), BondOrder::Triple);
        assert_eq!("ar".parse::<BondOrder>().unwrap(), BondOrder::Aromatic);
        assert!("quadruple".parse::<BondOrder>().is_err());
    }

    #[test]
    fn bond_order_from_ctfile_codes() {
        assert_eq!(BondOrder::from_ctfile(2), Some(BondOrder::Double));
        assert_eq!(BondOrder::from_ctfile(4), Some(BondOrder::Aromatic));
        assert_eq!(BondOrder::from_ctfile(8), None);
        assert_eq!(BondOrder::default(), BondOrder::Single);
    }

    #[test]
    fn bond_new_normalizes_atom_order() {
        let bond = Bond::new(9, 2, BondOrder::Single);
        assert_eq!((bond.atom1, bond.atom2), (2, 9));
        assert!(bond.contains(9));
        assert!(!bond.contains(3));
        assert_eq!(bond.offset(10), Bond::new(12, 19, BondOrder::Single));
    }

    #[test]
    fn add_residue_assigns_contiguous_ranges_and_roles() {
        let topology = water_and_sugar();
        assert_eq!(topology.atom_count(), 5);
        assert_eq!(topology.residues()[0].atoms, 0..3);
        assert_eq!(topology.residues()[1].atoms, 3..5);
        assert_eq!(topology.residues()[1].serial, 2);
        assert_eq!(topology.atom(4).unwrap().role, AtomRole(1));
        assert_eq!(topology.residue_of(4).unwrap().name, "DRI");
    }

    #[test]
    fn presence_queries_report_kinds() {
        let topology = water_and_sugar();
        assert!(topology.contains_kind(ResidueKind::Sugar(Enantiomer::D)));
        assert!(!topology.contains_kind(ResidueKind::Sugar(Enantiomer::L)));
        assert!(!topology.contains_kind(ResidueKind::Base(Nucleobase::Guanine)));
        assert_eq!(topology.count_kind(ResidueKind::Water), 1);
        assert_eq!(topology.atom_indices_where(|k| k.is_sugar()), vec![3, 4]);
    }

    #[test]
    fn add_bond_validates_indices_and_skips_duplicates() {
        let mut topology = water_and_sugar();
        topology.add_bond(0, 1, BondOrder::Single).unwrap();
        topology.add_bond(1, 0, BondOrder::Single).unwrap();
        assert_eq!(topology.bonds().len(), 1);
        assert_eq!(
            topology.add_bond(0, 7, BondOrder::Single),
            Err(TopologyError::BondOutOfRange {
                atom1: 0,
                atom2: 7,
                atom_count: 5
            })
        );
        assert_eq!(
            topology.add_bond(2, 2, BondOrder::Single),
            Err(TopologyError::SelfBond(2))
        );
        let neighbors = topology.bonded_neighbors();
        assert_eq!(neighbors[0], vec![1]);
        assert_eq!(neighbors[1], vec![0]);
    }
}
