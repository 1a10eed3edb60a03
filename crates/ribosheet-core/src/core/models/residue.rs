use phf::{Map, phf_map};
use std::fmt;
use std::ops::Range;

/// Handedness of a sugar molecule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Enantiomer {
    D,
    L,
}

impl Enantiomer {
    pub const ALL: [Enantiomer; 2] = [Enantiomer::D, Enantiomer::L];

    pub fn mirror(&self) -> Self {
        match self {
            Enantiomer::D => Enantiomer::L,
            Enantiomer::L => Enantiomer::D,
        }
    }
}

impl fmt::Display for Enantiomer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Enantiomer::D => f.write_str("D"),
            Enantiomer::L => f.write_str("L"),
        }
    }
}

// Variant order drives the sort order of contact-matrix labels (C before G).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Nucleobase {
    Cytosine,
    Guanine,
}

/// Chemical category of a residue, resolved from its residue name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResidueKind {
    Sugar(Enantiomer),
    Base(Nucleobase),
    Water,
    Other,
}

static RESIDUE_KINDS: Map<&'static str, ResidueKind> = phf_map! {
    "DRI" => ResidueKind::Sugar(Enantiomer::D),
    "DRIB" => ResidueKind::Sugar(Enantiomer::D),
    "LRI" => ResidueKind::Sugar(Enantiomer::L),
    "LRIB" => ResidueKind::Sugar(Enantiomer::L),
    "G" => ResidueKind::Base(Nucleobase::Guanine),
    "GUA" => ResidueKind::Base(Nucleobase::Guanine),
    "C" => ResidueKind::Base(Nucleobase::Cytosine),
    "CYT" => ResidueKind::Base(Nucleobase::Cytosine),
    "HOH" => ResidueKind::Water,
    "WAT" => ResidueKind::Water,
    "SOL" => ResidueKind::Water,
};

impl ResidueKind {
    /// Resolves a residue name (case-insensitive) to its kind; unknown names map to `Other`.
    pub fn from_residue_name(name: &str) -> Self {
        RESIDUE_KINDS
            .get(name.trim().to_ascii_uppercase().as_str())
            .copied()
            .unwrap_or(ResidueKind::Other)
    }

    pub fn is_sugar(&self) -> bool {
        matches!(self, ResidueKind::Sugar(_))
    }

    pub fn is_base(&self) -> bool {
        matches!(self, ResidueKind::Base(_))
    }

    /// Sugars and bases are the species whose contacts are tallied.
    pub fn is_tracked(&self) -> bool {
        self.is_sugar() || self.is_base()
    }

    pub fn enantiomer(&self) -> Option<Enantiomer> {
        match self {
            ResidueKind::Sugar(e) => Some(*e),
            _ => None,
        }
    }

    /// Canonical short label used in reports, e.g. "DRI" or "G".
    pub fn label(&self) -> &'static str {
        match self {
            ResidueKind::Sugar(Enantiomer::D) => "DRI",
            ResidueKind::Sugar(Enantiomer::L) => "LRI",
            ResidueKind::Base(Nucleobase::Guanine) => "G",
            ResidueKind::Base(Nucleobase::Cytosine) => "C",
            ResidueKind::Water => "HOH",
            ResidueKind::Other => "UNK",
        }
    }
}

impl fmt::Display for ResidueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A residue of a topology: a named, contiguous run of atoms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Residue {
    pub name: String,
    pub kind: ResidueKind,
    /// One-based sequence number, as written to structure files.
    pub serial: usize,
    pub atoms: Range<usize>,
}

impl Residue {
    pub(crate) fn new(name: &str, serial: usize, atoms: Range<usize>) -> Self {
        Self {
            name: name.to_string(),
            kind: ResidueKind::from_residue_name(name),
            serial,
            atoms,
        }
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn contains(&self, atom_index: usize) -> bool {
        self.atoms.contains(&atom_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn residue_names_resolve_to_kinds() {
        assert_eq!(
            ResidueKind::from_residue_name("DRIB"),
            ResidueKind::Sugar(Enantiomer::D)
        );
        assert_eq!(
            ResidueKind::from_residue_name("lri"),
            ResidueKind::Sugar(Enantiomer::L)
        );
        assert_eq!(
            ResidueKind::from_residue_name("GUA"),
            ResidueKind::Base(Nucleobase::Guanine)
        );
        assert_eq!(
            ResidueKind::from_residue_name(" C "),
            ResidueKind::Base(Nucleobase::Cytosine)
        );
        assert_eq!(ResidueKind::from_residue_name("HOH"), ResidueKind::Water);
        assert_eq!(ResidueKind::from_residue_name("NAG"), ResidueKind::Other);
    }

    #[test]
    fn kind_ordering_matches_report_ordering() {
        let mut kinds = vec![
            ResidueKind::Base(Nucleobase::Guanine),
            ResidueKind::Water,
            ResidueKind::Base(Nucleobase::Cytosine),
            ResidueKind::Sugar(Enantiomer::L),
            ResidueKind::Sugar(Enantiomer::D),
        ];
        kinds.sort();
        let labels: Vec<_> = kinds.iter().map(|k| k.label()).collect();
        assert_eq!(labels, vec!["DRI", "LRI", "C", "G", "HOH"]);
    }

    #[test]
    fn tracked_kinds_are_sugars_and_bases() {
        assert!(ResidueKind::Sugar(Enantiomer::D).is_tracked());
        assert!(ResidueKind::Base(Nucleobase::Guanine).is_tracked());
        assert!(!ResidueKind::Water.is_tracked());
        assert!(!ResidueKind::Other.is_tracked());
    }

    #[test]
    fn new_residue_resolves_kind_and_range() {
        let residue = Residue::new("CYT", 3, 10..23);
        assert_eq!(residue.kind, ResidueKind::Base(Nucleobase::Cytosine));
        assert_eq!(residue.serial, 3);
        assert_eq!(residue.atom_count(), 13);
        assert!(residue.contains(10));
        assert!(!residue.contains(23));
    }

    #[test]
    fn enantiomer_mirror_swaps_handedness() {
        assert_eq!(Enantiomer::D.mirror(), Enantiomer::L);
        assert_eq!(Enantiomer::L.mirror(), Enantiomer::D);
        assert_eq!(ResidueKind::Sugar(Enantiomer::L).enantiomer(), Some(Enantiomer::L));
        assert_eq!(ResidueKind::Water.enantiomer(), None);
    }
}
