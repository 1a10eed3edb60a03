use phf::{Map, phf_map};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Chemical element of an atom.
///
/// Only the elements that occur in nucleobases, sugars, water and common counter-ions get a
/// dedicated variant; everything else is carried as [`Element::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Element {
    H,
    C,
    N,
    O,
    P,
    S,
    Na,
    Cl,
    Other,
}

static ELEMENT_SYMBOLS: Map<&'static str, Element> = phf_map! {
    "H" => Element::H,
    "D" => Element::H,
    "C" => Element::C,
    "N" => Element::N,
    "O" => Element::O,
    "P" => Element::P,
    "S" => Element::S,
    "NA" => Element::Na,
    "CL" => Element::Cl,
};

impl Element {
    pub fn symbol(&self) -> &'static str {
        match self {
            Element::H => "H",
            Element::C => "C",
            Element::N => "N",
            Element::O => "O",
            Element::P => "P",
            Element::S => "S",
            Element::Na => "Na",
            Element::Cl => "Cl",
            Element::Other => "X",
        }
    }

    /// Standard atomic mass in daltons.
    pub fn mass(&self) -> f64 {
        match self {
            Element::H => 1.008,
            Element::C => 12.011,
            Element::N => 14.007,
            Element::O => 15.999,
            Element::P => 30.974,
            Element::S => 32.06,
            Element::Na => 22.990,
            Element::Cl => 35.45,
            Element::Other => 12.011,
        }
    }

    /// Bondi van der Waals radius in Angstroms.
    pub fn vdw_radius(&self) -> f64 {
        match self {
            Element::H => 1.20,
            Element::C => 1.70,
            Element::N => 1.55,
            Element::O => 1.52,
            Element::P => 1.80,
            Element::S => 1.80,
            Element::Na => 2.27,
            Element::Cl => 1.75,
            Element::Other => 1.70,
        }
    }

    /// Whether the element can take part in a hydrogen bond as donor heavy atom or acceptor.
    pub fn is_polar(&self) -> bool {
        matches!(self, Element::N | Element::O)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid or unsupported element symbol: '{0}'")]
pub struct ParseElementError(pub String);

impl FromStr for Element {
    type Err = ParseElementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ParseElementError(s.to_string()));
        }
        Ok(ELEMENT_SYMBOLS
            .get(trimmed.to_ascii_uppercase().as_str())
            .copied()
            .unwrap_or(Element::Other))
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Intra-residue identity of an atom: its index within the template it was copied from.
///
/// Roles are assigned once when a residue is added to a topology and travel with the atom,
/// so two atoms with the same role in two residues of the same kind are chemically equivalent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AtomRole(pub usize);

impl fmt::Display for AtomRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An atom of an assembled topology. Coordinates are stored separately, per frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atom {
    /// Atom name, e.g. "O3" or "H12".
    pub name: String,
    pub element: Element,
    /// Index of the parent residue in the owning topology.
    pub residue: usize,
    pub role: AtomRole,
}

impl Atom {
    pub fn new(name: &str, element: Element, residue: usize, role: AtomRole) -> Self {
        Self {
            name: name.to_string(),
            element,
            residue,
            role,
        }
    }
}
