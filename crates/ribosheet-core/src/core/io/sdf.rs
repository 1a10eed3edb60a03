use crate::core::io::traits::StructureFile;
use crate::core::models::atom::Element;
use crate::core::models::template::{MoleculeTemplate, TemplateAtom, TemplateError};
use crate::core::models::topology::{Bond, BondOrder};
use nalgebra::Point3;
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdfError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("Unsupported SDF content: {0}")]
    Unsupported(String),
    #[error("Invalid molecule: {0}")]
    Template(#[from] TemplateError),
}

impl SdfError {
    fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}

/// The first molecule block of an SDF (V2000) file.
#[derive(Debug, Clone, PartialEq)]
pub struct SdfMolecule {
    pub title: String,
    pub atoms: Vec<TemplateAtom>,
    pub bonds: Vec<Bond>,
    pub positions: Vec<Point3<f64>>,
}

impl SdfMolecule {
    /// Converts the molecule into a template carrying the given residue name.
    pub fn into_template(self, residue_name: &str) -> Result<MoleculeTemplate, TemplateError> {
        MoleculeTemplate::new(residue_name, self.atoms, self.bonds, self.positions)
    }
}

impl MoleculeTemplate {
    /// Loads the first molecule of an SDF file as a template with the given residue name.
    pub fn from_sdf<P: AsRef<Path>>(path: P, residue_name: &str) -> Result<Self, SdfError> {
        let molecule = SdfFile::read_from_path(path)?;
        Ok(molecule.into_template(residue_name)?)
    }
}

pub struct SdfFile;

impl StructureFile for SdfFile {
    type Structure = SdfMolecule;
    type Error = SdfError;

    fn read_from(reader: &mut impl BufRead) -> Result<SdfMolecule, SdfError> {
        let lines = collect_first_block(reader)?;
        if lines.len() < 4 {
            return Err(SdfError::parse(
                lines.len().max(1),
                "molecule block must contain a header and a counts line",
            ));
        }

        let (counts_line_no, counts_line) = (&lines[3].0, &lines[3].1);
        if counts_line.contains("V3000") {
            return Err(SdfError::Unsupported("V3000 molecule blocks".into()));
        }
        let (atom_count, bond_count) = parse_counts(counts_line, *counts_line_no)?;
        let atom_start = 4;
        let bond_start = atom_start + atom_count;
        if lines.len() < bond_start + bond_count {
            return Err(SdfError::parse(
                lines.last().map_or(*counts_line_no, |(ln, _)| *ln),
                "block ended before all atoms and bonds were read",
            ));
        }

        let (atoms, positions) = parse_atoms(&lines[atom_start..bond_start])?;
        let bonds = parse_bonds(&lines[bond_start..bond_start + bond_count], atom_count)?;

        Ok(SdfMolecule {
            title: lines[0].1.trim().to_string(),
            atoms,
            bonds,
            positions,
        })
    }

    fn write_to(molecule: &SdfMolecule, writer: &mut impl Write) -> Result<(), SdfError> {
        writeln!(writer, "{}", molecule.title)?;
        writeln!(writer, "  ribosheet")?;
        writeln!(writer)?;
        writeln!(
            writer,
            "{:>3}{:>3}  0  0  0  0  0  0  0  0999 V2000",
            molecule.atoms.len(),
            molecule.bonds.len()
        )?;
        for (atom, p) in molecule.atoms.iter().zip(&molecule.positions) {
            writeln!(
                writer,
                "{:>10.4}{:>10.4}{:>10.4} {:<3} 0  0  0  0  0  0  0  0  0  0  0  0",
                p.x,
                p.y,
                p.z,
                atom.element.symbol()
            )?;
        }
        for bond in &molecule.bonds {
            writeln!(
                writer,
                "{:>3}{:>3}{:>3}  0",
                bond.atom1 + 1,
                bond.atom2 + 1,
                bond.order as u8
            )?;
        }
        writeln!(writer, "M  END")?;
        writeln!(writer, "$$$$")?;
        Ok(())
    }
}

fn collect_first_block(reader: &mut impl BufRead) -> Result<Vec<(usize, String)>, SdfError> {
    let mut lines = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let content = line?;
        if content.trim() == "$$$$" && !lines.is_empty() {
            break;
        }
        lines.push((i + 1, content));
    }
    Ok(lines)
}

fn parse_counts(line: &str, line_no: usize) -> Result<(usize, usize), SdfError> {
    // Counts are fixed three-column fields; they run together once a count reaches 100.
    let field = |range: std::ops::Range<usize>| line.get(range).map(str::trim);
    let fixed = match (field(0..3), field(3..6)) {
        (Some(a), Some(b)) => a.parse::<usize>().ok().zip(b.parse::<usize>().ok()),
        _ => None,
    };
    if let Some(counts) = fixed {
        return Ok(counts);
    }
    let tokens: Vec<_> = line.split_whitespace().collect();
    if tokens.len() < 2 {
        return Err(SdfError::parse(
            line_no,
            "counts line must contain atom and bond counts",
        ));
    }
    let atoms = tokens[0]
        .parse()
        .map_err(|_| SdfError::parse(line_no, "invalid atom count"))?;
    let bonds = tokens[1]
        .parse()
        .map_err(|_| SdfError::parse(line_no, "invalid bond count"))?;
    Ok((atoms, bonds))
}

fn parse_atoms(
    lines: &[(usize, String)],
) -> Result<(Vec<TemplateAtom>, Vec<Point3<f64>>), SdfError> {
    let mut atoms = Vec::with_capacity(lines.len());
    let mut positions = Vec::with_capacity(lines.len());
    let mut ordinals: HashMap<Element, usize> = HashMap::new();

    for (ln, raw) in lines {
        let padded = format!("{raw:<40}");
        let coordinate = |range: std::ops::Range<usize>, axis: &str| {
            padded
                .get(range)
                .and_then(|s| s.trim().parse::<f64>().ok())
                .ok_or_else(|| SdfError::parse(*ln, format!("invalid {axis} coordinate")))
        };
        let x = coordinate(0..10, "x")?;
        let y = coordinate(10..20, "y")?;
        let z = coordinate(20..30, "z")?;
        let symbol = padded.get(31..34).unwrap_or("").trim();
        let element: Element = symbol
            .parse()
            .map_err(|_| SdfError::parse(*ln, format!("invalid element symbol '{symbol}'")))?;

        let ordinal = ordinals.entry(element).or_insert(0);
        *ordinal += 1;
        let name = match element {
            Element::Other => format!("{}{}", symbol.to_ascii_uppercase(), ordinal),
            _ => format!("{}{}", element.symbol().to_ascii_uppercase(), ordinal),
        };
        atoms.push(TemplateAtom { name, element });
        positions.push(Point3::new(x, y, z));
    }
    Ok((atoms, positions))
}

fn parse_bonds(lines: &[(usize, String)], atom_count: usize) -> Result<Vec<Bond>, SdfError> {
    let mut bonds = Vec::with_capacity(lines.len());
    for (ln, raw) in lines {
        let field = |range: std::ops::Range<usize>| raw.get(range).map(str::trim).unwrap_or("");
        let (a1, a2, code) = (field(0..3), field(3..6), field(6..9));
        let tokens: Vec<_> = raw.split_whitespace().collect();
        let parsed = match (a1.parse::<usize>(), a2.parse::<usize>(), code.parse::<u8>()) {
            (Ok(a), Ok(b), Ok(c)) => Some((a, b, c)),
            _ if tokens.len() >= 3 => tokens[0]
                .parse()
                .ok()
                .zip(tokens[1].parse().ok())
                .zip(tokens[2].parse().ok())
                .map(|((a, b), c)| (a, b, c)),
            _ => None,
        };
        let (a1, a2, code) = parsed.ok_or_else(|| SdfError::parse(*ln, "invalid bond line"))?;
        let order = BondOrder::from_ctfile(code)
            .ok_or_else(|| SdfError::parse(*ln, format!("unsupported bond type {code}")))?;
        if a1 == 0 || a2 == 0 || a1 > atom_count || a2 > atom_count || a1 == a2 {
            return Err(SdfError::parse(
                *ln,
                "bond references an atom outside the declared range",
            ));
        }
        bonds.push(Bond::new(a1 - 1, a2 - 1, order));
    }
    Ok(bonds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const WATER_SDF: &str = "\
water
  handmade

  3  2  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.1173 O   0  0  0  0  0  0  0  0  0  0  0  0
    0.0000    0.7572   -0.4692 H   0  0  0  0  0  0  0  0  0  0  0  0
    0.0000   -0.7572   -0.4692 H   0  0  0  0  0  0  0  0  0  0  0  0
  1  2  1  0
  1  3  1  0
M  END
$$$$
second
";

    #[test]
    fn reads_atoms_bonds_and_generates_names() {
        let molecule = SdfFile::read_from(&mut Cursor::new(WATER_SDF)).unwrap();
        assert_eq!(molecule.title, "water");
        let names: Vec<_> = molecule.atoms.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["O1", "H1", "H2"]);
        assert_eq!(molecule.bonds, vec![
            Bond::new(0, 1, BondOrder::Single),
            Bond::new(0, 2, BondOrder::Single)
        ]);
        assert!((molecule.positions[1].y - 0.7572).abs() < 1e-9);
    }

    #[test]
    fn rejects_v3000_blocks() {
        let text = "t\n\n\n  0  0  0     0  0            999 V3000\nM  END\n";
        let result = SdfFile::read_from(&mut Cursor::new(text));
        assert!(matches!(result, Err(SdfError::Unsupported(_))));
    }

    #[test]
    fn rejects_bonds_outside_the_atom_block() {
        let text = WATER_SDF.replace("  1  3  1  0", "  1  7  1  0");
        let result = SdfFile::read_from(&mut Cursor::new(text));
        assert!(matches!(result, Err(SdfError::Parse { line: 9, .. })));
    }

    #[test]
    fn truncated_block_is_an_error() {
        let text = "t\n\n\n  3  0  0  0  0  0  0  0  0  0999 V2000\n";
        assert!(SdfFile::read_from(&mut Cursor::new(text)).is_err());
    }

    #[test]
    fn written_molecule_reads_back_as_template() {
        let molecule = SdfFile::read_from(&mut Cursor::new(WATER_SDF)).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("water.sdf");
        SdfFile::write_to_path(&molecule, &path).unwrap();

        let template = MoleculeTemplate::from_sdf(&path, "HOH").unwrap();
        assert_eq!(template.residue_name(), "HOH");
        assert_eq!(template.atom_count(), 3);
        assert_eq!(template.bonds().len(), 2);
        assert!((template.conformation()[0].z - 0.1173).abs() < 1e-4);
    }
}
