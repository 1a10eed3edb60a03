use crate::core::io::traits::StructureFile;
use crate::core::models::atom::Element;
use crate::core::models::frame::PeriodicBox;
use crate::core::models::residue::ResidueKind;
use crate::core::models::topology::{BondOrder, Topology, TopologyError};
use nalgebra::Point3;
use std::collections::{BTreeSet, HashMap};
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: PdbParseErrorKind },
    #[error("Inconsistent data: {0}")]
    Inconsistency(String),
    #[error("Missing required record: {0}")]
    MissingRecord(String),
    #[error(transparent)]
    Topology(#[from] TopologyError),
}

#[derive(Debug, Error)]
pub enum PdbParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Required field in columns {columns} is empty")]
    MissingRequiredField { columns: String },
}

/// Topology, coordinates and box of a system, as stored in a PDB file.
#[derive(Debug, Clone, PartialEq)]
pub struct PdbStructure {
    pub topology: Topology,
    pub positions: Vec<Point3<f64>>,
    pub periodic_box: Option<PeriodicBox>,
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    let end = end.min(line.len());
    line.get(start..end).unwrap_or("").trim()
}

fn parse_float(line: &str, line_num: usize, start: usize, end: usize) -> Result<f64, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidFloat {
            columns: format!("{}-{}", start + 1, end),
            value: value.into(),
        },
    })
}

fn parse_int(line: &str, line_num: usize, start: usize, end: usize) -> Result<i64, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidInt {
            columns: format!("{}-{}", start + 1, end),
            value: value.into(),
        },
    })
}

fn element_from_name(name: &str) -> Element {
    let letters: String = name
        .trim_start_matches(|c: char| c.is_ascii_digit())
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .take(1)
        .collect();
    letters.parse().unwrap_or(Element::Other)
}

fn format_atom_name(name: &str) -> String {
    if name.len() < 4 {
        format!(" {name:<3}")
    } else {
        name.chars().take(4).collect()
    }
}

#[derive(Default)]
struct PendingResidue {
    key: Option<(i64, String, char)>,
    name: String,
    atoms: Vec<(String, Element)>,
}

impl PendingResidue {
    fn flush(&mut self, topology: &mut Topology) {
        if !self.atoms.is_empty() {
            topology.add_residue(
                &self.name,
                self.atoms.iter().map(|(n, e)| (n.as_str(), *e)),
            );
        }
        self.atoms.clear();
        self.key = None;
    }
}

pub struct PdbFile;

impl StructureFile for PdbFile {
    type Structure = PdbStructure;
    type Error = PdbError;

    fn read_from(reader: &mut impl BufRead) -> Result<PdbStructure, PdbError> {
        let mut topology = Topology::new();
        let mut positions = Vec::new();
        let mut periodic_box = None;
        let mut serial_to_index: HashMap<i64, usize> = HashMap::new();
        let mut conect: BTreeSet<(usize, usize)> = BTreeSet::new();
        let mut pending = PendingResidue::default();

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;

            match slice_and_trim(&line, 0, 6) {
                "CRYST1" => {
                    periodic_box = Some(PeriodicBox::new(
                        parse_float(&line, line_num, 6, 15)?,
                        parse_float(&line, line_num, 15, 24)?,
                        parse_float(&line, line_num, 24, 33)?,
                    ));
                }
                "ATOM" | "HETATM" => {
                    let serial = parse_int(&line, line_num, 6, 11)?;
                    let name = slice_and_trim(&line, 12, 16);
                    if name.is_empty() {
                        return Err(PdbError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::MissingRequiredField {
                                columns: "13-16".into(),
                            },
                        });
                    }
                    let res_name = slice_and_trim(&line, 17, 21);
                    let chain = slice_and_trim(&line, 21, 22).chars().next().unwrap_or(' ');
                    let res_seq = parse_int(&line, line_num, 22, 26)?;
                    let position = Point3::new(
                        parse_float(&line, line_num, 30, 38)?,
                        parse_float(&line, line_num, 38, 46)?,
                        parse_float(&line, line_num, 46, 54)?,
                    );
                    let element = match slice_and_trim(&line, 76, 78) {
                        "" => element_from_name(name),
                        symbol => symbol.parse().unwrap_or(Element::Other),
                    };

                    let key = (res_seq, res_name.to_string(), chain);
                    if pending.key.as_ref() != Some(&key) {
                        pending.flush(&mut topology);
                        pending.key = Some(key);
                        pending.name = res_name.to_string();
                    }
                    pending.atoms.push((name.to_string(), element));
                    serial_to_index
                        .entry(serial)
                        .or_insert(positions.len());
                    positions.push(position);
                }
                "TER" => pending.flush(&mut topology),
                "CONECT" => {
                    // Serials occupy fixed five-column fields and may run together.
                    let mut serials = Vec::with_capacity(5);
                    for start in (6..31).step_by(5) {
                        if slice_and_trim(&line, start, start + 5).is_empty() {
                            continue;
                        }
                        serials.push(parse_int(&line, line_num, start, start + 5)?);
                    }
                    let Some((&origin, partners)) = serials.split_first() else {
                        continue;
                    };
                    for partner in partners {
                        let (Some(&a), Some(&b)) =
                            (serial_to_index.get(&origin), serial_to_index.get(partner))
                        else {
                            return Err(PdbError::Inconsistency(format!(
                                "CONECT on line {line_num} references unknown atom serial"
                            )));
                        };
                        conect.insert((a.min(b), a.max(b)));
                    }
                }
                "END" | "ENDMDL" => break,
                _ => {}
            }
        }
        pending.flush(&mut topology);

        if positions.is_empty() {
            return Err(PdbError::MissingRecord("ATOM/HETATM records".into()));
        }
        for (a, b) in conect {
            topology.add_bond(a, b, BondOrder::Single)?;
        }
        Ok(PdbStructure {
            topology,
            positions,
            periodic_box,
        })
    }

    fn write_to(structure: &PdbStructure, writer: &mut impl Write) -> Result<(), PdbError> {
        let topology = &structure.topology;
        if topology.atom_count() != structure.positions.len() {
            return Err(PdbError::Inconsistency(format!(
                "{} atoms in topology but {} positions",
                topology.atom_count(),
                structure.positions.len()
            )));
        }

        if let Some(cell) = &structure.periodic_box {
            writeln!(
                writer,
                "CRYST1{:>9.3}{:>9.3}{:>9.3}{:>7.2}{:>7.2}{:>7.2} P 1           1",
                cell.a, cell.b, cell.c, 90.0, 90.0, 90.0
            )?;
        }

        for residue in topology.residues() {
            let residue_name: String = residue.name.chars().take(3).collect();
            for index in residue.atoms.clone() {
                let atom = &topology.atoms()[index];
                let p = &structure.positions[index];
                writeln!(
                    writer,
                    "{:<6}{:>5} {:<4} {:>3} {}{:>4}    {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {:>2}",
                    "HETATM",
                    (index + 1) % 100_000,
                    format_atom_name(&atom.name),
                    residue_name,
                    'A',
                    residue.serial % 10_000,
                    p.x,
                    p.y,
                    p.z,
                    1.0,
                    0.0,
                    atom.element.symbol()
                )?;
            }
        }

        // Water connectivity is implied by the residue template.
        let mut partners: Vec<Vec<usize>> = vec![Vec::new(); topology.atom_count()];
        for bond in topology.bonds() {
            let residue_kind = topology.residue_of(bond.atom1).map(|r| r.kind);
            if residue_kind == Some(ResidueKind::Water) {
                continue;
            }
            if bond.atom1 + 1 >= 100_000 || bond.atom2 + 1 >= 100_000 {
                continue;
            }
            partners[bond.atom1].push(bond.atom2);
            partners[bond.atom2].push(bond.atom1);
        }
        for (index, bonded) in partners.iter().enumerate() {
            for chunk in bonded.chunks(4) {
                write!(writer, "CONECT{:>5}", index + 1)?;
                for partner in chunk {
                    write!(writer, "{:>5}", partner + 1)?;
                }
                writeln!(writer)?;
            }
        }
        writeln!(writer, "END")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::residue::Enantiomer;
    use std::io::Cursor;

    fn sample() -> PdbStructure {
        let mut topology = Topology::new();
        topology.add_residue("DRI", [("O1", Element::O), ("H1", Element::H), ("C1", Element::C)]);
        topology.add_residue("HOH", [("O", Element::O), ("H1", Element::H), ("H2", Element::H)]);
        topology.add_bond(0, 1, BondOrder::Single).unwrap();
        topology.add_bond(0, 2, BondOrder::Single).unwrap();
        topology.add_bond(3, 4, BondOrder::Single).unwrap();
        let positions = (0..6)
            .map(|i| Point3::new(i as f64, -1.5 * i as f64, 0.25))
            .collect();
        PdbStructure {
            topology,
            positions,
            periodic_box: Some(PeriodicBox::new(25.0, 35.0, 65.0)),
        }
    }

    #[test]
    fn written_structure_reads_back() {
        let structure = sample();
        let mut buffer = Vec::new();
        PdbFile::write_to(&structure, &mut buffer).unwrap();
        let parsed = PdbFile::read_from(&mut Cursor::new(buffer)).unwrap();

        assert_eq!(parsed.topology.residue_count(), 2);
        assert_eq!(parsed.topology.atom_count(), 6);
        assert_eq!(
            parsed.topology.residues()[0].kind,
            ResidueKind::Sugar(Enantiomer::D)
        );
        assert_eq!(parsed.topology.atoms()[2].name, "C1");
        assert_eq!(parsed.topology.atoms()[2].element, Element::C);
        assert_eq!(parsed.periodic_box, Some(PeriodicBox::new(25.0, 35.0, 65.0)));
        assert!((parsed.positions[5].y + 7.5).abs() < 1e-3);
        // Sugar bonds survive, water bonds are implied and not written.
        assert_eq!(parsed.topology.bonds().len(), 2);
    }

    #[test]
    fn atom_lines_use_fixed_columns() {
        let mut buffer = Vec::new();
        PdbFile::write_to(&sample(), &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let line = text.lines().find(|l| l.starts_with("HETATM")).unwrap();
        assert_eq!(&line[12..16], " O1 ");
        assert_eq!(&line[17..20], "DRI");
        assert_eq!(line[76..78].trim(), "O");
    }

    #[test]
    fn mismatched_positions_are_rejected() {
        let mut structure = sample();
        structure.positions.pop();
        let mut buffer = Vec::new();
        assert!(matches!(
            PdbFile::write_to(&structure, &mut buffer),
            Err(PdbError::Inconsistency(_))
        ));
    }

    #[test]
    fn conect_records_with_five_digit_serials_read_back() {
        let mut topology = Topology::new();
        for i in 0..5001 {
            topology.add_residue("DRI", [("O1", Element::O), ("H1", Element::H)]);
            topology.add_bond(2 * i, 2 * i + 1, BondOrder::Single).unwrap();
        }
        let positions = (0..topology.atom_count())
            .map(|i| Point3::new((i % 100) as f64, (i / 100) as f64, 0.0))
            .collect();
        let structure = PdbStructure {
            topology,
            positions,
            periodic_box: None,
        };

        let mut buffer = Vec::new();
        PdbFile::write_to(&structure, &mut buffer).unwrap();
        let text = String::from_utf8(buffer.clone()).unwrap();
        assert!(text.lines().any(|l| l == "CONECT1000210001"));

        let parsed = PdbFile::read_from(&mut Cursor::new(buffer)).unwrap();
        assert_eq!(parsed.topology.atom_count(), 10_002);
        assert_eq!(parsed.topology.bonds().len(), 5001);
        assert_eq!(parsed.topology.bonded_neighbors()[10_001], vec![10_000]);
    }

    #[test]
    fn malformed_conect_serial_is_an_error() {
        let text = "HETATM    1  O1  DRI A   1       0.000   0.000   0.000  1.00  0.00           O\n\
                    CONECT    1   xx\n\
                    END\n";
        let result = PdbFile::read_from(&mut Cursor::new(text));
        assert!(matches!(result, Err(PdbError::Parse { line: 2, .. })));
    }

    #[test]
    fn file_without_atoms_is_an_error() {
        let result = PdbFile::read_from(&mut Cursor::new("REMARK empty\nEND\n"));
        assert!(matches!(result, Err(PdbError::MissingRecord(_))));
    }
}
