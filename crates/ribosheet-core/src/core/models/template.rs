use super::atom::Element;
use super::ids::TemplateId;
use super::residue::ResidueKind;
use super::topology::Bond;
use nalgebra::Point3;
use slotmap::SlotMap;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Template '{residue_name}' has {atoms} atoms but {positions} reference positions")]
    ConformationMismatch {
        residue_name: String,
        atoms: usize,
        positions: usize,
    },
    #[error("Template '{residue_name}' bond {atom1}-{atom2} references a missing atom")]
    BondOutOfRange {
        residue_name: String,
        atom1: usize,
        atom2: usize,
    },
    #[error("Residue name must not be empty")]
    EmptyResidueName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateAtom {
    pub name: String,
    pub element: Element,
}

/// An immutable molecule: topology of a single residue plus its reference conformation.
#[derive(Debug, Clone, PartialEq)]
pub struct MoleculeTemplate {
    residue_name: String,
    atoms: Vec<TemplateAtom>,
    bonds: Vec<Bond>,
    conformation: Vec<Point3<f64>>,
}

impl MoleculeTemplate {
    pub fn new(
        residue_name: &str,
        atoms: Vec<TemplateAtom>,
        bonds: Vec<Bond>,
        conformation: Vec<Point3<f64>>,
    ) -> Result<Self, TemplateError> {
        let residue_name = residue_name.trim();
        if residue_name.is_empty() {
            return Err(TemplateError::EmptyResidueName);
        }
        if atoms.len() != conformation.len() {
            return Err(TemplateError::ConformationMismatch {
                residue_name: residue_name.to_string(),
                atoms: atoms.len(),
                positions: conformation.len(),
            });
        }
        if let Some(bad) = bonds.iter().find(|b| b.atom2 >= atoms.len()) {
            return Err(TemplateError::BondOutOfRange {
                residue_name: residue_name.to_string(),
                atom1: bad.atom1,
                atom2: bad.atom2,
            });
        }
        Ok(Self {
            residue_name: residue_name.to_string(),
            atoms,
            bonds,
            conformation,
        })
    }

    pub fn residue_name(&self) -> &str {
        &self.residue_name
    }

    pub fn kind(&self) -> ResidueKind {
        ResidueKind::from_residue_name(&self.residue_name)
    }

    pub fn atoms(&self) -> &[TemplateAtom] {
        &self.atoms
    }

    /// Bonds with template-local atom indices.
    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn conformation(&self) -> &[Point3<f64>] {
        &self.conformation
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }
}

/// Owner of every template loaded for a run. Sheet instances refer to templates by id.
#[derive(Debug, Clone, Default)]
pub struct TemplateLibrary {
    templates: SlotMap<TemplateId, MoleculeTemplate>,
    by_residue_name: HashMap<String, TemplateId>,
}

impl TemplateLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a template. A template with the same residue name replaces the lookup entry.
    pub fn insert(&mut self, template: MoleculeTemplate) -> TemplateId {
        let name = template.residue_name().to_string();
        let id = self.templates.insert(template);
        self.by_residue_name.insert(name, id);
        id
    }

    pub fn get(&self, id: TemplateId) -> Option<&MoleculeTemplate> {
        self.templates.get(id)
    }

    pub fn find(&self, residue_name: &str) -> Option<TemplateId> {
        self.by_residue_name.get(residue_name).copied()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::residue::Enantiomer;
    use crate::core::models::topology::BondOrder;

    fn hydroxyl(name: &str) -> MoleculeTemplate {
        MoleculeTemplate::new(
            name,
            vec![
                TemplateAtom {
                    name: "O1".into(),
                    element: Element::O,
                },
                TemplateAtom {
                    name: "H1".into(),
                    element: Element::H,
                },
            ],
            vec![Bond::new(0, 1, BondOrder::Single)],
            vec![Point3::origin(), Point3::new(0.96, 0.0, 0.0)],
        )
        .unwrap()
    }

    #[test]
    fn new_template_validates_conformation_length() {
        let result = MoleculeTemplate::new(
            "DRI",
            vec![TemplateAtom {
                name: "C1".into(),
                element: Element::C,
            }],
            vec![],
            vec![],
        );
        assert_eq!(
            result,
            Err(TemplateError::ConformationMismatch {
                residue_name: "DRI".into(),
                atoms: 1,
                positions: 0
            })
        );
    }

    #[test]
    fn new_template_rejects_bonds_to_missing_atoms() {
        let result = MoleculeTemplate::new(
            "DRI",
            vec![TemplateAtom {
                name: "C1".into(),
                element: Element::C,
            }],
            vec![Bond::new(0, 3, BondOrder::Single)],
            vec![Point3::origin()],
        );
        assert!(matches!(result, Err(TemplateError::BondOutOfRange { .. })));
    }

    #[test]
    fn template_kind_follows_residue_name() {
        assert_eq!(hydroxyl("LRI").kind(), ResidueKind::Sugar(Enantiomer::L));
        assert_eq!(hydroxyl("XYZ").kind(), ResidueKind::Other);
    }

    #[test]
    fn library_finds_templates_by_residue_name() {
        let mut library = TemplateLibrary::new();
        let d = library.insert(hydroxyl("DRI"));
        let l = library.insert(hydroxyl("LRI"));
        assert_eq!(library.len(), 2);
        assert_eq!(library.find("DRI"), Some(d));
        assert_eq!(library.find("LRI"), Some(l));
        assert_eq!(library.get(l).unwrap().residue_name(), "LRI");
        assert!(library.find("G").is_none());
    }
}
