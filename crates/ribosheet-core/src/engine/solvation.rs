use super::error::AssemblyError;
use crate::core::models::atom::Element;
use crate::core::models::frame::PeriodicBox;
use crate::core::models::system::AssembledSystem;
use crate::core::models::template::{MoleculeTemplate, TemplateAtom, TemplateError};
use crate::core::models::topology::{Bond, BondOrder};
use crate::core::utils::neighbors::NeighborIndex;
use nalgebra::{Point3, Vector3};
use std::ops::Range;
use tracing::{debug, instrument};

pub const WATER_RESIDUE: &str = "HOH";
const TIP3P_OH_LENGTH: f64 = 0.9572;
const TIP3P_HOH_ANGLE_DEGREES: f64 = 104.52;

#[derive(Debug, Clone, PartialEq)]
pub struct SolventParameters {
    /// Distance between neighboring water oxygens on the fill lattice.
    pub lattice_pitch: f64,
    /// Minimum distance between any water atom and any solute atom.
    pub exclusion_radius: f64,
}

impl Default for SolventParameters {
    fn default() -> Self {
        Self {
            lattice_pitch: 3.1,
            exclusion_radius: 2.4,
        }
    }
}

/// Rigid TIP3P water with the oxygen at the origin and the hydrogens in the xz plane.
pub fn tip3p_water() -> Result<MoleculeTemplate, TemplateError> {
    let half_angle = (TIP3P_HOH_ANGLE_DEGREES / 2.0).to_radians();
    let (dx, dz) = (
        TIP3P_OH_LENGTH * half_angle.sin(),
        TIP3P_OH_LENGTH * half_angle.cos(),
    );
    let atom = |name: &str, element| TemplateAtom {
        name: name.to_string(),
        element,
    };
    MoleculeTemplate::new(
        WATER_RESIDUE,
        vec![
            atom("O", Element::O),
            atom("H1", Element::H),
            atom("H2", Element::H),
        ],
        vec![
            Bond::new(0, 1, BondOrder::Single),
            Bond::new(0, 2, BondOrder::Single),
        ],
        vec![
            Point3::origin(),
            Point3::new(dx, 0.0, dz),
            Point3::new(-dx, 0.0, dz),
        ],
    )
}

/// Fills `region` (anchored at the origin) with waters on a cubic lattice, skipping sites that
/// would come closer than the exclusion radius to an atom already in the system.
///
/// Returns the atom range of the added waters.
#[instrument(level = "debug", skip_all, fields(a = region.a, b = region.b, c = region.c))]
pub fn solvate(
    system: &mut AssembledSystem,
    region: &PeriodicBox,
    parameters: &SolventParameters,
) -> Result<Range<usize>, AssemblyError> {
    if !(parameters.lattice_pitch.is_finite() && parameters.lattice_pitch > 0.0) {
        return Err(AssemblyError::InvalidSpacing(parameters.lattice_pitch));
    }
    let water = tip3p_water()?;
    let solute = NeighborIndex::new(system.positions(), 0..system.atom_count());
    let start = system.atom_count();
    let pitch = parameters.lattice_pitch;
    let cells = |edge: f64| (edge / pitch).floor().max(0.0) as usize;
    let (nx, ny, nz) = (cells(region.a), cells(region.b), cells(region.c));

    let mut skipped = 0usize;
    for i in 0..nx {
        for j in 0..ny {
            for k in 0..nz {
                let site = Vector3::new(
                    (i as f64 + 0.5) * pitch,
                    (j as f64 + 0.5) * pitch,
                    (k as f64 + 0.5) * pitch,
                );
                let placed: Vec<Point3<f64>> =
                    water.conformation().iter().map(|p| p + site).collect();
                let clashes = placed
                    .iter()
                    .any(|p| !solute.within(p, parameters.exclusion_radius).is_empty());
                if clashes {
                    skipped += 1;
                    continue;
                }
                system.add_instance(&water, placed)?;
            }
        }
    }

    let end = system.atom_count();
    debug!(waters = (end - start) / 3, skipped, "Solvent added.");
    Ok(start..end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::residue::ResidueKind;

    #[test]
    fn tip3p_geometry_matches_model() {
        let water = tip3p_water().unwrap();
        let c = water.conformation();
        assert!(((c[1] - c[0]).norm() - 0.9572).abs() < 1e-9);
        let angle = (c[1] - c[0]).angle(&(c[2] - c[0])).to_degrees();
        assert!((angle - 104.52).abs() < 1e-9);
        assert_eq!(water.kind(), ResidueKind::Water);
    }

    #[test]
    fn empty_system_fills_every_lattice_site() {
        let mut system = AssembledSystem::new();
        let range = solvate(
            &mut system,
            &PeriodicBox::new(6.2, 6.2, 3.1),
            &SolventParameters::default(),
        )
        .unwrap();
        assert_eq!(range, 0..12);
        assert_eq!(system.topology().count_kind(ResidueKind::Water), 4);
    }

    #[test]
    fn waters_keep_clear_of_solute() {
        let mut system = AssembledSystem::new();
        let probe = MoleculeTemplate::new(
            "G",
            vec![TemplateAtom {
                name: "N1".into(),
                element: Element::N,
            }],
            vec![],
            vec![Point3::origin()],
        )
        .unwrap();
        system
            .add_instance(&probe, vec![Point3::new(1.55, 1.55, 1.55)])
            .unwrap();
        let parameters = SolventParameters::default();
        let range = solvate(&mut system, &PeriodicBox::new(6.2, 6.2, 3.1), &parameters).unwrap();
        assert_eq!(range.len(), 9);
        let solute = system.positions()[0];
        for p in &system.positions()[range] {
            assert!((p - solute).norm() >= parameters.exclusion_radius);
        }
    }
}
