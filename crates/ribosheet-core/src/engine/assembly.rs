use super::error::AssemblyError;
use crate::core::models::system::AssembledSystem;
use crate::core::models::template::MoleculeTemplate;
use crate::core::utils::geometry::{self, Axis};
use nalgebra::{Point3, Vector3};
use rand::Rng;
use rand::seq::SliceRandom;
use std::ops::Range;
use tracing::{debug, instrument};

const Z_OFFSET_RANGE: Range<f64> = -4.5..2.0;
const IN_PLANE_JITTER: f64 = 1.0;

/// One randomized site of a sheet. Generated once per build and never modified.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementSite {
    pub row: usize,
    pub column: usize,
    /// Index into the template list the sheet was built from.
    pub template: usize,
    pub axis: Axis,
    pub angle_radians: f64,
    /// In-plane jitter on x and y, and the vertical offset on z.
    pub jitter: Vector3<f64>,
}

impl PlacementSite {
    /// Rigid translation of this site: the row advances along x and the column along y.
    pub fn translation(&self, spacing: f64) -> Vector3<f64> {
        Vector3::new(
            self.row as f64 * spacing - self.jitter.x,
            self.column as f64 * spacing - self.jitter.y,
            self.jitter.z,
        )
    }
}

fn validate_inputs(
    templates: &[&MoleculeTemplate],
    template_positions: &[Vec<Point3<f64>>],
    spacing: f64,
    required: usize,
) -> Result<(), AssemblyError> {
    if templates.len() != template_positions.len() {
        return Err(AssemblyError::TemplateCountMismatch {
            templates: templates.len(),
            positions: template_positions.len(),
        });
    }
    if templates.len() < required {
        return Err(AssemblyError::NotEnoughTemplates {
            required,
            found: templates.len(),
        });
    }
    for (index, (template, positions)) in templates.iter().zip(template_positions).enumerate() {
        if template.atom_count() != positions.len() {
            return Err(AssemblyError::ConformationMismatch {
                index,
                expected: template.atom_count(),
                found: positions.len(),
            });
        }
    }
    if !(spacing.is_finite() && spacing > 0.0) {
        return Err(AssemblyError::InvalidSpacing(spacing));
    }
    Ok(())
}

fn shifted(points: &[Point3<f64>], by: &Vector3<f64>) -> Vec<Point3<f64>> {
    points.iter().map(|p| p + by).collect()
}

/// Places a deterministic `height x width` grid. Column `c` holds template `c mod n` and the
/// pitch is `spacing * n` on both axes (columns along x, rows along y).
///
/// Returns the half-open atom range added to `system`.
#[instrument(level = "debug", skip_all, fields(height = height, width = width))]
pub fn build_regular_sheet(
    system: &mut AssembledSystem,
    height: usize,
    width: usize,
    templates: &[&MoleculeTemplate],
    template_positions: &[Vec<Point3<f64>>],
    spacing: f64,
) -> Result<Range<usize>, AssemblyError> {
    validate_inputs(templates, template_positions, spacing, 1)?;
    let start = system.atom_count();
    let n = templates.len();
    let pitch = spacing * n as f64;

    for column in 0..width {
        let choice = column % n;
        for row in 0..height {
            let offset = Vector3::new(column as f64 * pitch, row as f64 * pitch, 0.0);
            system.add_instance(
                templates[choice],
                shifted(&template_positions[choice], &offset),
            )?;
        }
    }

    let end = system.atom_count();
    debug!(start, end, "Regular sheet placed.");
    Ok(start..end)
}

/// Draws the sites of a random sheet: exactly `target` sites use template 1, the rest use
/// template 0, in shuffled order; every site gets its own axis, angle and jitter.
pub fn plan_random_sheet(
    height: usize,
    width: usize,
    target: usize,
    rng: &mut impl Rng,
) -> Result<Vec<PlacementSite>, AssemblyError> {
    let sites = height * width;
    if target > sites {
        return Err(AssemblyError::TargetOutOfRange { target, sites });
    }
    let mut choices: Vec<usize> = std::iter::repeat_n(1, target)
        .chain(std::iter::repeat_n(0, sites - target))
        .collect();
    choices.shuffle(rng);

    Ok(choices
        .into_iter()
        .enumerate()
        .map(|(k, template)| {
            let axis = Axis::ALL[rng.gen_range(0..Axis::ALL.len())];
            let angle_radians = rng.gen_range(0.0..360.0f64).to_radians();
            let jitter = Vector3::new(
                rng.gen_range(-IN_PLANE_JITTER..IN_PLANE_JITTER),
                rng.gen_range(-IN_PLANE_JITTER..IN_PLANE_JITTER),
                rng.gen_range(Z_OFFSET_RANGE),
            );
            PlacementSite {
                row: k / width.max(1),
                column: k % width.max(1),
                template,
                axis,
                angle_radians,
                jitter,
            }
        })
        .collect())
}

/// Places a randomized `height x width` sheet drawn from an exact-count multiset.
///
/// Each instance is rotated about its own centroid first, then translated to its site.
/// Returns the atom range added to `system` together with the generated sites.
#[allow(clippy::too_many_arguments)]
#[instrument(level = "debug", skip_all, fields(height = height, width = width, target = target))]
pub fn build_random_sheet(
    system: &mut AssembledSystem,
    height: usize,
    width: usize,
    templates: &[&MoleculeTemplate],
    template_positions: &[Vec<Point3<f64>>],
    target: usize,
    spacing: f64,
    rng: &mut impl Rng,
) -> Result<(Range<usize>, Vec<PlacementSite>), AssemblyError> {
    validate_inputs(templates, template_positions, spacing, 2)?;
    let sites = plan_random_sheet(height, width, target, rng)?;
    let start = system.atom_count();

    for site in &sites {
        let mut positions = template_positions[site.template].clone();
        geometry::rotate(&mut positions, site.angle_radians, site.axis);
        let positions = shifted(&positions, &site.translation(spacing));
        system.add_instance(templates[site.template], positions)?;
    }

    let end = system.atom_count();
    debug!(start, end, sites = sites.len(), "Random sheet placed.");
    Ok((start..end, sites))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Element;
    use crate::core::models::template::TemplateAtom;
    use crate::core::utils::geometry::centroid;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::f64::consts::TAU;

    fn single_atom(name: &str, element: Element) -> MoleculeTemplate {
        MoleculeTemplate::new(
            name,
            vec![TemplateAtom {
                name: element.symbol().to_string(),
                element,
            }],
            vec![],
            vec![Point3::origin()],
        )
        .unwrap()
    }

    fn triatomic(name: &str) -> MoleculeTemplate {
        MoleculeTemplate::new(
            name,
            ["C1", "O1", "H1"]
                .iter()
                .zip([Element::C, Element::O, Element::H])
                .map(|(n, e)| TemplateAtom {
                    name: n.to_string(),
                    element: e,
                })
                .collect(),
            vec![],
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.4, 0.0, 0.0),
                Point3::new(1.4, 0.9, 0.3),
            ],
        )
        .unwrap()
    }

    #[test]
    fn regular_sheet_of_single_atoms_covers_whole_system() {
        let g = single_atom("G", Element::N);
        let c = single_atom("C", Element::O);
        let mut system = AssembledSystem::new();
        let range = build_regular_sheet(
            &mut system,
            2,
            2,
            &[&g, &c],
            &[g.conformation().to_vec(), c.conformation().to_vec()],
            3.3,
        )
        .unwrap();
        assert_eq!(range, 0..4);
        assert_eq!(system.atom_count(), 4);
        assert_eq!(range.end, system.atom_count());
    }

    #[test]
    fn regular_sheet_alternates_templates_by_column_with_scaled_pitch() {
        let g = single_atom("G", Element::N);
        let c = single_atom("C", Element::O);
        let mut system = AssembledSystem::new();
        build_regular_sheet(
            &mut system,
            2,
            3,
            &[&g, &c],
            &[vec![Point3::origin()], vec![Point3::origin()]],
            3.3,
        )
        .unwrap();
        let names: Vec<_> = system
            .topology()
            .residues()
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(names, ["G", "G", "C", "C", "G", "G"]);
        // Column 1, row 1: x = 6.6, y = 6.6.
        let p = system.positions()[3];
        assert!((p.x - 6.6).abs() < 1e-12 && (p.y - 6.6).abs() < 1e-12);
    }

    #[test]
    fn empty_grid_adds_no_atoms() {
        let g = single_atom("G", Element::N);
        let mut system = AssembledSystem::new();
        let range =
            build_regular_sheet(&mut system, 0, 5, &[&g], &[vec![Point3::origin()]], 3.3).unwrap();
        assert!(range.is_empty());
        assert_eq!(system.atom_count(), 0);
    }

    #[test]
    fn regular_sheet_rejects_mismatched_inputs() {
        let g = single_atom("G", Element::N);
        let mut system = AssembledSystem::new();
        let result = build_regular_sheet(&mut system, 1, 1, &[&g], &[], 3.3);
        assert!(matches!(
            result,
            Err(AssemblyError::TemplateCountMismatch { .. })
        ));
        let result = build_regular_sheet(
            &mut system,
            1,
            1,
            &[&g],
            &[vec![Point3::origin(), Point3::origin()]],
            3.3,
        );
        assert!(matches!(
            result,
            Err(AssemblyError::ConformationMismatch { index: 0, .. })
        ));
    }

    #[test]
    fn random_plan_has_exact_counts_for_every_seed() {
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let sites = plan_random_sheet(3, 5, 6, &mut rng).unwrap();
            assert_eq!(sites.len(), 15);
            assert_eq!(sites.iter().filter(|s| s.template == 1).count(), 6);
            for site in &sites {
                assert!((0.0..TAU).contains(&site.angle_radians));
                assert!(site.jitter.x.abs() <= 1.0 && site.jitter.y.abs() <= 1.0);
                assert!((-4.5..2.0).contains(&site.jitter.z));
            }
        }
    }

    #[test]
    fn random_plan_rejects_target_above_site_count() {
        let mut rng = StdRng::seed_from_u64(1);
        let result = plan_random_sheet(2, 2, 5, &mut rng);
        assert!(matches!(
            result,
            Err(AssemblyError::TargetOutOfRange { target: 5, sites: 4 })
        ));
    }

    #[test]
    fn random_two_by_two_with_one_target_places_one_instance() {
        let d = single_atom("DRI", Element::C);
        let l = single_atom("LRI", Element::C);
        let mut system = AssembledSystem::new();
        let mut rng = StdRng::seed_from_u64(5);
        let (range, sites) = build_random_sheet(
            &mut system,
            2,
            2,
            &[&d, &l],
            &[vec![Point3::origin()], vec![Point3::origin()]],
            1,
            8.0,
            &mut rng,
        )
        .unwrap();
        assert_eq!(range, 0..4);
        assert_eq!(sites.iter().filter(|s| s.template == 1).count(), 1);
        let l_residues = system
            .topology()
            .residues()
            .iter()
            .filter(|r| r.name == "LRI")
            .count();
        assert_eq!(l_residues, 1);
    }

    #[test]
    fn random_sheet_is_reproducible_and_rotates_before_translating() {
        let d = triatomic("DRI");
        let l = triatomic("LRI");
        let conformations = vec![d.conformation().to_vec(), l.conformation().to_vec()];
        let build = |seed| {
            let mut system = AssembledSystem::new();
            let mut rng = StdRng::seed_from_u64(seed);
            let (_, sites) = build_random_sheet(
                &mut system,
                2,
                3,
                &[&d, &l],
                &conformations,
                2,
                8.0,
                &mut rng,
            )
            .unwrap();
            (system, sites)
        };
        let (first, sites) = build(11);
        let (second, _) = build(11);
        assert_eq!(first.positions(), second.positions());

        // The centroid of each instance sits at the template centroid plus the site offset.
        let template_center = centroid(d.conformation()).unwrap();
        for (k, site) in sites.iter().enumerate() {
            let placed = centroid(&first.positions()[k * 3..k * 3 + 3]).unwrap();
            let expected = template_center + site.translation(8.0);
            assert!((placed - expected).norm() < 1e-9);
        }
    }

    #[test]
    fn random_sheet_needs_two_templates() {
        let d = single_atom("DRI", Element::C);
        let mut system = AssembledSystem::new();
        let mut rng = StdRng::seed_from_u64(0);
        let result = build_random_sheet(
            &mut system,
            1,
            1,
            &[&d],
            &[vec![Point3::origin()]],
            0,
            8.0,
            &mut rng,
        );
        assert!(matches!(
            result,
            Err(AssemblyError::NotEnoughTemplates { required: 2, found: 1 })
        ));
    }
}
