//! Fixed layout of the sugar-on-nucleobase monolayer: conformer poses, sheet shapes and box
//! dimensions. All lengths are in Angstroms.

use super::config::SheetConfig;
use crate::core::models::frame::PeriodicBox;
use crate::core::models::template::MoleculeTemplate;
use crate::core::utils::geometry::{Axis, rotate, translate};
use nalgebra::Point3;

pub const D_SUGAR_RESIDUE: &str = "DRI";
pub const L_SUGAR_RESIDUE: &str = "LRI";
pub const GUANINE_RESIDUE: &str = "GUA";
pub const CYTOSINE_RESIDUE: &str = "CYT";

const SUGAR_LIFT: f64 = 14.0;
const SUGAR_SHIFT: f64 = 5.0;
const BOX_PADDING: f64 = 5.0;
const BOX_HEIGHT: f64 = 65.0;
const SOLVENT_HEIGHT: f64 = 60.0;
const SITE_FOOTPRINT: f64 = 10.0;

fn posed(template: &MoleculeTemplate, steps: &[Pose]) -> Vec<Point3<f64>> {
    let mut points = template.conformation().to_vec();
    for step in steps {
        match *step {
            Pose::Rotate(degrees, axis) => rotate(&mut points, degrees.to_radians(), axis),
            Pose::Translate(amount, axis) => translate(&mut points, amount, axis),
        }
    }
    points
}

#[derive(Debug, Clone, Copy)]
enum Pose {
    Rotate(f64, Axis),
    Translate(f64, Axis),
}

/// Sugar conformer lifted above the middle of the base wall.
pub fn sugar_conformer(template: &MoleculeTemplate) -> Vec<Point3<f64>> {
    posed(
        template,
        &[
            Pose::Translate(SUGAR_LIFT, Axis::Z),
            Pose::Translate(SUGAR_SHIFT, Axis::Y),
            Pose::Translate(SUGAR_SHIFT, Axis::X),
        ],
    )
}

/// Cytosine posed to face the guanine of the neighboring column.
pub fn cytosine_conformer(template: &MoleculeTemplate) -> Vec<Point3<f64>> {
    posed(
        template,
        &[
            Pose::Rotate(300.0, Axis::Z),
            Pose::Rotate(180.0, Axis::Y),
            Pose::Rotate(190.0, Axis::X),
            Pose::Translate(1.0, Axis::Z),
            Pose::Translate(4.0, Axis::X),
            Pose::Translate(4.0, Axis::Y),
        ],
    )
}

pub fn guanine_conformer(template: &MoleculeTemplate) -> Vec<Point3<f64>> {
    posed(
        template,
        &[
            Pose::Rotate(-50.0, Axis::Z),
            Pose::Translate(4.7, Axis::X),
            Pose::Translate(4.0, Axis::Y),
            Pose::Translate(1.0, Axis::Z),
        ],
    )
}

/// Rows and columns of the base wall under a sugar layer: one extra row, and an even number
/// of columns wide enough to cover the layer.
pub fn base_wall_shape(sheet: &SheetConfig) -> (usize, usize) {
    (sheet.height + 1, (sheet.width / 2 + 1) * 2)
}

pub fn simulation_box(sheet: &SheetConfig) -> PeriodicBox {
    PeriodicBox::new(
        sheet.height as f64 * SITE_FOOTPRINT + BOX_PADDING,
        sheet.width as f64 * SITE_FOOTPRINT + BOX_PADDING,
        BOX_HEIGHT,
    )
}

pub fn solvent_region(sheet: &SheetConfig) -> PeriodicBox {
    PeriodicBox::new(
        sheet.height as f64 * SITE_FOOTPRINT,
        sheet.width as f64 * SITE_FOOTPRINT,
        SOLVENT_HEIGHT,
    )
}
