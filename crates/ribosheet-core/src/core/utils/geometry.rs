use nalgebra::{Matrix3, Point3, Rotation3, SymmetricEigen, Unit, Vector3};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Cartesian axis used for rigid translations and rotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(&self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn unit(&self) -> Unit<Vector3<f64>> {
        match self {
            Axis::X => Vector3::x_axis(),
            Axis::Y => Vector3::y_axis(),
            Axis::Z => Vector3::z_axis(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid axis '{0}', expected x, y or z")]
pub struct ParseAxisError(pub String);

impl FromStr for Axis {
    type Err = ParseAxisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x" => Ok(Axis::X),
            "y" => Ok(Axis::Y),
            "z" => Ok(Axis::Z),
            _ => Err(ParseAxisError(s.to_string())),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        })
    }
}

pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Some(Point3::from(sum / points.len() as f64))
}

/// Shifts one coordinate of every point by `amount`.
pub fn translate(points: &mut [Point3<f64>], amount: f64, axis: Axis) {
    let i = axis.index();
    for p in points.iter_mut() {
        p[i] += amount;
    }
}

/// Rotates a rigid point cloud about its own centroid.
///
/// Points are treated as row vectors multiplied on the right by the right-handed axis matrix,
/// `p' = p · R(θ)`, which is the column-vector rotation by `-θ`.
pub fn rotate(points: &mut [Point3<f64>], angle_radians: f64, axis: Axis) {
    let Some(center) = centroid(points) else {
        return;
    };
    let rotation = Rotation3::from_axis_angle(&axis.unit(), -angle_radians);
    for p in points.iter_mut() {
        *p = center + rotation * (*p - center);
    }
}

/// Principal (longest) axis of a point cloud: the eigenvector of the gyration tensor with the
/// largest eigenvalue. `None` for fewer than two points.
pub fn principal_axis(points: &[Point3<f64>]) -> Option<Unit<Vector3<f64>>> {
    if points.len() < 2 {
        return None;
    }
    let center = centroid(points)?;
    let gyration = points.iter().fold(Matrix3::zeros(), |acc, p| {
        let d = p - center;
        acc + d * d.transpose()
    }) / points.len() as f64;
    let eigen = SymmetricEigen::new(gyration);
    let (column, _) = eigen
        .eigenvalues
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))?;
    Some(Unit::new_normalize(eigen.eigenvectors.column(column).into_owned()))
}
