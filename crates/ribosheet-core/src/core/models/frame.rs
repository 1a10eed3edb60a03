use nalgebra::{Point3, Vector3};

/// Orthorhombic periodic box, edge lengths in Angstroms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodicBox {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl PeriodicBox {
    pub fn new(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    pub fn lengths(&self) -> Vector3<f64> {
        Vector3::new(self.a, self.b, self.c)
    }

    pub fn volume(&self) -> f64 {
        self.a * self.b * self.c
    }

    pub fn is_valid(&self) -> bool {
        [self.a, self.b, self.c]
            .iter()
            .all(|edge| edge.is_finite() && *edge > 0.0)
    }

    /// Minimum-image displacement from `from` to `to`.
    pub fn minimum_image(&self, from: &Point3<f64>, to: &Point3<f64>) -> Vector3<f64> {
        let mut d = to - from;
        for (i, edge) in [self.a, self.b, self.c].into_iter().enumerate() {
            d[i] -= edge * (d[i] / edge).round();
        }
        d
    }
}

/// One trajectory snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub positions: Vec<Point3<f64>>,
    pub periodic_box: Option<PeriodicBox>,
}

impl Frame {
    pub fn new(positions: Vec<Point3<f64>>, periodic_box: Option<PeriodicBox>) -> Self {
        Self {
            positions,
            periodic_box,
        }
    }

    pub fn atom_count(&self) -> usize {
        self.positions.len()
    }

    /// Displacement between two atoms, using the minimum image when a box is present.
    pub fn displacement(&self, from: usize, to: usize) -> Vector3<f64> {
        let (a, b) = (&self.positions[from], &self.positions[to]);
        match &self.periodic_box {
            Some(cell) => cell.minimum_image(a, b),
            None => b - a,
        }
    }
}
