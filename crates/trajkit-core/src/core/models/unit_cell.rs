use nalgebra::{Matrix3, Vector3};

const RIGHT_ANGLE_TOLERANCE_DEG: f64 = 1e-3;

/// Periodic simulation box attached to a frame.
///
/// Triclinic cells store the three cell vectors as the columns of `matrix`,
/// in Angstroms. Orthorhombic cells only keep their edge lengths since the
/// matrix is diagonal.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum UnitCell {
    /// No periodicity (gas-phase systems, or files without box information).
    #[default]
    Infinite,
    /// Rectangular box with edges along the Cartesian axes.
    Orthorhombic { lengths: Vector3<f64> },
    /// General box described by its cell vectors.
    Triclinic { matrix: Matrix3<f64> },
}

impl UnitCell {
    /// Builds a unit cell from edge lengths (Å) and angles (degrees), following
    /// the `CRYST1` convention: `a` lies along x and `b` in the xy-plane.
    ///
    /// Zero lengths yield [`UnitCell::Infinite`], right angles yield an
    /// orthorhombic cell.
    pub fn from_lengths_and_angles(lengths: [f64; 3], angles: [f64; 3]) -> Self {
        let [a, b, c] = lengths;
        if a <= 0.0 && b <= 0.0 && c <= 0.0 {
            return UnitCell::Infinite;
        }
        let [alpha, beta, gamma] = angles;
        if angles
            .iter()
            .all(|angle| (angle - 90.0).abs() < RIGHT_ANGLE_TOLERANCE_DEG)
        {
            return UnitCell::Orthorhombic {
                lengths: Vector3::new(a, b, c),
            };
        }

        let (cos_a, cos_b) = (alpha.to_radians().cos(), beta.to_radians().cos());
        let (sin_g, cos_g) = gamma.to_radians().sin_cos();

        let cx = c * cos_b;
        let cy = c * (cos_a - cos_b * cos_g) / sin_g;
        let cz = (c * c - cx * cx - cy * cy).max(0.0).sqrt();

        UnitCell::Triclinic {
            matrix: Matrix3::new(
                a, b * cos_g, cx, //
                0.0, b * sin_g, cy, //
                0.0, 0.0, cz,
            ),
        }
    }

    /// Builds a unit cell from a matrix whose columns are the cell vectors.
    pub fn from_matrix(matrix: Matrix3<f64>) -> Self {
        if matrix.iter().all(|v| *v == 0.0) {
            return UnitCell::Infinite;
        }
        let off_diagonal_is_zero = (0..3)
            .flat_map(|i| (0..3).map(move |j| (i, j)))
            .filter(|(i, j)| i != j)
            .all(|(i, j)| matrix[(i, j)] == 0.0);
        if off_diagonal_is_zero {
            UnitCell::Orthorhombic {
                lengths: matrix.diagonal(),
            }
        } else {
            UnitCell::Triclinic { matrix }
        }
    }

    pub fn is_periodic(&self) -> bool {
        !matches!(self, UnitCell::Infinite)
    }

    /// Cell vectors as matrix columns; `None` for an infinite cell.
    pub fn matrix(&self) -> Option<Matrix3<f64>> {
        match self {
            UnitCell::Infinite => None,
            UnitCell::Orthorhombic { lengths } => Some(Matrix3::from_diagonal(lengths)),
            UnitCell::Triclinic { matrix } => Some(*matrix),
        }
    }

    /// Edge lengths `(a, b, c)` in Angstroms.
    pub fn lengths(&self) -> Option<Vector3<f64>> {
        match self {
            UnitCell::Infinite => None,
            UnitCell::Orthorhombic { lengths } => Some(*lengths),
            UnitCell::Triclinic { matrix } => Some(Vector3::new(
                matrix.column(0).norm(),
                matrix.column(1).norm(),
                matrix.column(2).norm(),
            )),
        }
    }

    /// Cell angles `(alpha, beta, gamma)` in degrees.
    pub fn angles(&self) -> Option<Vector3<f64>> {
        match self {
            UnitCell::Infinite => None,
            UnitCell::Orthorhombic { .. } => Some(Vector3::new(90.0, 90.0, 90.0)),
            UnitCell::Triclinic { matrix } => {
                let (a, b, c) = (matrix.column(0), matrix.column(1), matrix.column(2));
                Some(Vector3::new(
                    b.angle(&c).to_degrees(),
                    a.angle(&c).to_degrees(),
                    a.angle(&b).to_degrees(),
                ))
            }
        }
    }

    pub fn volume(&self) -> f64 {
        match self {
            UnitCell::Infinite => 0.0,
            UnitCell::Orthorhombic { lengths } => lengths.x * lengths.y * lengths.z,
            UnitCell::Triclinic { matrix } => matrix.determinant().abs(),
        }
    }

    /// Applies the minimum-image convention to a displacement vector.
    ///
    /// Triclinic cells go through fractional coordinates, which is exact as
    /// long as the cell is not too skewed. The cell inverse is recomputed on
    /// every call; hot loops should use [`crate::core::neighbors::CellList`].
    pub fn minimum_image(&self, delta: Vector3<f64>) -> Vector3<f64> {
        match self {
            UnitCell::Infinite => delta,
            UnitCell::Orthorhombic { lengths } => wrap_orthorhombic(delta, lengths),
            UnitCell::Triclinic { matrix } => match matrix.try_inverse() {
                Some(inverse) => wrap_fractional(delta, matrix, &inverse),
                None => delta,
            },
        }
    }
}

pub(crate) fn wrap_orthorhombic(delta: Vector3<f64>, lengths: &Vector3<f64>) -> Vector3<f64> {
    delta.zip_map(lengths, |d, l| if l > 0.0 { d - (d / l).round() * l } else { d })
}

pub(crate) fn wrap_fractional(
    delta: Vector3<f64>,
    matrix: &Matrix3<f64>,
    inverse: &Matrix3<f64>,
) -> Vector3<f64> {
    let fractional = inverse * delta;
    matrix * fractional.map(|f| f - f.round())
}
