use glam::{DMat3, DVec3};

/// Default cap on the number of Jacobi rotations.
pub const DEFAULT_MAX_ITERATIONS: usize = 50;

/// Default threshold on the largest off-diagonal magnitude.
pub const DEFAULT_TOLERANCE: f64 = 1e-10;

/// Stopping criteria of the Jacobi eigenvalue iteration.
///
/// Both values are empirical. The iteration cap is a hard stop and not a
/// convergence guarantee; see [`SymmetricEigen3::converged`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JacobiParams {
    /// Maximum number of Givens rotations to apply.
    pub max_iterations: usize,
    /// The iteration stops once every off-diagonal magnitude is below this value.
    pub tolerance: f64,
}

impl Default for JacobiParams {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// A symmetric 3x3 matrix stored as its upper triangle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Symmetric3 {
    /// Element (0, 0).
    pub m00: f64,
    /// Element (0, 1), equal to (1, 0).
    pub m01: f64,
    /// Element (0, 2), equal to (2, 0).
    pub m02: f64,
    /// Element (1, 1).
    pub m11: f64,
    /// Element (1, 2), equal to (2, 1).
    pub m12: f64,
    /// Element (2, 2).
    pub m22: f64,
}

impl Symmetric3 {
    /// Create a symmetric matrix from its six distinct entries.
    pub fn new(m00: f64, m01: f64, m02: f64, m11: f64, m12: f64, m22: f64) -> Self {
        Self {
            m00,
            m01,
            m02,
            m11,
            m12,
            m22,
        }
    }

    /// Create a diagonal matrix.
    pub fn from_diagonal(d: [f64; 3]) -> Self {
        Self::new(d[0], 0.0, 0.0, d[1], 0.0, d[2])
    }

    /// Read the upper triangle of a dense matrix. The lower triangle is ignored.
    pub fn from_dmat3(m: &DMat3) -> Self {
        Self::new(
            m.x_axis.x, m.y_axis.x, m.z_axis.x, m.y_axis.y, m.z_axis.y, m.z_axis.z,
        )
    }

    /// Expand to a dense matrix.
    pub fn to_dmat3(&self) -> DMat3 {
        DMat3::from_cols(
            DVec3::new(self.m00, self.m01, self.m02),
            DVec3::new(self.m01, self.m11, self.m12),
            DVec3::new(self.m02, self.m12, self.m22),
        )
    }

    /// Multiply every entry by `s`.
    pub fn scale(&self, s: f64) -> Self {
        Self::new(
            self.m00 * s,
            self.m01 * s,
            self.m02 * s,
            self.m11 * s,
            self.m12 * s,
            self.m22 * s,
        )
    }

    fn to_rows(self) -> [[f64; 3]; 3] {
        [
            [self.m00, self.m01, self.m02],
            [self.m01, self.m11, self.m12],
            [self.m02, self.m12, self.m22],
        ]
    }
}

/// Eigenvalues and eigenvectors of a symmetric 3x3 matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymmetricEigen3 {
    /// Eigenvalues sorted in descending order.
    pub values: [f64; 3],
    /// Unit eigenvectors, `vectors[i]` belongs to `values[i]`. Signs are arbitrary.
    pub vectors: [DVec3; 3],
    /// Number of rotations applied.
    pub iterations: usize,
    /// `false` when the iteration cap was reached before the tolerance.
    /// The result is then the best approximation found.
    pub converged: bool,
}

/// Eigen decomposition of a symmetric 3x3 matrix with the default [`JacobiParams`].
///
/// Example:
///
/// ```
/// use cloudbox_linalg::eigen::{symmetric_eigen3, Symmetric3};
///
/// let eig = symmetric_eigen3(&Symmetric3::from_diagonal([3.0, 1.0, 2.0]));
/// assert_eq!(eig.values, [3.0, 2.0, 1.0]);
/// ```
pub fn symmetric_eigen3(a: &Symmetric3) -> SymmetricEigen3 {
    symmetric_eigen3_with(a, &JacobiParams::default())
}

/// Eigen decomposition of a symmetric 3x3 matrix with the Jacobi eigenvalue algorithm.
///
/// Each iteration picks the off-diagonal entry of largest magnitude and applies the
/// Givens rotation that zeroes it, accumulating the rotations into the eigenvector
/// matrix. The iteration never fails: when `params.max_iterations` is reached first
/// the current approximation is returned with `converged == false`.
///
/// # Arguments
///
/// * `a` - The symmetric input matrix.
/// * `params` - Stopping criteria.
pub fn symmetric_eigen3_with(a: &Symmetric3, params: &JacobiParams) -> SymmetricEigen3 {
    let mut a = a.to_rows();
    let mut v = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

    let mut iterations = 0;
    let mut converged = false;

    loop {
        let (p, q, max_off) = largest_off_diagonal(&a);
        if max_off < params.tolerance {
            converged = true;
            break;
        }
        if iterations == params.max_iterations {
            break;
        }

        let (cos, sin) = givens_angle(a[p][p], a[q][q], a[p][q], params.tolerance);
        rotate(&mut a, &mut v, p, q, cos, sin);
        iterations += 1;
    }

    if !converged {
        log::debug!(
            "jacobi stopped after {} iterations without reaching tolerance {:e}",
            iterations,
            params.tolerance
        );
    }

    let values = [a[0][0], a[1][1], a[2][2]];
    let column = |c: usize| DVec3::new(v[0][c], v[1][c], v[2][c]);

    let mut order = [0usize, 1, 2];
    order.sort_by(|&i, &j| values[j].total_cmp(&values[i]));

    SymmetricEigen3 {
        values: order.map(|i| values[i]),
        vectors: order.map(column),
        iterations,
        converged,
    }
}

/// Returns the position and magnitude of the largest upper off-diagonal entry.
fn largest_off_diagonal(a: &[[f64; 3]; 3]) -> (usize, usize, f64) {
    let mut best = (0, 1, 0.0);
    for (p, q) in [(0, 1), (0, 2), (1, 2)] {
        let val = a[p][q].abs();
        if val > best.2 {
            best = (p, q, val);
        }
    }
    best
}

/// Cosine and sine of the rotation that zeroes the (p, q) entry.
fn givens_angle(app: f64, aqq: f64, apq: f64, tolerance: f64) -> (f64, f64) {
    if (app - aqq).abs() < tolerance {
        let angle = std::f64::consts::FRAC_PI_4;
        return (angle.cos(), apq.signum() * angle.sin());
    }
    let tau = (aqq - app) / (2.0 * apq);
    let t = tau.signum() / (tau.abs() + (1.0 + tau * tau).sqrt());
    let cos = 1.0 / (1.0 + t * t).sqrt();
    (cos, t * cos)
}

/// Applies A' = G^T A G and V' = V G for the rotation G in the (p, q) plane.
fn rotate(a: &mut [[f64; 3]; 3], v: &mut [[f64; 3]; 3], p: usize, q: usize, cos: f64, sin: f64) {
    let app = a[p][p];
    let aqq = a[q][q];
    let apq = a[p][q];

    a[p][p] = cos * cos * app - 2.0 * sin * cos * apq + sin * sin * aqq;
    a[q][q] = sin * sin * app + 2.0 * sin * cos * apq + cos * cos * aqq;
    a[p][q] = 0.0;
    a[q][p] = 0.0;

    // the remaining index of {0, 1, 2}
    let r = 3 - p - q;
    let arp = a[r][p];
    let arq = a[r][q];
    a[r][p] = cos * arp - sin * arq;
    a[p][r] = a[r][p];
    a[r][q] = sin * arp + cos * arq;
    a[q][r] = a[r][q];

    for row in v.iter_mut() {
        let vrp = row[p];
        let vrq = row[q];
        row[p] = cos * vrp - sin * vrq;
        row[q] = sin * vrp + cos * vrq;
    }
}
