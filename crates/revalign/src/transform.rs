//! Alignment transforms between the two revisions' pixel spaces.
//!
//! Every transform maps revision-B pixel coordinates into revision-A pixel
//! coordinates.

use nalgebra::{Matrix3, Vector3};

/// Below this |w| a projected point is treated as lying at infinity.
const W_EPS: f64 = 1e-12;

/// Transform family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TransformKind {
    /// Full projective transform (8 DOF) from automatic alignment.
    Homography,
    /// Uniform scale + rotation + translation (4 DOF) from manual anchors.
    Similarity,
    /// No-op mapping.
    Identity,
}

/// A B → A mapping computed for one page pair.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignmentTransform {
    pub kind: TransformKind,
    /// Row-major 3×3 matrix.
    #[serde(with = "matrix_rows")]
    pub matrix: Matrix3<f64>,
    /// RANSAC inlier ratio; only set for [`TransformKind::Homography`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inlier_ratio: Option<f64>,
}

impl AlignmentTransform {
    pub fn identity() -> Self {
        Self {
            kind: TransformKind::Identity,
            matrix: Matrix3::identity(),
            inlier_ratio: None,
        }
    }

    /// Homography normalized so that `h[(2, 2)] == 1` when possible.
    pub fn homography(matrix: Matrix3<f64>, inlier_ratio: f64) -> Self {
        let s = matrix[(2, 2)];
        let matrix = if s.abs() > W_EPS { matrix / s } else { matrix };
        Self {
            kind: TransformKind::Homography,
            matrix,
            inlier_ratio: Some(inlier_ratio),
        }
    }

    /// Similarity `x' = s·R(θ)·x + t`.
    pub fn similarity(scale: f64, theta: f64, tx: f64, ty: f64) -> Self {
        let (sin, cos) = theta.sin_cos();
        let a = scale * cos;
        let b = scale * sin;
        Self {
            kind: TransformKind::Similarity,
            matrix: Matrix3::new(a, -b, tx, b, a, ty, 0.0, 0.0, 1.0),
            inlier_ratio: None,
        }
    }

    /// Map a B-frame point into the A frame.
    ///
    /// Returns `None` for homographies that send the point to infinity.
    pub fn apply(&self, p: [f64; 2]) -> Option<[f64; 2]> {
        match self.kind {
            TransformKind::Identity => Some(p),
            TransformKind::Similarity => {
                let m = &self.matrix;
                Some([
                    m[(0, 0)] * p[0] + m[(0, 1)] * p[1] + m[(0, 2)],
                    m[(1, 0)] * p[0] + m[(1, 1)] * p[1] + m[(1, 2)],
                ])
            }
            TransformKind::Homography => project(&self.matrix, p),
        }
    }

    /// Uniform scale implied by the linear part: `sqrt(|det(M₂ₓ₂)|)`.
    pub fn scale_factor(&self) -> f64 {
        match self.kind {
            TransformKind::Identity => 1.0,
            _ => linear_scale(&self.matrix),
        }
    }

    /// A → B mapping, or `None` when the matrix is singular.
    pub fn inverse(&self) -> Option<Self> {
        match self.kind {
            TransformKind::Identity => Some(self.clone()),
            TransformKind::Similarity => Some(Self {
                kind: TransformKind::Similarity,
                matrix: self.matrix.try_inverse()?,
                inlier_ratio: None,
            }),
            TransformKind::Homography => {
                let inv = self.matrix.try_inverse()?;
                Some(Self::homography(inv, self.inlier_ratio.unwrap_or(0.0)))
            }
        }
    }

    /// Largest displacement of any of `points` under this transform.
    pub fn max_displacement(&self, points: &[[f64; 2]]) -> f64 {
        points
            .iter()
            .map(|&p| match self.apply(p) {
                Some(q) => ((q[0] - p[0]).powi(2) + (q[1] - p[1]).powi(2)).sqrt(),
                None => f64::INFINITY,
            })
            .fold(0.0, f64::max)
    }

    /// Matrix as row-major nested arrays.
    pub fn to_rows(&self) -> [[f64; 3]; 3] {
        matrix3_to_array(&self.matrix)
    }
}

/// Project through a 3×3 homography with w-normalization.
pub fn project(h: &Matrix3<f64>, p: [f64; 2]) -> Option<[f64; 2]> {
    let v = h * Vector3::new(p[0], p[1], 1.0);
    let w = v[2];
    if !w.is_finite() || w.abs() < W_EPS {
        return None;
    }
    let out = [v[0] / w, v[1] / w];
    (out[0].is_finite() && out[1].is_finite()).then_some(out)
}

pub(crate) fn linear_scale(m: &Matrix3<f64>) -> f64 {
    let s = m[(2, 2)];
    let s = if s.abs() > W_EPS { s } else { 1.0 };
    let det = (m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)]) / (s * s);
    det.abs().sqrt()
}

pub(crate) fn matrix3_to_array(m: &Matrix3<f64>) -> [[f64; 3]; 3] {
    [
        [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
        [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
        [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
    ]
}

pub(crate) fn array_to_matrix3(rows: &[[f64; 3]; 3]) -> Matrix3<f64> {
    Matrix3::new(
        rows[0][0], rows[0][1], rows[0][2], rows[1][0], rows[1][1], rows[1][2], rows[2][0],
        rows[2][1], rows[2][2],
    )
}

mod matrix_rows {
    use nalgebra::Matrix3;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(m: &Matrix3<f64>, s: S) -> Result<S::Ok, S::Error> {
        super::matrix3_to_array(m).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Matrix3<f64>, D::Error> {
        let rows = <[[f64; 3]; 3]>::deserialize(d)?;
        Ok(super::array_to_matrix3(&rows))
    }
}
