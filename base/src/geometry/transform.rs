//! Transformations

use super::{Bounds3f, Normal3f, Point3f, Union, Vector3f};
use crate::pbrt::{abs, Float};
use std::ops::Mul;

/// A 4x4 row-major matrix.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Matrix4x4 {
    /// Matrix elements indexed `[row][column]`.
    pub m: [[Float; 4]; 4],
}

impl Matrix4x4 {
    /// Returns the identity matrix.
    pub const IDENTITY: Self = Self {
        m: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Returns the transposed matrix.
    pub fn transpose(&self) -> Self {
        let mut m = [[0.0; 4]; 4];
        for (i, row) in m.iter_mut().enumerate() {
            for (j, v) in row.iter_mut().enumerate() {
                *v = self.m[j][i];
            }
        }
        Self { m }
    }

    /// Returns the inverse using Gauss-Jordan elimination with full
    /// pivoting, or `None` if the matrix is singular.
    pub fn inverse(&self) -> Option<Self> {
        let mut indxc = [0; 4];
        let mut indxr = [0; 4];
        let mut ipiv = [0; 4];
        let mut minv = self.m;

        for i in 0..4 {
            let mut irow = 0;
            let mut icol = 0;
            let mut big: Float = 0.0;

            for j in 0..4 {
                if ipiv[j] == 1 {
                    continue;
                }
                for k in 0..4 {
                    if ipiv[k] == 0 {
                        if abs(minv[j][k]) >= big {
                            big = abs(minv[j][k]);
                            irow = j;
                            icol = k;
                        }
                    } else if ipiv[k] > 1 {
                        return None;
                    }
                }
            }
            ipiv[icol] += 1;

            if irow != icol {
                minv.swap(irow, icol);
            }
            indxr[i] = irow;
            indxc[i] = icol;
            if minv[icol][icol] == 0.0 {
                return None;
            }

            let pivinv = 1.0 / minv[icol][icol];
            minv[icol][icol] = 1.0;
            for v in minv[icol].iter_mut() {
                *v *= pivinv;
            }

            for j in 0..4 {
                if j != icol {
                    let save = minv[j][icol];
                    minv[j][icol] = 0.0;
                    for k in 0..4 {
                        minv[j][k] -= minv[icol][k] * save;
                    }
                }
            }
        }

        for j in (0..4).rev() {
            if indxr[j] != indxc[j] {
                for row in minv.iter_mut() {
                    row.swap(indxr[j], indxc[j]);
                }
            }
        }

        Some(Self { m: minv })
    }
}

impl Default for Matrix4x4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Matrix4x4 {
    type Output = Self;

    fn mul(self, other: Self) -> Self {
        let mut m = [[0.0; 4]; 4];
        for (i, row) in m.iter_mut().enumerate() {
            for (j, v) in row.iter_mut().enumerate() {
                *v = (0..4).map(|k| self.m[i][k] * other.m[k][j]).sum();
            }
        }
        Self { m }
    }
}

/// An affine transformation along with its inverse.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Transform {
    /// The transformation matrix.
    pub m: Matrix4x4,

    /// The inverse of the transformation matrix.
    pub m_inv: Matrix4x4,
}

impl Transform {
    /// The identity transformation.
    pub const IDENTITY: Self = Self {
        m: Matrix4x4::IDENTITY,
        m_inv: Matrix4x4::IDENTITY,
    };

    /// Creates a transformation from a matrix. Panics if the matrix is
    /// singular.
    ///
    /// * `m` - The matrix.
    pub fn new(m: Matrix4x4) -> Self {
        match m.inverse() {
            Some(m_inv) => Self { m, m_inv },
            None => panic!("singular transformation matrix {:?}", m),
        }
    }

    /// Returns a translation.
    ///
    /// * `delta` - Displacement.
    pub fn translate(delta: &Vector3f) -> Self {
        let mut m = Matrix4x4::IDENTITY;
        let mut m_inv = Matrix4x4::IDENTITY;
        for (i, d) in [delta.x, delta.y, delta.z].into_iter().enumerate() {
            m.m[i][3] = d;
            m_inv.m[i][3] = -d;
        }
        Self { m, m_inv }
    }

    /// Returns a non-uniform scale. Panics on a zero scale factor.
    ///
    /// * `x` - Scale along x-axis.
    /// * `y` - Scale along y-axis.
    /// * `z` - Scale along z-axis.
    pub fn scale(x: Float, y: Float, z: Float) -> Self {
        assert!(x != 0.0 && y != 0.0 && z != 0.0, "zero scale factor");
        let mut m = Matrix4x4::IDENTITY;
        let mut m_inv = Matrix4x4::IDENTITY;
        for (i, s) in [x, y, z].into_iter().enumerate() {
            m.m[i][i] = s;
            m_inv.m[i][i] = 1.0 / s;
        }
        Self { m, m_inv }
    }

    /// Returns a rotation about an arbitrary axis.
    ///
    /// * `theta` - Angle in degrees.
    /// * `axis`  - Axis of rotation.
    pub fn rotate(theta: Float, axis: &Vector3f) -> Self {
        let a = axis.normalize();
        let (sin_theta, cos_theta) = theta.to_radians().sin_cos();
        let mut m = Matrix4x4::IDENTITY;

        m.m[0][0] = a.x * a.x + (1.0 - a.x * a.x) * cos_theta;
        m.m[0][1] = a.x * a.y * (1.0 - cos_theta) - a.z * sin_theta;
        m.m[0][2] = a.x * a.z * (1.0 - cos_theta) + a.y * sin_theta;

        m.m[1][0] = a.x * a.y * (1.0 - cos_theta) + a.z * sin_theta;
        m.m[1][1] = a.y * a.y + (1.0 - a.y * a.y) * cos_theta;
        m.m[1][2] = a.y * a.z * (1.0 - cos_theta) - a.x * sin_theta;

        m.m[2][0] = a.x * a.z * (1.0 - cos_theta) - a.y * sin_theta;
        m.m[2][1] = a.y * a.z * (1.0 - cos_theta) + a.x * sin_theta;
        m.m[2][2] = a.z * a.z + (1.0 - a.z * a.z) * cos_theta;

        // Rotations are orthogonal.
        Self {
            m,
            m_inv: m.transpose(),
        }
    }

    /// Returns the inverse transformation.
    pub fn inverse(&self) -> Self {
        Self {
            m: self.m_inv,
            m_inv: self.m,
        }
    }

    /// Returns true if this is the identity transformation.
    pub fn is_identity(&self) -> bool {
        self.m == Matrix4x4::IDENTITY
    }

    /// Returns the matrix bit patterns, usable as an exact hash key.
    pub fn bits(&self) -> [u32; 16] {
        let mut bits = [0; 16];
        for (i, b) in bits.iter_mut().enumerate() {
            *b = self.m.m[i / 4][i % 4].to_bits();
        }
        bits
    }

    /// Transforms a point.
    ///
    /// * `p` - The point.
    pub fn transform_point(&self, p: &Point3f) -> Point3f {
        let m = &self.m.m;
        let xp = m[0][0] * p.x + m[0][1] * p.y + m[0][2] * p.z + m[0][3];
        let yp = m[1][0] * p.x + m[1][1] * p.y + m[1][2] * p.z + m[1][3];
        let zp = m[2][0] * p.x + m[2][1] * p.y + m[2][2] * p.z + m[2][3];
        let wp = m[3][0] * p.x + m[3][1] * p.y + m[3][2] * p.z + m[3][3];
        if wp == 1.0 {
            Point3f::new(xp, yp, zp)
        } else {
            Point3f::new(xp, yp, zp) / wp
        }
    }

    /// Transforms a vector.
    ///
    /// * `v` - The vector.
    pub fn transform_vector(&self, v: &Vector3f) -> Vector3f {
        let m = &self.m.m;
        Vector3f::new(
            m[0][0] * v.x + m[0][1] * v.y + m[0][2] * v.z,
            m[1][0] * v.x + m[1][1] * v.y + m[1][2] * v.z,
            m[2][0] * v.x + m[2][1] * v.y + m[2][2] * v.z,
        )
    }

    /// Transforms a normal with the inverse transpose.
    ///
    /// * `n` - The normal.
    pub fn transform_normal(&self, n: &Normal3f) -> Normal3f {
        let mi = &self.m_inv.m;
        Normal3f {
            x: mi[0][0] * n.x + mi[1][0] * n.y + mi[2][0] * n.z,
            y: mi[0][1] * n.x + mi[1][1] * n.y + mi[2][1] * n.z,
            z: mi[0][2] * n.x + mi[1][2] * n.y + mi[2][2] * n.z,
        }
    }

    /// Transforms a bounding box by transforming its 8 corners.
    ///
    /// * `b` - The bounding box.
    pub fn transform_bounds(&self, b: &Bounds3f) -> Bounds3f {
        if b.is_empty() {
            return *b;
        }
        (0..8).fold(Bounds3f::empty(), |acc, i| {
            let corner = Point3f::new(
                b[i & 1].x,
                b[(i >> 1) & 1].y,
                b[(i >> 2) & 1].z,
            );
            acc.union(&self.transform_point(&corner))
        })
    }

    /// Returns true if the transformation changes a coordinate system's
    /// handedness.
    pub fn swaps_handedness(&self) -> bool {
        let m = &self.m.m;
        let det = m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0]);
        det < 0.0
    }
}

impl Mul for Transform {
    type Output = Self;

    /// Composes two transformations; `self` is applied last.
    fn mul(self, other: Self) -> Self {
        Self {
            m: self.m * other.m,
            m_inv: other.m_inv * self.m_inv,
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
