use crate::{Float, Point3f, Vec3f, Normal3, Bounds3f, Ray, ComponentWiseExt, RayDifferential, Differential};
use crate::error::{Error, Result};
use cgmath::{Matrix, Matrix4, SquareMatrix, InnerSpace, Transform as cgTransform, Rad};
use crate::err_float::gamma;
use bytemuck::{Pod, Zeroable};

#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(C)]
pub struct Transform {
    pub t: Matrix4<Float>,
    pub invt: Matrix4<Float>
}

// SAFETY: Matrix4 is #[repr(C)] over four #[repr(C)] Vector4<f32> columns: 32 f32s, no padding.
unsafe impl Zeroable for Transform {}
unsafe impl Pod for Transform {}

const IDENTITY_MAT4: Matrix4<Float> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 1.0, 0.0,
    0.0, 0.0, 0.0, 1.0
);

impl Transform {

    pub const IDENTITY: Self = Transform::new(IDENTITY_MAT4, IDENTITY_MAT4);

    pub fn from_mat(mat: Matrix4<Float>) -> Result<Self> {
        let m_inv = mat.invert()
            .ok_or_else(|| Error::InvalidInput("transform matrix is singular".to_string()))?;
        Ok(Self::new(mat, m_inv))
    }

    pub const fn new(t: Matrix4<Float>, invt: Matrix4<Float>) -> Self {
        Self { t, invt }
    }

    pub fn translate(delta: Vec3f) -> Self {
        let m = Matrix4::from_translation(delta);
        let m_inv = Matrix4::from_translation(-delta);
        Self::new(m, m_inv)
    }

    pub fn scale(sx: Float, sy: Float, sz: Float) -> Self {
        let m = Matrix4::from_nonuniform_scale(sx, sy, sz);
        let m_inv = Matrix4::from_nonuniform_scale(1.0 / sx, 1.0 / sy, 1.0 / sz);
        Self::new(m, m_inv)
    }

    // rotations are orthogonal, so the inverse is the transpose
    pub fn rotate_x(theta: impl Into<Rad<Float>>) -> Self {
        let m = Matrix4::from_angle_x(theta);
        Self::new(m, m.transpose())
    }

    pub fn rotate_y(theta: impl Into<Rad<Float>>) -> Self {
        let m = Matrix4::from_angle_y(theta);
        Self::new(m, m.transpose())
    }

    pub fn rotate_z(theta: impl Into<Rad<Float>>) -> Self {
        let m = Matrix4::from_angle_z(theta);
        Self::new(m, m.transpose())
    }

    pub fn inverse(&self) -> Self {
        Self::new(self.invt, self.t)
    }

    pub fn is_identity(&self) -> bool {
        self.t == IDENTITY_MAT4
    }

    /// `self` followed by `next`.
    pub fn then(self, next: Self) -> Self {
        next * self
    }

    pub fn swaps_handedness(&self) -> bool {
        let m = self.t;
        let det = m[0][0] * (m[1][1] * m[2][2] - m[2][1] * m[1][2])
            - m[1][0] * (m[0][1] * m[2][2] - m[2][1] * m[0][2])
            + m[2][0] * (m[0][1] * m[1][2] - m[1][1] * m[0][2]);
        det < 0.0
    }

    /// Normals go through the inverse transpose to stay perpendicular to transformed tangents.
    pub fn transform_normal(&self, n: &Normal3) -> Normal3 {
        let m = &self.invt;
        let row = |i: usize| m[i][0] * n.x + m[i][1] * n.y + m[i][2] * n.z;
        Normal3(vec3f!(row(0), row(1), row(2)))
    }

    pub fn transform<T: Transformable>(&self, obj: T) -> T {
        obj.transform(*self)
    }

    pub fn tf_exact_to_err<T: TransformableErr>(&self, obj: T) -> (T, T::Err) {
        obj.tf_exact_to_err(*self)
    }

    pub fn tf_err_to_err<T: TransformableErr>(&self, obj: T, err: T::Err) -> (T, T::Err) {
        obj.tf_err_to_err(err, *self)
    }
}

impl std::ops::Mul for Transform {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::new(self.t * rhs.t, rhs.invt * self.invt)
    }
}

pub trait Transformable: Sized {
    fn transform(&self, t: Transform) -> Self;
}

/// Transformations that also produce a conservative bound on the absolute rounding error
/// they introduce.
pub trait TransformableErr: Transformable {
    type Err;

    fn tf_exact_to_err(&self, t: Transform) -> (Self, Self::Err);

    fn tf_err_to_err(&self, err: Self::Err, t: Transform) -> (Self, Self::Err);
}

/// Sum of |m_ij * v_j| over the upper-left 3x3 block for each output row.
fn abs_sums(m: &Matrix4<Float>, v: Vec3f) -> Vec3f {
    vec3f!(
        (m[0][0] * v.x).abs() + (m[1][0] * v.y).abs() + (m[2][0] * v.z).abs(),
        (m[0][1] * v.x).abs() + (m[1][1] * v.y).abs() + (m[2][1] * v.z).abs(),
        (m[0][2] * v.x).abs() + (m[1][2] * v.y).abs() + (m[2][2] * v.z).abs()
    )
}

fn abs_translation(m: &Matrix4<Float>) -> Vec3f {
    vec3f!(m[3][0].abs(), m[3][1].abs(), m[3][2].abs())
}

impl Transformable for Vec3f {
    fn transform(&self, t: Transform) -> Self {
        t.t.transform_vector(*self)
    }
}

impl TransformableErr for Vec3f {
    type Err = Vec3f;

    fn tf_exact_to_err(&self, tf: Transform) -> (Self, Self::Err) {
        let vt = tf.t.transform_vector(*self);
        let v_error = abs_sums(&tf.t, *self) * gamma(3);
        (vt, v_error)
    }

    fn tf_err_to_err(&self, err: Self::Err, tf: Transform) -> (Self, Self::Err) {
        let vt = tf.t.transform_vector(*self);
        let v_error = (gamma(3) + 1.0) * abs_sums(&tf.t, err) + gamma(3) * abs_sums(&tf.t, *self);
        (vt, v_error)
    }
}

impl Transformable for Point3f {
    fn transform(&self, t: Transform) -> Self { t.t.transform_point(*self) }
}

impl TransformableErr for Point3f {
    type Err = Vec3f;

    fn tf_exact_to_err(&self, tf: Transform) -> (Self, Self::Err) {
        let pt = tf.t.transform_point(*self);
        let v = vec3f!(self.x, self.y, self.z);
        let p_error = (abs_sums(&tf.t, v) + abs_translation(&tf.t)) * gamma(3);
        (pt, p_error)
    }

    fn tf_err_to_err(&self, err: Self::Err, tf: Transform) -> (Self, Self::Err) {
        let pt = tf.t.transform_point(*self);
        let v = vec3f!(self.x, self.y, self.z);
        let p_error = (gamma(3) + 1.0) * abs_sums(&tf.t, err)
            + gamma(3) * (abs_sums(&tf.t, v) + abs_translation(&tf.t));
        (pt, p_error)
    }
}

impl Transformable for Normal3 {
    fn transform(&self, t: Transform) -> Self {
        t.transform_normal(self)
    }
}

impl Transformable for Bounds3f {
    fn transform(&self, t: Transform) -> Self {
        if self.is_empty() {
            return *self;
        }
        self.iter_corners().fold(Bounds3f::empty(), |b, p| {
            let pt = t.transform(p);
            b.join_point(pt)
        })
    }
}

/// Push a transformed origin along `dir` past its error box so the ray cannot start behind the
/// surface it left, shortening `t_max` by the same amount.
fn offset_past_error(origin: Point3f, o_err: Vec3f, dir: Vec3f, t_max: Float) -> (Point3f, Float) {
    let len_sq = dir.magnitude2();
    if len_sq <= 0.0 {
        return (origin, t_max);
    }
    let dt = dir.abs().dot(o_err) / len_sq;
    (origin + dir * dt, t_max - dt)
}

impl TransformableErr for Ray {
    type Err = (Vec3f, Vec3f);

    fn tf_exact_to_err(&self, t: Transform) -> (Self, Self::Err) {
        let (origin, o_err) = t.tf_exact_to_err(self.origin);
        let (dir, d_err) = t.tf_exact_to_err(self.dir);
        let (origin, t_max) = offset_past_error(origin, o_err, dir, self.t_max);
        (Ray { origin, dir, t_max, time: self.time }, (o_err, d_err))
    }

    fn tf_err_to_err(&self, (o_err, d_err): Self::Err, t: Transform) -> (Self, Self::Err) {
        let (origin, o_err) = t.tf_err_to_err(self.origin, o_err);
        let (dir, d_err) = t.tf_err_to_err(self.dir, d_err);
        let (origin, t_max) = offset_past_error(origin, o_err, dir, self.t_max);
        (Ray { origin, dir, t_max, time: self.time }, (o_err, d_err))
    }
}

impl Transformable for Ray {
    fn transform(&self, t: Transform) -> Ray {
        let (ray, _) = self.tf_exact_to_err(t);
        ray
    }
}

impl Transformable for RayDifferential {
    fn transform(&self, t: Transform) -> Self {
        RayDifferential {
            ray: self.ray.transform(t),
            diff: self.diff.map(|diff| {
                Differential {
                    rx_origin: diff.rx_origin.transform(t),
                    ry_origin: diff.ry_origin.transform(t),
                    rx_dir: diff.rx_dir.transform(t),
                    ry_dir: diff.ry_dir.transform(t),
                }
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{vec3, Deg};
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_point_transform() {
        // translate, then scale
        let tf = Transform::translate(vec3(1.0, 1.0, 1.0)).then(Transform::scale(2.0, 2.0, 2.0));

        let p = Point3f::new(1.0, 1.0, 1.0);
        let perr = Vec3f::new(0.0001, 0.0001, 0.0001);
        let (pt, pterr) = tf.tf_err_to_err(p, perr);

        assert_abs_diff_eq!(Point3f::new(4.0, 4.0, 4.0), pt, epsilon = 0.00001);
        assert_abs_diff_eq!(2.0 * perr, pterr, epsilon = 0.000001);
    }

    #[test]
    fn test_vec_transform() {
        // translate, then scale. Translate should do nothing as opposed to point.
        let tf = Transform::scale(2.0, 2.0, 2.0) *
            Transform::translate(vec3(1.0, 1.0, 1.0));

        let v = Vec3f::new(1.0, 1.0, 1.0);
        let verr = Vec3f::new(0.0001, 0.0001, 0.0001);
        let (vt, vterr) = tf.tf_err_to_err(v, verr);

        assert_abs_diff_eq!(Vec3f::new(2.0, 2.0, 2.0), vt, epsilon = 0.00001);
        assert_abs_diff_eq!(2.0 * verr, vterr, epsilon = 0.000001);
    }

    #[test]
    fn test_identity() {
        let tf = Transform::IDENTITY;
        let p = Point3f::new(0.0, 0.0, 0.0);

        let pt = tf.transform(p);
        assert_abs_diff_eq!(Point3f::new(0.0, 0.0, 0.0), pt, epsilon = 0.000001);
        assert!(tf.is_identity());
    }

    #[test]
    fn handedness() {
        assert!(!Transform::IDENTITY.swaps_handedness());
        assert!(!Transform::rotate_z(Deg(30.0)).swaps_handedness());
        assert!(Transform::scale(-1.0, 1.0, 1.0).swaps_handedness());
        assert!(!Transform::scale(-1.0, -1.0, 1.0).swaps_handedness());
    }

    #[test]
    fn normal_stays_perpendicular() {
        let tf = Transform::scale(1.0, 4.0, 1.0) * Transform::rotate_x(Deg(20.0));
        let v = Vec3f::new(1.0, 1.0, 0.0);
        let n = Normal3::new(1.0, -1.0, 0.0);
        let vt = tf.transform(v);
        let nt = tf.transform(n);
        assert_abs_diff_eq!(vt.dot(nt.0), 0.0, epsilon = 1.0e-5);
    }

    #[test]
    fn bounds_transform() {
        let b = bounds3f!((-1, -1, -1), (1, 1, 1));
        let tb = Transform::translate(vec3(2.0, 0.0, 0.0)).transform(b);
        assert_abs_diff_eq!(tb.min, point3f!(1, -1, -1), epsilon = 1.0e-6);
        assert_abs_diff_eq!(tb.max, point3f!(3, 1, 1), epsilon = 1.0e-6);
    }

    #[test]
    fn from_singular_matrix() {
        let m = Matrix4::from_nonuniform_scale(1.0, 0.0, 1.0);
        assert!(Transform::from_mat(m).is_err());
    }
}
