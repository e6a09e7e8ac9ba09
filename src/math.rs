use crate::{EFloat, Float, Vec2f};
use crate::err_float::MACHINE_EPSILON;
use cgmath::{Matrix2, SquareMatrix};

pub fn lerp(t: Float, v1: Float, v2: Float) -> Float {
    (1.0 - t) * v1 + t * v2
}

pub fn clamp(v: Float, low: Float, high: Float) -> Float {
    v.max(low).min(high)
}

/// Square root that treats slightly negative inputs (from rounding) as zero.
pub fn safe_sqrt(v: Float) -> Float {
    debug_assert!(v >= -1.0e-3);
    Float::max(0.0, v).sqrt()
}

pub fn safe_acos(v: Float) -> Float {
    clamp(v, -1.0, 1.0).acos()
}

/// Roots of `a t^2 + b t + c` in increasing order, each carrying the error bounds propagated
/// from the coefficients.
pub fn quadratic(a: EFloat, b: EFloat, c: EFloat) -> Option<(EFloat, EFloat)> {
    let (av, bv, cv) = (f64::from(a.v), f64::from(b.v), f64::from(c.v));
    let discrim = bv * bv - 4.0 * av * cv;
    if discrim < 0.0 {
        return None;
    }

    let root = discrim.sqrt() as Float;
    let root = EFloat::with_err(root, MACHINE_EPSILON * root);

    // avoid cancellation between -b and the root
    let q = if b.v < 0.0 { -0.5 * (b - root) } else { -0.5 * (b + root) };
    let (t0, t1) = (q / a, c / q);

    if t1.v < t0.v { Some((t1, t0)) } else { Some((t0, t1)) }
}

/// Solve `m x = b`, or `None` if `m` is (nearly) singular.
pub fn solve_linear_system_2x2(m: Matrix2<Float>, b: Vec2f) -> Option<Vec2f> {
    let det = m.determinant();
    if det.abs() < 1.0e-10 {
        return None;
    }

    // columns of m are the unknowns' coefficients
    let x = Vec2f::new(
        (m.y.y * b.x - m.y.x * b.y) / det,
        (m.x.x * b.y - m.x.y * b.x) / det,
    );
    if x.x.is_nan() || x.y.is_nan() { None } else { Some(x) }
}
