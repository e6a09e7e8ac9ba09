use crate::Float;
use crate::math::safe_sqrt;

/// Fraction of unpolarized light reflected at a dielectric boundary with relative index of
/// refraction `eta`. A negative cosine means the light arrives from the inside, in which case
/// the interface is flipped.
pub fn fr_dielectric(cos_theta_i: Float, mut eta: Float) -> Float {
    let mut cos_theta_i = cos_theta_i.clamp(-1.0, 1.0);
    if cos_theta_i < 0.0 {
        eta = 1.0 / eta;
        cos_theta_i = -cos_theta_i;
    }

    // compute cos_theta_t using snell's law
    let sin2_theta_i = 1.0 - cos_theta_i * cos_theta_i;
    let sin2_theta_t = sin2_theta_i / (eta * eta);
    if sin2_theta_t >= 1.0 { return 1.0 } // total internal reflection
    let cos_theta_t = safe_sqrt(1.0 - sin2_theta_t);

    let r_parallel = (eta * cos_theta_i - cos_theta_t) / (eta * cos_theta_i + cos_theta_t);
    let r_perp = (cos_theta_i - eta * cos_theta_t) / (cos_theta_i + eta * cos_theta_t);

    (r_parallel * r_parallel + r_perp * r_perp) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn normal_incidence() {
        assert_abs_diff_eq!(fr_dielectric(1.0, 1.5), 0.04, epsilon = 1.0e-6);
        // same interface seen from the other side
        assert_abs_diff_eq!(fr_dielectric(-1.0, 1.0 / 1.5), 0.04, epsilon = 1.0e-6);
        assert_eq!(fr_dielectric(0.7, 1.0), 0.0);
    }

    #[test]
    fn grazing_and_total_internal_reflection() {
        assert_abs_diff_eq!(fr_dielectric(0.0, 1.5), 1.0, epsilon = 1.0e-6);
        // leaving glass past the critical angle (~41.8 degrees)
        assert_eq!(fr_dielectric(-0.5, 1.5), 1.0);
        assert!(fr_dielectric(-0.9, 1.5) < 1.0);
    }
}
