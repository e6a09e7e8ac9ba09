use crate::{Vec3f, Float, Point2f, abs_dot};
use crate::consts::PI;
use crate::math::lerp;
use crate::reflection::{tan2_theta, cos2_theta, cos_phi, sin_phi, abs_cos_theta};
use crate::sampling::sample_uniform_disk_polar;
use cgmath::InnerSpace;

pub trait MicrofacetDistribution {
    /// Differential area of microfacets oriented with normal `wm`.
    fn d(&self, wm: Vec3f) -> Float;

    /// Measures invisible masked microfacet area per visible microfacet area.
    fn lambda(&self, w: Vec3f) -> Float;

    /// The Smith masking function, giving the fraction of microfacets visible from `w`.
    fn g1(&self, w: Vec3f) -> Float {
        1.0 / (1.0 + self.lambda(w))
    }

    /// Fraction of microfacets visible from both `wo` and `wi`.
    fn g(&self, wo: Vec3f, wi: Vec3f) -> Float {
        1.0 / (1.0 + self.lambda(wo) + self.lambda(wi))
    }

    /// Distribution of normals visible from `w`.
    fn d_w(&self, w: Vec3f, wm: Vec3f) -> Float {
        let cos_theta = abs_cos_theta(w);
        if cos_theta == 0.0 {
            return 0.0;
        }
        self.g1(w) / cos_theta * self.d(wm) * abs_dot(w, wm)
    }

    /// Density of [`sample_wm`](Self::sample_wm) returning `wm` when seen from `w`.
    fn pdf(&self, w: Vec3f, wm: Vec3f) -> Float {
        self.d_w(w, wm)
    }

    /// Sample a microfacet normal from the distribution of normals visible from `w`.
    fn sample_wm(&self, w: Vec3f, u: Point2f) -> Vec3f;

    fn effectively_smooth(&self) -> bool;
}

const MIN_ALPHA: Float = 1.0e-4;

/// Also known as GGX
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrowbridgeReitzDistribution {
    alpha_x: Float,
    alpha_y: Float,
}

impl TrowbridgeReitzDistribution {
    pub fn roughness_to_alpha(roughness: Float) -> Float {
        roughness.sqrt()
    }

    /// A rough distribution never keeps a zero alpha: one flat axis alongside a rough one
    /// would divide by zero in `d` and `lambda`.
    pub fn new(alpha_x: Float, alpha_y: Float) -> Self {
        let distrib = TrowbridgeReitzDistribution { alpha_x, alpha_y };
        if distrib.effectively_smooth() {
            return distrib;
        }
        TrowbridgeReitzDistribution {
            alpha_x: Float::max(alpha_x, MIN_ALPHA),
            alpha_y: Float::max(alpha_y, MIN_ALPHA),
        }
    }

    pub fn alpha_x(&self) -> Float { self.alpha_x }

    pub fn alpha_y(&self) -> Float { self.alpha_y }

    /// Widen near-specular lobes to cut down on fireflies in later bounces.
    pub fn regularize(&mut self) {
        if self.alpha_x < 0.3 {
            self.alpha_x = (2.0 * self.alpha_x).clamp(0.1, 0.3);
        }
        if self.alpha_y < 0.3 {
            self.alpha_y = (2.0 * self.alpha_y).clamp(0.1, 0.3);
        }
    }
}

impl MicrofacetDistribution for TrowbridgeReitzDistribution {
    fn d(&self, wm: Vec3f) -> Float {
        let tan2_theta = tan2_theta(wm);
        if tan2_theta.is_infinite() {
            return 0.0
        }

        let cos4_theta = sq!(cos2_theta(wm));
        if cos4_theta < 1.0e-16 {
            return 0.0
        }
        let e = tan2_theta * (sq!(cos_phi(wm) / self.alpha_x) + sq!(sin_phi(wm) / self.alpha_y));
        1.0 / (PI * self.alpha_x * self.alpha_y * cos4_theta * sq!(1.0 + e))
    }

    fn lambda(&self, w: Vec3f) -> Float {
        let tan2_theta = tan2_theta(w);
        if tan2_theta.is_infinite() {
            return 0.0
        }

        // alpha for direction w
        let alpha2 = sq!(cos_phi(w) * self.alpha_x) + sq!(sin_phi(w) * self.alpha_y);
        (Float::sqrt(1.0 + alpha2 * tan2_theta) - 1.0) / 2.0
    }

    fn sample_wm(&self, w: Vec3f, u: Point2f) -> Vec3f {
        // stretch w to the configuration of a hemisphere
        let mut wh = Vec3f::new(self.alpha_x * w.x, self.alpha_y * w.y, w.z).normalize();
        if wh.z < 0.0 {
            wh = -wh;
        }

        // orthonormal basis around wh
        let t1 = if wh.z < 0.99999 {
            Vec3f::unit_z().cross(wh).normalize()
        } else {
            Vec3f::unit_x()
        };
        let t2 = wh.cross(t1);

        // uniformly distributed point on the disk, warped to the visible part of the hemisphere
        let mut p = sample_uniform_disk_polar(u);
        let h = Float::sqrt(1.0 - sq!(p.x));
        p.y = lerp((1.0 + wh.z) / 2.0, h, p.y);

        let pz = Float::sqrt(Float::max(0.0, 1.0 - sq!(p.x) - sq!(p.y)));
        let nh = p.x * t1 + p.y * t2 + pz * wh;

        // transform back to the ellipsoid configuration
        Vec3f::new(self.alpha_x * nh.x, self.alpha_y * nh.y, Float::max(1.0e-6, nh.z)).normalize()
    }

    fn effectively_smooth(&self) -> bool {
        Float::max(self.alpha_x, self.alpha_y) < 1.0e-3
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::TWO_PI;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn uniform_hemisphere(u: Point2f) -> Vec3f {
        let z = u[0];
        let r = Float::sqrt(Float::max(0.0, 1.0 - z * z));
        let phi = TWO_PI * u[1];
        vec3f!(r * phi.cos(), r * phi.sin(), z)
    }

    #[test]
    fn projected_area_integrates_to_one() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        for distrib in [
            TrowbridgeReitzDistribution::new(0.5, 0.5),
            TrowbridgeReitzDistribution::new(0.3, 0.7),
        ] {
            let n = 200_000;
            let sum: f64 = (0..n).map(|_| {
                let wm = uniform_hemisphere(Point2f::new(rng.gen(), rng.gen()));
                (distrib.d(wm) * wm.z * TWO_PI) as f64
            }).sum();
            assert_abs_diff_eq!(sum / n as f64, 1.0, epsilon = 0.03);
        }
    }

    #[test]
    fn values_along_the_normal() {
        let distrib = TrowbridgeReitzDistribution::new(0.5, 0.5);
        let up = vec3f!(0, 0, 1);
        assert_relative_eq!(distrib.d(up), 1.0 / (PI * 0.25));
        assert_eq!(distrib.lambda(up), 0.0);
        assert_eq!(distrib.g1(up), 1.0);
        assert_relative_eq!(distrib.pdf(up, up), distrib.d(up));
    }

    #[test]
    fn grazing_directions_degrade_to_zero() {
        let distrib = TrowbridgeReitzDistribution::new(0.2, 0.4);
        let grazing = vec3f!(1, 0, 0);
        assert_eq!(distrib.d(grazing), 0.0);
        assert_eq!(distrib.lambda(grazing), 0.0);
        assert_eq!(distrib.d_w(grazing, vec3f!(0, 0, 1)), 0.0);
        assert!(distrib.g(grazing, vec3f!(0, 0.6, 0.8)).is_finite());
    }

    #[test]
    fn visible_normals_face_the_viewer() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        let distrib = TrowbridgeReitzDistribution::new(0.4, 0.1);
        for _ in 0..1000 {
            let w = uniform_hemisphere(Point2f::new(rng.gen(), rng.gen()));
            let wm = distrib.sample_wm(w, Point2f::new(rng.gen(), rng.gen()));
            assert!(wm.z > 0.0);
            assert_abs_diff_eq!(wm.magnitude(), 1.0, epsilon = 1.0e-4);
            let pdf = distrib.pdf(w, wm);
            assert!(pdf.is_finite() && pdf >= 0.0);
        }
        // straight up uses the fixed tangent
        let wm = distrib.sample_wm(vec3f!(0, 0, 1), Point2f::new(0.0, 0.0));
        assert!(wm.z > 0.0);
    }

    #[test]
    fn one_flat_axis_stays_finite() {
        let distrib = TrowbridgeReitzDistribution::new(0.0, 0.5);
        assert_eq!(distrib.alpha_x(), 1.0e-4);
        assert_eq!(distrib.alpha_y(), 0.5);

        let d = distrib.d(vec3f!(0, 0, 1));
        assert!(d.is_finite() && d > 0.0);
        let w = vec3f!(0.6, 0, 0.8);
        assert!(distrib.d(w).is_finite());
        assert!(distrib.lambda(w).is_finite());
        let wm = distrib.sample_wm(w, Point2f::new(0.3, 0.7));
        assert!(wm.x.is_finite() && wm.y.is_finite() && wm.z > 0.0);

        // smooth distributions keep their zero alphas
        assert_eq!(TrowbridgeReitzDistribution::new(0.0, 0.0).alpha_y(), 0.0);
    }

    #[test]
    fn smoothness_and_regularization() {
        assert_eq!(TrowbridgeReitzDistribution::roughness_to_alpha(0.25), 0.5);
        assert!(TrowbridgeReitzDistribution::new(0.0, 9.0e-4).effectively_smooth());
        assert!(!TrowbridgeReitzDistribution::new(0.0, 1.1e-3).effectively_smooth());

        let mut d = TrowbridgeReitzDistribution::new(0.0, 0.2);
        d.regularize();
        assert_eq!((d.alpha_x(), d.alpha_y()), (0.1, 0.3));
        let mut d = TrowbridgeReitzDistribution::new(0.5, 0.12);
        d.regularize();
        assert_eq!((d.alpha_x(), d.alpha_y()), (0.5, 0.24));
    }
}
