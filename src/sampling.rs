use crate::{Point2f, Float};
use crate::consts::TWO_PI;

pub fn sample_uniform_disk_polar(u: Point2f) -> Point2f {
    let r = u[0].sqrt();
    let theta = TWO_PI * u[1];
    Point2f::new(r * theta.cos(), r * theta.sin())
}

/// Uniformly sample a value in `[a, b]`, returning it along with its density.
pub fn sample_uniform_range(u: Float, a: Float, b: Float) -> (Float, Float) {
    (crate::math::lerp(u, a, b), 1.0 / (b - a))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoshiro256PlusPlus;

    #[test]
    fn disk_samples_stay_in_unit_disk() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
        for _ in 0..1000 {
            let u = Point2f::new(rng.gen(), rng.gen());
            let p = sample_uniform_disk_polar(u);
            assert!(p.x * p.x + p.y * p.y <= 1.0 + 1.0e-5);
        }
    }

    #[test]
    fn uniform_range() {
        let (x, pdf) = sample_uniform_range(0.5, 360.0, 830.0);
        assert_eq!(x, 595.0);
        assert_eq!(pdf, 1.0 / 470.0);
    }
}
