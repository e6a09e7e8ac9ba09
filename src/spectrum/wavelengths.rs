use crate::Float;
use crate::math::lerp;
use crate::spectrum::{SampledSpectrum, N_SPECTRUM_SAMPLES};

pub const LAMBDA_MIN: Float = 360.0;
pub const LAMBDA_MAX: Float = 830.0;

/// The wavelengths (in nm) a path carries, together with the density they were drawn with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampledWavelengths {
    lambda: [Float; N_SPECTRUM_SAMPLES],
    pdf: [Float; N_SPECTRUM_SAMPLES],
}

impl SampledWavelengths {
    pub fn sample_uniform(u: Float) -> Self {
        Self::sample_uniform_range(u, LAMBDA_MIN, LAMBDA_MAX)
    }

    /// Stratified over `[lambda_min, lambda_max]`: the first wavelength is placed at `u`, the
    /// rest at equal steps after it, wrapping around at the top of the range.
    pub fn sample_uniform_range(u: Float, lambda_min: Float, lambda_max: Float) -> Self {
        let mut lambda = [0.0; N_SPECTRUM_SAMPLES];
        lambda[0] = lerp(u, lambda_min, lambda_max);

        let delta = (lambda_max - lambda_min) / N_SPECTRUM_SAMPLES as Float;
        for i in 1..N_SPECTRUM_SAMPLES {
            lambda[i] = lambda[i - 1] + delta;
            if lambda[i] > lambda_max {
                lambda[i] = lambda_min + (lambda[i] - lambda_max);
            }
        }

        Self {
            lambda,
            pdf: [1.0 / (lambda_max - lambda_min); N_SPECTRUM_SAMPLES],
        }
    }

    pub fn pdf(&self) -> SampledSpectrum {
        SampledSpectrum::from(self.pdf)
    }

    /// Keep only the first wavelength. Used once something wavelength-dependent (dispersion)
    /// has happened along the path.
    pub fn terminate_secondary(&mut self) {
        if self.secondary_terminated() {
            return;
        }
        for pdf in &mut self.pdf[1..] {
            *pdf = 0.0;
        }
        self.pdf[0] /= N_SPECTRUM_SAMPLES as Float;
    }

    pub fn secondary_terminated(&self) -> bool {
        self.pdf[1..].iter().all(|&p| p == 0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = Float> + '_ {
        self.lambda.iter().copied()
    }
}

impl std::ops::Index<usize> for SampledWavelengths {
    type Output = Float;

    fn index(&self, index: usize) -> &Self::Output {
        &self.lambda[index]
    }
}
