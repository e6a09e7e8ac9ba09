use crate::Float;

mod handle;
mod wavelengths;

pub use handle::{BlackbodySpectrum, ConstantSpectrum, Spectrum, SpectrumType};
pub use wavelengths::{SampledWavelengths, LAMBDA_MAX, LAMBDA_MIN};

pub const N_SPECTRUM_SAMPLES: usize = 4;

/// Fixed-size set of spectral samples with component-wise arithmetic.
#[derive(Clone, Copy)]
pub struct CoefficientSpectrum<const N: usize>([Float; N]);

/// Spectral values at the wavelengths carried by a [`SampledWavelengths`].
pub type SampledSpectrum = CoefficientSpectrum<{N_SPECTRUM_SAMPLES}>;

impl<const N: usize> CoefficientSpectrum<{N}> {

    #[inline]
    pub fn new_with<F: FnMut(usize) -> Float>(init: F) -> Self {
        Self(std::array::from_fn(init))
    }

    #[inline]
    pub fn zip<F: Fn(Float, Float) -> Float>(&self, other: &Self, f: F) -> Self {
        Self(std::array::from_fn(|i| f(self.0[i], other.0[i])))
    }

    pub fn uniform(val: Float) -> Self {
        Self::new_with(|_| val)
    }

    pub fn map<F: Fn(Float) -> Float>(&self, f: F) -> Self {
        Self::new_with(|i| f(self[i]))
    }

    pub fn is_black(&self) -> bool {
        self.0.iter().all(|&x| x == 0.0)
    }

    pub fn has_nans(&self) -> bool {
        self.0.iter().any(|&x| x.is_nan())
    }

    pub fn sqrt(self) -> Self {
        self.map(Float::sqrt)
    }

    pub fn clamp(self, low: Float, high: Float) -> Self {
        self.map(|x| x.clamp(low, high))
    }

    pub fn max_value(&self) -> Float {
        self.0.iter().copied().fold(Float::NEG_INFINITY, Float::max)
    }

    pub fn min_value(&self) -> Float {
        self.0.iter().copied().fold(Float::INFINITY, Float::min)
    }

    pub fn average(&self) -> Float {
        self.0.iter().sum::<Float>() / N as Float
    }

    /// Component-wise division that yields zero wherever the denominator is zero.
    pub fn safe_div(self, rhs: Self) -> Self {
        self.zip(&rhs, |x, y| if y != 0.0 { x / y } else { 0.0 })
    }
}

impl<const N: usize> std::ops::Index<usize> for CoefficientSpectrum<{N}> {
    type Output = Float;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<const N: usize> std::ops::IndexMut<usize> for CoefficientSpectrum<{N}> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0[index]
    }
}

impl<const N: usize> std::cmp::PartialEq for CoefficientSpectrum<{N}> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<const N: usize> Default for CoefficientSpectrum<{N}> {
    fn default() -> Self {
        Self::uniform(Float::default())
    }
}

impl<const N: usize> std::fmt::Debug for CoefficientSpectrum<{N}> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

impl<const N: usize> From<[Float; N]> for CoefficientSpectrum<{N}> {
    fn from(a: [Float; N]) -> Self {
        Self(a)
    }
}

impl<const N: usize> std::iter::Sum for CoefficientSpectrum<{N}> {
    fn sum<I: Iterator<Item=Self>>(iter: I) -> Self {
        iter.fold(Self::uniform(0.0), std::ops::Add::add)
    }
}

macro_rules! impl_op {
    ($op:ident, $name:ident, $sym:tt) => {
        impl<const N: usize> std::ops::$op for CoefficientSpectrum<{N}> {
            type Output = Self;

            fn $name(self, rhs: Self) -> Self::Output {
                Self::zip(&self, &rhs, |x, y| x $sym y)
            }
        }

        impl<const N: usize> std::ops::$op<Float> for CoefficientSpectrum<{N}> {
            type Output = Self;

            fn $name(self, rhs: Float) -> Self::Output {
                Self::new_with(|i| self[i] $sym rhs)
            }
        }

        impl<const N: usize> std::ops::$op<CoefficientSpectrum<{N}>> for Float {
            type Output = CoefficientSpectrum<{N}>;

            fn $name(self, rhs: CoefficientSpectrum<{N}>) -> Self::Output {
                CoefficientSpectrum::new_with(|i| self $sym rhs[i])
            }
        }
    }
}

macro_rules! impl_assign_op {
    ($op:ident, $name:ident, $bin:ident, $bin_name:ident) => {
        impl<const N: usize, Rhs> std::ops::$op<Rhs> for CoefficientSpectrum<{N}>
        where Self: std::ops::$bin<Rhs, Output = Self>
        {
            fn $name(&mut self, rhs: Rhs) {
                *self = std::ops::$bin::$bin_name(*self, rhs);
            }
        }
    }
}

impl_op!(Add, add, +);
impl_op!(Sub, sub, -);
impl_op!(Mul, mul, *);
impl_op!(Div, div, /);
impl_assign_op!(AddAssign, add_assign, Add, add);
impl_assign_op!(SubAssign, sub_assign, Sub, sub);
impl_assign_op!(MulAssign, mul_assign, Mul, mul);
impl_assign_op!(DivAssign, div_assign, Div, div);
