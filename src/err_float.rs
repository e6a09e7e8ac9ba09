use crate::Float;
use std::ops::{Add, Div, Mul, Neg, Sub};

pub const MACHINE_EPSILON: Float = std::f32::EPSILON * 0.5;

pub const fn gamma(n: i32) -> Float {
    let n = n as Float;
    (n * MACHINE_EPSILON) / (1.0 - n * MACHINE_EPSILON)
}

pub fn next_float_up(mut v: f32) -> f32 {
    if v.is_infinite() && v > 0.0 { return v; }

    if v == -0.0 { v = 0.0 }

    let bits = v.to_bits();
    let bits = if v >= 0.0 { bits + 1 } else { bits - 1 };
    f32::from_bits(bits)
}

pub fn next_float_down(mut v: f32) -> f32 {
    if v.is_infinite() && v < 0.0 { return v; }

    if v == 0.0 { v = -0.0 }

    let bits = v.to_bits();
    let bits = if v > 0.0 { bits - 1 } else { bits + 1 };
    f32::from_bits(bits)
}

/// A floating point value that carries a conservative interval `[low, high]` bounding the
/// rounding error accumulated while computing it.
#[derive(Clone, Copy, Debug)]
pub struct EFloat {
    pub v: Float,
    low: Float,
    high: Float,
}

impl EFloat {
    pub fn new(v: Float) -> Self {
        Self { v, low: v, high: v }
    }

    pub fn with_err(v: Float, err: Float) -> Self {
        if err == 0.0 {
            Self::new(v)
        } else {
            Self {
                v,
                low: next_float_down(v - err),
                high: next_float_up(v + err),
            }
        }
    }

    fn from_bounds(v: Float, low: Float, high: Float) -> Self {
        let e = Self { v, low, high };
        debug_assert!(e.check(), "EFloat interval does not contain its value: {:?}", e);
        e
    }

    fn check(&self) -> bool {
        if self.low.is_finite() && self.high.is_finite() && self.v.is_finite() {
            self.low <= self.v && self.v <= self.high
        } else {
            true
        }
    }

    pub fn lower_bound(&self) -> Float { self.low }

    pub fn upper_bound(&self) -> Float { self.high }

    pub fn absolute_error(&self) -> Float {
        next_float_up(Float::max((self.high - self.v).abs(), (self.v - self.low).abs()))
    }

    pub fn sqrt(self) -> Self {
        Self::from_bounds(
            self.v.sqrt(),
            next_float_down(self.low.max(0.0).sqrt()),
            next_float_up(self.high.sqrt()),
        )
    }

    pub fn abs(self) -> Self {
        if self.low >= 0.0 {
            self
        } else if self.high <= 0.0 {
            -self
        } else {
            Self::from_bounds(self.v.abs(), 0.0, Float::max(-self.low, self.high))
        }
    }
}

impl PartialEq for EFloat {
    fn eq(&self, other: &Self) -> bool {
        self.v == other.v
    }
}

impl From<EFloat> for Float {
    fn from(e: EFloat) -> Self {
        e.v
    }
}

impl From<Float> for EFloat {
    fn from(v: Float) -> Self {
        EFloat::new(v)
    }
}

impl Neg for EFloat {
    type Output = Self;

    fn neg(self) -> Self {
        Self { v: -self.v, low: -self.high, high: -self.low }
    }
}

impl Add for EFloat {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::from_bounds(
            self.v + rhs.v,
            next_float_down(self.low + rhs.low),
            next_float_up(self.high + rhs.high),
        )
    }
}

impl Sub for EFloat {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::from_bounds(
            self.v - rhs.v,
            next_float_down(self.low - rhs.high),
            next_float_up(self.high - rhs.low),
        )
    }
}

impl Mul for EFloat {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let prod = [
            self.low * rhs.low,
            self.high * rhs.low,
            self.low * rhs.high,
            self.high * rhs.high,
        ];
        let lo = prod.iter().cloned().fold(Float::INFINITY, Float::min);
        let hi = prod.iter().cloned().fold(Float::NEG_INFINITY, Float::max);
        Self::from_bounds(self.v * rhs.v, next_float_down(lo), next_float_up(hi))
    }
}

impl Div for EFloat {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        let v = self.v / rhs.v;
        if rhs.low < 0.0 && rhs.high > 0.0 {
            // the interval we're dividing by straddles zero so just return an interval of
            // everything
            return Self { v, low: Float::NEG_INFINITY, high: Float::INFINITY };
        }
        let div = [
            self.low / rhs.low,
            self.high / rhs.low,
            self.low / rhs.high,
            self.high / rhs.high,
        ];
        let lo = div.iter().cloned().fold(Float::INFINITY, Float::min);
        let hi = div.iter().cloned().fold(Float::NEG_INFINITY, Float::max);
        Self::from_bounds(v, next_float_down(lo), next_float_up(hi))
    }
}

macro_rules! float_ops {
    ($($tr:ident, $f:ident);*) => {
        $(
        impl $tr<Float> for EFloat {
            type Output = EFloat;

            fn $f(self, rhs: Float) -> EFloat {
                $tr::$f(self, EFloat::new(rhs))
            }
        }

        impl $tr<EFloat> for Float {
            type Output = EFloat;

            fn $f(self, rhs: EFloat) -> EFloat {
                $tr::$f(EFloat::new(self), rhs)
            }
        }
        )*
    };
}

float_ops!(Add, add; Sub, sub; Mul, mul; Div, div);
