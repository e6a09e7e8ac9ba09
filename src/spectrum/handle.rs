use crate::Float;
use crate::error::{Error, Result};
use crate::mem::{relocate_child, MemPtr, MemoryManager, MemoryView, Relocate, StackAllocator};
use crate::spectrum::{SampledSpectrum, SampledWavelengths};
use bytemuck::{Pod, Zeroable};
use std::convert::TryFrom;

tagged_kind! {
    pub enum SpectrumType {
        Blackbody = 0,
        Constant = 1,
        Custom = 2,
    }
}

/// Arena handle to a spectral distribution.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Spectrum {
    data_ptr: MemPtr,
    kind: u32,
    _pad: u32,
}

impl Spectrum {
    fn new(data_ptr: MemPtr, kind: SpectrumType) -> Self {
        Self { data_ptr, kind: kind.tag(), _pad: 0 }
    }

    pub fn is_null(&self) -> bool {
        self.data_ptr.is_null()
    }

    pub fn kind(&self) -> Result<SpectrumType> {
        SpectrumType::try_from(self.kind)
    }

    pub fn is_constant(&self) -> bool {
        self.kind == SpectrumType::Constant.tag()
    }

    pub fn eval(&self, lambda: Float, mem: MemoryView) -> Result<Float> {
        match self.kind()? {
            SpectrumType::Constant => Ok(self.data_ptr.get::<ConstantSpectrum>(mem)?.eval(lambda)),
            SpectrumType::Blackbody => Ok(self.data_ptr.get::<BlackbodySpectrum>(mem)?.eval(lambda)),
            kind @ SpectrumType::Custom => Err(Error::unsupported(kind)),
        }
    }

    pub fn sample(&self, lambda: &SampledWavelengths, mem: MemoryView) -> Result<SampledSpectrum> {
        match self.kind()? {
            SpectrumType::Constant => Ok(self.data_ptr.get::<ConstantSpectrum>(mem)?.sample(lambda)),
            SpectrumType::Blackbody => Ok(self.data_ptr.get::<BlackbodySpectrum>(mem)?.sample(lambda)),
            kind @ SpectrumType::Custom => Err(Error::unsupported(kind)),
        }
    }

    pub fn max_value(&self, mem: MemoryView) -> Result<Float> {
        match self.kind()? {
            SpectrumType::Constant => Ok(self.data_ptr.get::<ConstantSpectrum>(mem)?.c),
            SpectrumType::Blackbody => Ok(1.0),
            kind @ SpectrumType::Custom => Err(Error::unsupported(kind)),
        }
    }
}

impl Relocate for Spectrum {
    fn relocate(&mut self, region: &mut StackAllocator) -> Result<()> {
        match self.kind()? {
            SpectrumType::Constant => relocate_child::<ConstantSpectrum>(&mut self.data_ptr, region),
            SpectrumType::Blackbody => relocate_child::<BlackbodySpectrum>(&mut self.data_ptr, region),
            kind @ SpectrumType::Custom => Err(Error::unsupported(kind)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct ConstantSpectrum {
    pub c: Float,
}

impl_relocate!(ConstantSpectrum {} plain { c });

impl ConstantSpectrum {
    pub fn create_spectrum(mem: &mut MemoryManager, c: Float) -> Result<Spectrum> {
        if !c.is_finite() {
            return Err(Error::InvalidInput(format!("constant spectrum value {} is not finite", c)));
        }
        let ptr = mem.allocate(ConstantSpectrum { c })?;
        Ok(Spectrum::new(ptr, SpectrumType::Constant))
    }

    pub fn eval(&self, _lambda: Float) -> Float {
        self.c
    }

    pub fn sample(&self, _lambda: &SampledWavelengths) -> SampledSpectrum {
        SampledSpectrum::uniform(self.c)
    }
}

/// Planck's law for a black body at temperature `t` (Kelvin), scaled so the peak is 1.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct BlackbodySpectrum {
    pub t: Float,
    pub normalization: Float,
}

impl_relocate!(BlackbodySpectrum {} plain { t, normalization });

impl BlackbodySpectrum {
    pub fn new(t: Float) -> Self {
        // Wien's displacement law
        let lambda_max = 2.897_772_1e-3 / t;
        Self { t, normalization: 1.0 / blackbody(lambda_max * 1.0e9, t) }
    }

    pub fn create_spectrum(mem: &mut MemoryManager, t: Float) -> Result<Spectrum> {
        if !(t > 0.0 && t.is_finite()) {
            return Err(Error::InvalidInput(format!("blackbody temperature {} must be positive", t)));
        }
        let ptr = mem.allocate(BlackbodySpectrum::new(t))?;
        Ok(Spectrum::new(ptr, SpectrumType::Blackbody))
    }

    pub fn eval(&self, lambda: Float) -> Float {
        blackbody(lambda, self.t) * self.normalization
    }

    pub fn sample(&self, lambda: &SampledWavelengths) -> SampledSpectrum {
        SampledSpectrum::new_with(|i| self.eval(lambda[i]))
    }
}

/// Emitted radiance of a black body at wavelength `lambda` (nm).
pub fn blackbody(lambda: Float, t: Float) -> Float {
    if t <= 0.0 {
        return 0.0;
    }
    const C: f64 = 299_792_458.0;
    const H: f64 = 6.626_069_57e-34;
    const KB: f64 = 1.380_648_8e-23;

    // f32 underflows on l^5
    let l = lambda as f64 * 1.0e-9;
    let le = (2.0 * H * C * C) / (l.powi(5) * (((H * C) / (l * KB * t as f64)).exp() - 1.0));
    le as Float
}
