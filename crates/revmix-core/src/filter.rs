//! Insert filters and the Butterworth low-pass they are built from.

/// Block filter applied to an insert's bus before it is summed into the mix.
pub trait AudioFilter: Send {
    /// Read `input` and write the same number of samples to `output`.
    fn process(&mut self, input: &[f32], output: &mut [f32]);

    /// Clear internal state.
    fn reset(&mut self) {}
}

/// Q values of the two biquad sections of a 4th-order Butterworth low-pass.
const BUTTERWORTH_Q4: [f64; 2] = [0.541_196_100_146_197, 1.306_562_964_876_376_6];

/// Second-order low-pass section (RBJ cookbook, transposed direct form II).
#[derive(Debug, Clone, Default)]
pub struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
    z1: f64,
    z2: f64,
}

impl Biquad {
    pub fn lowpass(sample_rate: f64, cutoff: f64, q: f64) -> Self {
        let mut section = Self::default();
        section.set_lowpass(sample_rate, cutoff, q);
        section
    }

    /// Recompute coefficients, keeping the filter state.
    pub fn set_lowpass(&mut self, sample_rate: f64, cutoff: f64, q: f64) {
        let cutoff = cutoff.clamp(1.0, sample_rate * 0.49);
        let w0 = 2.0 * std::f64::consts::PI * cutoff / sample_rate;
        let (sin_w0, cos_w0) = w0.sin_cos();
        let alpha = sin_w0 / (2.0 * q);
        let a0 = 1.0 + alpha;

        self.b0 = (1.0 - cos_w0) / 2.0 / a0;
        self.b1 = (1.0 - cos_w0) / a0;
        self.b2 = self.b0;
        self.a1 = -2.0 * cos_w0 / a0;
        self.a2 = (1.0 - alpha) / a0;
    }

    #[inline]
    pub fn process(&mut self, x: f64) -> f64 {
        let y = self.b0 * x + self.z1;
        self.z1 = self.b1 * x - self.a1 * y + self.z2;
        self.z2 = self.b2 * x - self.a2 * y;
        y
    }

    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}

/// 24 dB/octave Butterworth low-pass made of two cascaded biquads.
#[derive(Debug, Clone)]
pub struct ButterworthLowpass {
    sections: [Biquad; 2],
    sample_rate: f64,
    cutoff: f64,
}

impl ButterworthLowpass {
    pub fn new(sample_rate: f64, cutoff: f64) -> Self {
        let mut filter = Self {
            sections: [Biquad::default(), Biquad::default()],
            sample_rate,
            cutoff,
        };
        filter.update_coefficients();
        filter
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Move the cutoff. Cheap to call once per block; no-op if unchanged.
    pub fn set_cutoff(&mut self, cutoff: f64) {
        if cutoff != self.cutoff {
            self.cutoff = cutoff;
            self.update_coefficients();
        }
    }

    fn update_coefficients(&mut self) {
        for (section, q) in self.sections.iter_mut().zip(BUTTERWORTH_Q4) {
            section.set_lowpass(self.sample_rate, self.cutoff, q);
        }
    }

    #[inline]
    pub fn process(&mut self, x: f64) -> f64 {
        let y = self.sections[0].process(x);
        self.sections[1].process(y)
    }

    pub fn reset(&mut self) {
        for section in &mut self.sections {
            section.reset();
        }
    }
}

/// Insert filter wrapping [`ButterworthLowpass`].
#[derive(Debug, Clone)]
pub struct LowPassFilter {
    inner: ButterworthLowpass,
}

impl LowPassFilter {
    pub fn new(sample_rate: u32, cutoff: f64) -> Self {
        Self {
            inner: ButterworthLowpass::new(sample_rate as f64, cutoff),
        }
    }

    pub fn set_cutoff(&mut self, cutoff: f64) {
        self.inner.set_cutoff(cutoff);
    }
}

impl AudioFilter for LowPassFilter {
    fn process(&mut self, input: &[f32], output: &mut [f32]) {
        for (out, &x) in output.iter_mut().zip(input) {
            *out = self.inner.process(x as f64) as f32;
        }
    }

    fn reset(&mut self) {
        self.inner.reset();
    }
}
