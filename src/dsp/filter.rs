//! One-pole filters run at the oversampled rate.
//!
//! The low-pass is a damped resonant integrator whose cutoff sweeps
//! geometrically each sub-sample. The high-pass works on the low-pass
//! output's per-sample change and sweeps once per output sample.

/// Upper bound for both filters' coefficients.
const MAX_COEFF: f32 = 0.1;
/// Lower bound for the high-pass coefficient.
const MIN_HP_COEFF: f32 = 0.000_01;

#[derive(Debug, Clone)]
pub struct LowPass {
    /// Current coefficient (cutoff).
    pub cutoff: f32,
    /// Multiplier applied to `cutoff` every sub-sample.
    pub sweep: f32,
    pub damping: f32,
    /// When false the input passes straight through.
    pub enabled: bool,
    position: f32,
    velocity: f32,
}

impl LowPass {
    pub fn new(cutoff: f32, sweep: f32, damping: f32, enabled: bool) -> Self {
        LowPass {
            cutoff,
            sweep,
            damping,
            enabled,
            position: 0.0,
            velocity: 0.0,
        }
    }

    /// Filter one sub-sample. Returns the change in output, which is what
    /// the high-pass consumes.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let previous = self.position;
        self.cutoff = (self.cutoff * self.sweep).clamp(0.0, MAX_COEFF);
        if self.enabled {
            self.velocity += (input - self.position) * self.cutoff;
            self.velocity -= self.velocity * self.damping;
        } else {
            self.position = input;
            self.velocity = 0.0;
        }
        self.position += self.velocity;
        self.position - previous
    }

    pub fn output(&self) -> f32 {
        self.position
    }
}

#[derive(Debug, Clone)]
pub struct HighPass {
    pub cutoff: f32,
    pub sweep: f32,
    value: f32,
}

impl HighPass {
    pub fn new(cutoff: f32, sweep: f32) -> Self {
        HighPass {
            cutoff,
            sweep,
            value: 0.0,
        }
    }

    /// Advance the cutoff sweep. Called once per output sample.
    pub fn sweep_cutoff(&mut self) {
        if self.sweep != 0.0 {
            self.cutoff = (self.cutoff * self.sweep).clamp(MIN_HP_COEFF, MAX_COEFF);
        }
    }

    /// Filter the low-pass output's change for one sub-sample.
    #[inline]
    pub fn process(&mut self, delta: f32) -> f32 {
        self.value += delta;
        self.value -= self.value * self.cutoff;
        self.value
    }
}
