//! Integer-phase oscillator for the four base waveforms.

use std::f64::consts::PI;

use rand::Rng;

use crate::preset::frnd;
use crate::settings::WaveType;

/// Entries in the noise table. One period of noise plays the table once.
pub const NOISE_LEN: usize = 32;

/// Shortest period the oscillator accepts, in oversampled samples.
pub const MIN_PERIOD: u32 = 8;

/// Oscillator running at the oversampled rate. The phase counts samples
/// within the current period and wraps with a modulo when the period
/// shrinks under it.
#[derive(Debug, Clone)]
pub struct Oscillator {
    pub wave_type: WaveType,
    phase: u32,
    period: u32,
    noise: [f32; NOISE_LEN],
}

impl Oscillator {
    pub fn new<R: Rng + ?Sized>(wave_type: WaveType, rng: &mut R) -> Self {
        let mut osc = Oscillator {
            wave_type,
            phase: 0,
            period: MIN_PERIOD,
            noise: [0.0; NOISE_LEN],
        };
        osc.refill_noise(rng);
        osc
    }

    pub fn period(&self) -> u32 {
        self.period
    }

    /// Set the period from a (possibly vibrato-modulated) float period.
    /// Fractions truncate and anything below [`MIN_PERIOD`] is raised to it.
    pub fn set_period(&mut self, period: f32) {
        self.period = (period as i32).max(MIN_PERIOD as i32) as u32;
    }

    fn refill_noise<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for v in self.noise.iter_mut() {
            *v = frnd(rng, 2.0) - 1.0;
        }
    }

    /// Generate one oversampled sample. Noise redraws its table every time
    /// the phase wraps.
    pub fn next_sample<R: Rng + ?Sized>(&mut self, square_duty: f32, rng: &mut R) -> f32 {
        self.phase += 1;
        if self.phase >= self.period {
            self.phase %= self.period;
            if self.wave_type == WaveType::Noise {
                self.refill_noise(rng);
            }
        }

        let fp = self.phase as f32 / self.period as f32;
        match self.wave_type {
            WaveType::Square => {
                if fp < square_duty {
                    0.5
                } else {
                    -0.5
                }
            }
            WaveType::Sawtooth => 1.0 - fp * 2.0,
            WaveType::Sine => (fp as f64 * 2.0 * PI).sin() as f32,
            WaveType::Noise => {
                let index = self.phase as u64 * NOISE_LEN as u64 / self.period as u64;
                self.noise[(index as usize).min(NOISE_LEN - 1)]
            }
        }
    }
}
