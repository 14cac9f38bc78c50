//! Per-voice synthesis state and the sample loop.
//!
//! An [`Engine`] borrows an immutable [`Model`] and advances one output
//! sample at a time:
//!
//! 1. the control recurrence (retrigger, arpeggio, slide, envelope timing)
//! 2. vibrato, period and duty updates
//! 3. flanger and high-pass sweeps
//! 4. eight oversampled waveform samples, each through low-pass, high-pass
//!    and flanger, weighted by the envelope volume
//!
//! The sum is scaled by 1/8 and clamped to `[-1, 1]`.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::control::Control;
use super::envelope::{self, Stage};
use super::estimator;
use super::filter::{HighPass, LowPass};
use super::flanger::Flanger;
use super::model::Model;
use super::oscillator::Oscillator;

/// Oversampling factor of the waveform generator.
pub const OVERSAMPLE: usize = 8;

/// Seed used by [`Engine::new`].
pub const DEFAULT_SEED: u64 = 0x5f3759df;

/// Scale applied by [`Engine::synthesize_i16`].
pub const I16_SCALE: f32 = 32000.0;

/// Mutable state of one voice. Only the noise waveform consumes the random
/// source; every other sound is fully determined by the model.
#[derive(Debug, Clone)]
pub struct Engine<'m, R = Pcg32> {
    model: &'m Model,
    control: Control,
    osc: Oscillator,
    lowpass: LowPass,
    highpass: HighPass,
    flanger: Flanger,
    square_duty: f32,
    vib_phase: f32,
    env_vol: f32,
    rng: R,
}

impl<'m> Engine<'m, Pcg32> {
    /// Engine with a [`Pcg32`] noise source seeded with [`DEFAULT_SEED`].
    pub fn new(model: &'m Model) -> Self {
        Engine::with_rng(model, Pcg32::seed_from_u64(DEFAULT_SEED))
    }

    pub fn with_seed(model: &'m Model, seed: u64) -> Self {
        Engine::with_rng(model, Pcg32::seed_from_u64(seed))
    }
}

impl<'m, R: Rng> Engine<'m, R> {
    /// Engine drawing noise from `rng`. Two engines over equal models and
    /// equally seeded generators produce identical output.
    pub fn with_rng(model: &'m Model, mut rng: R) -> Self {
        let mut osc = Oscillator::new(model.wave_type, &mut rng);
        osc.set_period(model.start_period() as f32);
        Engine {
            model,
            control: Control::new(model),
            osc,
            lowpass: LowPass::new(model.fltw, model.fltw_d, model.fltdmp, model.lpf_enabled),
            highpass: HighPass::new(model.flthp, model.flthp_d),
            flanger: Flanger::new(model.fphase, model.fdphase),
            square_duty: model.duty,
            vib_phase: 0.0,
            env_vol: 0.0,
            rng,
        }
    }

    pub fn model(&self) -> &'m Model {
        self.model
    }

    /// Restart the frequency glide, square duty and arpeggio from the model.
    /// Filters, flanger, envelope and noise keep their state, so this does
    /// not revive a voice that has already stopped.
    pub fn reset(&mut self) {
        self.control.reset_frequency(self.model);
        self.square_duty = self.model.duty;
        self.osc.set_period(self.control.fperiod as f32);
    }

    pub fn is_playing(&self) -> bool {
        self.control.playing
    }

    pub fn stage(&self) -> Stage {
        self.control.stage
    }

    /// Envelope volume applied to the most recent sample.
    pub fn env_volume(&self) -> f32 {
        self.env_vol
    }

    /// Snapshot of the stop-determining state.
    pub fn control(&self) -> &Control {
        &self.control
    }

    /// Samples this voice will still produce before it stops.
    pub fn estimate_remaining(&self) -> usize {
        estimator::remaining_samples(self.model, &self.control)
    }

    /// Fill `out` with samples in `[-1, 1]`. Returns how many were written,
    /// which is less than `out.len()` once the sound ends.
    pub fn synthesize(&mut self, out: &mut [f32]) -> usize {
        let mut written = 0;
        for slot in out.iter_mut() {
            if !self.control.playing {
                break;
            }
            *slot = clamp_output(self.next_sample());
            written += 1;
        }
        written
    }

    /// Same as [`Engine::synthesize`], scaled by [`I16_SCALE`].
    pub fn synthesize_i16(&mut self, out: &mut [i16]) -> usize {
        let mut written = 0;
        for slot in out.iter_mut() {
            if !self.control.playing {
                break;
            }
            *slot = (clamp_output(self.next_sample()) * I16_SCALE) as i16;
            written += 1;
        }
        written
    }

    /// Advance up to `count` samples without recording them. Returns how
    /// many were generated.
    pub fn skip(&mut self, count: usize) -> usize {
        let mut generated = 0;
        while generated < count && self.control.playing {
            self.next_sample();
            generated += 1;
        }
        generated
    }

    fn next_sample(&mut self) -> f32 {
        let model = self.model;

        if self.control.step(model) {
            self.square_duty = model.duty;
        }

        let mut rfperiod = self.control.fperiod as f32;
        if model.vib_amp > 0.0 {
            self.vib_phase += model.vib_speed;
            rfperiod =
                (self.control.fperiod * (1.0 + (self.vib_phase as f64).sin() * model.vib_amp as f64)) as f32;
        }
        self.osc.set_period(rfperiod);

        self.square_duty = (self.square_duty + model.square_slide).clamp(0.0, 0.5);

        let stage = self.control.stage;
        let length = stage.index().map_or(0, |i| model.env_length[i]);
        if let Some(vol) = envelope::volume(stage, self.control.env_time, length, model.punch) {
            self.env_vol = vol;
        }

        self.flanger.sweep_lag();
        self.highpass.sweep_cutoff();

        let mut sum = 0.0;
        for _ in 0..OVERSAMPLE {
            let raw = self.osc.next_sample(self.square_duty, &mut self.rng);
            let delta = self.lowpass.process(raw);
            let filtered = self.highpass.process(delta);
            sum += self.flanger.process(filtered) * self.env_vol;
        }
        sum * (1.0 / OVERSAMPLE as f32)
    }
}

/// Clamp to `[-1, 1]`, mapping NaN to silence.
fn clamp_output(s: f32) -> f32 {
    if s.is_nan() { 0.0 } else { s.clamp(-1.0, 1.0) }
}
