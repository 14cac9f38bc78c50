//! Immutable synthesis constants derived once per sound.

use log::trace;

use crate::convert::internal_from_hz;
use crate::midi::key_to_frequency;
use crate::settings::{InternalSettings, WaveType};

/// Everything the per-sample recurrence needs that never changes while a
/// sound plays. Built from [`InternalSettings`]; engines borrow it.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub wave_type: WaveType,

    /// Internal base frequency, after any MIDI key override.
    pub base: f32,
    /// Internal slide, used to restart the frequency glide.
    pub slide: f32,
    /// A configured frequency limit stops the sound when the period
    /// overruns `fmaxperiod`.
    pub limit_stops: bool,
    pub fmaxperiod: f64,
    pub fdslide: f64,

    /// Attack, sustain and decay lengths in samples.
    pub env_length: [u32; 3],
    pub punch: f32,

    /// Retrigger period in samples; 0 never retriggers.
    pub rep_limit: u32,
    /// Samples until the arpeggio jump; 0 disables it.
    pub arp_limit: u32,
    pub arp_mod: f64,

    /// Starting square duty and its per-sample sweep.
    pub duty: f32,
    pub square_slide: f32,

    pub vib_speed: f32,
    pub vib_amp: f32,

    /// Low-pass filter start coefficient, sweep factor and damping.
    pub fltw: f32,
    pub fltw_d: f32,
    pub fltdmp: f32,
    /// A cutoff of exactly 1.0 bypasses the low-pass filter.
    pub lpf_enabled: bool,

    /// High-pass filter start coefficient and sweep factor.
    pub flthp: f32,
    pub flthp_d: f32,

    /// Flanger start phase and per-sample phase delta.
    pub fphase: f32,
    pub fdphase: f32,
}

fn signed_square(v: f32) -> f32 {
    if v < 0.0 { -(v * v) } else { v * v }
}

/// Longest representable stage. One below `u32::MAX` so the stage counter
/// can still pass it.
pub const MAX_STAGE_LENGTH: u32 = u32::MAX - 1;

/// `(x² · 100000)` samples, saturating at zero for NaN and at
/// [`MAX_STAGE_LENGTH`].
fn stage_length(x: f32) -> u32 {
    ((x * x * 100_000.0) as u32).min(MAX_STAGE_LENGTH)
}

/// `(1 - speed)² · 20000 + 32` samples: the shared arpeggio and retrigger
/// period.
fn period_samples(speed: f32) -> u32 {
    ((1.0 - speed).powi(2) * 20_000.0 + 32.0) as u32
}

impl Model {
    /// Derive a model from internal settings. `key` pitches the sound to a
    /// MIDI key, replacing the base frequency and keeping everything else.
    pub fn new(settings: &InternalSettings, key: Option<i32>) -> Self {
        let s = settings;
        let base = match key {
            Some(key) => internal_from_hz(key_to_frequency(key)) as f32,
            None => s.frequency.base,
        };

        let limit = s.frequency.limit;
        let arp = s.arpeggiation.frequency as f64;
        let arp_mod = if arp >= 0.0 {
            1.0 - arp * arp * 0.9
        } else {
            1.0 + arp * arp * 10.0
        };

        let lp = &s.low_pass_filter;
        let fltw = lp.frequency.powi(3) * 0.1;
        let fltdmp = (5.0 / (1.0 + lp.resonance.powi(2) * 20.0) * (0.01 + fltw)).min(0.8);

        let model = Model {
            wave_type: s.wave_type,
            base,
            slide: s.frequency.slide,
            limit_stops: limit > 0.0,
            fmaxperiod: 100.0 / ((limit * limit) as f64 + 0.001),
            fdslide: -(s.frequency.delta_slide as f64).powi(3) * 0.000_001,
            env_length: [
                stage_length(s.envelope.attack),
                stage_length(s.envelope.sustain),
                stage_length(s.envelope.decay),
            ],
            punch: s.envelope.punch,
            rep_limit: if s.retrigger.speed == 0.0 {
                0
            } else {
                period_samples(s.retrigger.speed)
            },
            arp_limit: if s.arpeggiation.speed == 1.0 {
                0
            } else {
                period_samples(s.arpeggiation.speed)
            },
            arp_mod,
            duty: 0.5 - s.duty.cycle * 0.5,
            square_slide: -s.duty.sweep * 0.000_05,
            vib_speed: s.vibrato.speed.powi(2) * 0.01,
            vib_amp: s.vibrato.strength * 0.5,
            fltw,
            fltw_d: 1.0 + lp.ramp * 0.0001,
            fltdmp,
            lpf_enabled: lp.frequency != 1.0,
            flthp: s.high_pass_filter.frequency.powi(2) * 0.1,
            flthp_d: 1.0 + s.high_pass_filter.ramp * 0.0003,
            fphase: signed_square(s.flanger.offset) * 1020.0,
            fdphase: signed_square(s.flanger.sweep),
        };
        trace!(
            "model: base={} env={:?} rep_limit={} arp_limit={}",
            model.base, model.env_length, model.rep_limit, model.arp_limit
        );
        model
    }

    /// Period (in samples at the oversampled rate) the frequency glide
    /// starts from.
    pub fn start_period(&self) -> f64 {
        100.0 / ((self.base * self.base) as f64 + 0.001)
    }

    /// Per-sample period multiplier the glide starts from.
    pub fn start_slide(&self) -> f64 {
        1.0 - (self.slide as f64).powi(3) * 0.01
    }

    /// Samples the envelope runs for when nothing else stops the sound. Each
    /// stage lasts one sample longer than its length.
    pub fn envelope_samples(&self) -> u64 {
        self.env_length.iter().map(|&len| len as u64 + 1).sum()
    }
}

impl From<&InternalSettings> for Model {
    fn from(settings: &InternalSettings) -> Self {
        Model::new(settings, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_model() {
        let m = Model::from(&InternalSettings::default());
        assert_eq!(m.env_length[0], 0);
        assert!((44_000..44_200).contains(&m.env_length[1]), "{:?}", m.env_length);
        assert!((15_990..16_010).contains(&m.env_length[2]), "{:?}", m.env_length);
        assert_eq!(m.rep_limit, 0);
        assert_eq!(m.arp_limit, 20_032);
        assert!(!m.limit_stops);
        assert!(!m.lpf_enabled);
        assert!((m.fmaxperiod - 100_000.0).abs() < 1e-6);
        assert!((m.duty - 0.5).abs() < 1e-7);
        assert!((m.start_slide() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn default_period_is_440hz() {
        let m = Model::from(&InternalSettings::default());
        // 8x oversampled 44100 Hz / 440 Hz ≈ 801.8 samples
        let p = m.start_period();
        assert!((p - 801.8).abs() < 0.5, "expected ~801.8, got {p}");
    }

    #[test]
    fn midi_key_overrides_base_only() {
        let settings = InternalSettings::default();
        let plain = Model::new(&settings, None);
        let keyed = Model::new(&settings, Some(81));
        assert!(keyed.base > plain.base);
        let ratio = plain.start_period() / keyed.start_period();
        assert!((ratio - 2.0).abs() < 0.01, "A5 should be an octave above A4, got {ratio}");
        assert_eq!(plain.env_length, keyed.env_length);
        assert_eq!(plain.fmaxperiod, keyed.fmaxperiod);
    }

    #[test]
    fn retrigger_and_arpeggio_periods() {
        let mut s = InternalSettings::default();
        s.retrigger.speed = 1.0;
        s.arpeggiation.speed = 0.0;
        let m = Model::from(&s);
        assert_eq!(m.rep_limit, 32);
        assert_eq!(m.arp_limit, 20_032);

        s.retrigger.speed = 0.5;
        s.arpeggiation.speed = 1.0;
        let m = Model::from(&s);
        assert_eq!(m.rep_limit, 5_032);
        assert_eq!(m.arp_limit, 0);
    }

    #[test]
    fn arpeggio_multiplier_sign() {
        let mut s = InternalSettings::default();
        s.arpeggiation.frequency = 0.5;
        assert!((Model::from(&s).arp_mod - 0.775).abs() < 1e-6);
        s.arpeggiation.frequency = -0.5;
        assert!((Model::from(&s).arp_mod - 3.5).abs() < 1e-6);
    }

    #[test]
    fn filter_damping_is_capped() {
        let mut s = InternalSettings::default();
        s.low_pass_filter.frequency = 1.0;
        s.low_pass_filter.resonance = 0.0;
        let m = Model::from(&s);
        assert!(m.fltdmp <= 0.8);
        s.low_pass_filter.frequency = 0.5;
        assert!(Model::from(&s).lpf_enabled);
    }

    #[test]
    fn flanger_keeps_sign() {
        let mut s = InternalSettings::default();
        s.flanger.offset = -0.5;
        s.flanger.sweep = -0.2;
        let m = Model::from(&s);
        assert!((m.fphase + 255.0).abs() < 1e-3);
        assert!((m.fdphase + 0.04).abs() < 1e-6);
    }

    #[test]
    fn envelope_samples_counts_stage_boundaries() {
        let mut s = InternalSettings::default();
        s.envelope.attack = 0.1;
        s.envelope.sustain = 0.2;
        s.envelope.decay = 0.3;
        let m = Model::from(&s);
        assert_eq!(m.env_length, [1_000, 4_000, 9_000]);
        assert_eq!(m.envelope_samples(), 14_003);
    }

    #[test]
    fn huge_stages_stay_below_counter_limit() {
        let mut s = InternalSettings::default();
        s.envelope.decay = 210.0;
        s.envelope.sustain = f32::MAX;
        let m = Model::from(&s);
        assert_eq!(m.env_length[1], MAX_STAGE_LENGTH);
        assert_eq!(m.env_length[2], MAX_STAGE_LENGTH);
    }
}
