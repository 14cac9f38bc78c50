//! Readable ↔ internal parameter transforms.
//!
//! Each field has its own transform and fields never interact. The two
//! directions are approximate inverses: round trips agree to within float
//! error, except where an input lies outside a transform's domain and is
//! clamped.

use crate::settings::{
    InternalArpeggiation, InternalDuty, InternalEnvelope, InternalFlanger, InternalFrequency,
    InternalHighPass, InternalLowPass, InternalRetrigger, InternalSettings, InternalVibrato,
    ReadableArpeggiation, ReadableDuty, ReadableEnvelope, ReadableFlanger, ReadableFrequency,
    ReadableHighPass, ReadableLowPass, ReadableRetrigger, ReadableSettings, ReadableVibrato,
};

/// Nominal sample rate of the synthesis recurrence.
pub const SAMPLE_RATE: u32 = 44100;

const SAMPLES: f64 = SAMPLE_RATE as f64;
const SAMPLES_PLUS_ONE: f64 = SAMPLES + 1.0;
/// Oversampled rate the filters and duty sweep run at.
const SUPER_SAMPLES: f64 = 8.0 * SAMPLES;
/// `log10(0.5)`, the base used by the slide transform.
const LOG_HALF: f64 = -0.301_029_995_66;

/// Samples per unit of `internal²` in envelope-style durations.
const DURATION_SCALE: f64 = 100_000.0;
/// Fixed part of the arpeggio and retrigger periods, in samples.
const MIN_PERIOD: f64 = 32.0;
/// Variable part of the arpeggio and retrigger periods, in samples.
const PERIOD_SPAN: f64 = 20_000.0;
/// Smallest low-pass damping a resonance percentage maps to, reached at
/// 100% and above.
const MIN_DAMPING: f64 = 0.001;

fn sign(v: f64) -> f64 {
    if v < 0.0 { -1.0 } else { 1.0 }
}

/// Zero anything that is not a normal float (NaN, infinities, subnormals,
/// zero itself).
fn normal_or_zero(v: f64) -> f32 {
    let v = v as f32;
    if v.is_normal() { v } else { 0.0 }
}

pub(crate) fn internal_from_sec(sec: f64) -> f64 {
    (sec * SAMPLES / DURATION_SCALE).max(0.0).sqrt()
}

pub(crate) fn sec_from_internal(v: f64) -> f64 {
    v * v * DURATION_SCALE / SAMPLES
}

/// Frequencies at or below `0.001 * 8 * 44100 / 100` Hz (about 3.5 Hz) clamp
/// to internal zero. The snap keeps a round-tripped zero limit at exactly
/// zero, since any positive limit arms the frequency cutoff.
pub(crate) fn internal_from_hz(hz: f64) -> f64 {
    let v = 100.0 / SUPER_SAMPLES * hz - 0.001;
    if v < 1e-9 { 0.0 } else { v.sqrt() }
}

pub(crate) fn hz_from_internal(v: f64) -> f64 {
    SUPER_SAMPLES * (v * v + 0.001) / 100.0
}

/// Period-style fields (arpeggio delay, retrigger) map samples to
/// `1 - sqrt((samples - 32) / 20000)`. Periods shorter than 32 samples clamp.
fn internal_from_period(samples: f64) -> f64 {
    1.0 - ((samples - MIN_PERIOD).max(0.0) / PERIOD_SPAN).sqrt()
}

fn period_from_internal(v: f64) -> f64 {
    (1.0 - v).powi(2) * PERIOD_SPAN + MIN_PERIOD
}

/// Convert a readable definition into the internal representation.
///
/// Slide and delta-slide results that are not normal floats are forced to
/// zero instead of being propagated.
pub fn to_internal(r: &ReadableSettings) -> InternalSettings {
    let e = &r.envelope;
    let envelope = InternalEnvelope {
        attack: internal_from_sec(e.attack_sec as f64) as f32,
        sustain: internal_from_sec(e.sustain_sec as f64) as f32,
        decay: internal_from_sec(e.decay_sec as f64) as f32,
        punch: e.punch_percent / 100.0,
    };

    let f = &r.frequency;
    let v = (f.slide_octaves_per_sec as f64 * LOG_HALF / SAMPLES).exp();
    let slide = normal_or_zero(((1.0 - v) * 100.0).cbrt());
    let v = f.slide_octaves_per_sec2 as f64 * (-SAMPLES_PLUS_ONE / SAMPLES).exp2() / SAMPLES;
    let delta_slide = normal_or_zero((-v / 0.000_001).cbrt());
    let frequency = InternalFrequency {
        base: internal_from_hz(f.base_hz as f64) as f32,
        limit: internal_from_hz(f.limit_hz as f64) as f32,
        slide,
        delta_slide,
    };

    let vb = &r.vibrato;
    let v = vb.speed_hz as f64 / (SAMPLES * 10.0 / 64.0);
    let vibrato = InternalVibrato {
        strength: (vb.strength_percent as f64 / 50.0) as f32,
        speed: (v * 100.0).max(0.0).sqrt() as f32,
        delay: internal_from_sec(vb.delay_sec as f64) as f32,
    };

    let a = &r.arpeggiation;
    let ratio = 1.0 / (a.frequency_semitones as f64 / 12.0).exp2().max(1e-5);
    let arp_frequency = if ratio < 1.0 {
        ((1.0 - ratio).abs() / 0.9).sqrt()
    } else {
        -((ratio - 1.0) / 10.0).sqrt()
    };
    let arp_speed = if a.speed_sec == 0.0 {
        1.0
    } else {
        internal_from_period(a.speed_sec as f64 * SAMPLES)
    };
    let arpeggiation = InternalArpeggiation {
        frequency: arp_frequency as f32,
        speed: arp_speed as f32,
    };

    let d = &r.duty;
    let duty = InternalDuty {
        cycle: ((d.cycle_percent as f64 * 0.01 - 0.5) * -2.0) as f32,
        sweep: (-(d.sweep_percent_per_sec as f64 / SUPER_SAMPLES) / 0.000_05) as f32,
    };

    let retrigger = InternalRetrigger {
        speed: if r.retrigger.rate_hz == 0.0 {
            0.0
        } else {
            internal_from_period(SAMPLES / r.retrigger.rate_hz as f64) as f32
        },
    };

    let fl = &r.flanger;
    let v = fl.offset_ms_per_sec as f64 * SAMPLES / 1000.0;
    let offset = sign(v) * (v.abs() / 1020.0).sqrt();
    let v = fl.sweep_ms_per_sec2 as f64 / 100.0;
    let flanger = InternalFlanger {
        offset: offset as f32,
        sweep: (sign(v) * v.abs().sqrt()) as f32,
    };

    let lp = &r.low_pass_filter;
    let hz = (lp.cutoff_frequency_hz as f64).max(0.0);
    let cutoff = (hz / (hz + SUPER_SAMPLES) * 10.0).cbrt();
    let per_sample = (lp.cutoff_sweep_per_sec as f64).max(0.0).powf(1.0 / SAMPLES);
    let damping = ((100.0 - lp.resonance_percent as f64) / 11.0).max(MIN_DAMPING);
    let resonance = ((1.0 / (damping / 5.0) - 1.0) / 20.0).max(0.0).sqrt();
    let low_pass_filter = InternalLowPass {
        frequency: cutoff as f32,
        ramp: ((per_sample - 1.0) / 0.0001) as f32,
        resonance: resonance as f32,
    };

    let hp = &r.high_pass_filter;
    let hz = (hp.cutoff_frequency_hz as f64).max(0.0);
    let per_sample = (hp.cutoff_sweep_per_sec as f64).max(0.0).powf(1.0 / SAMPLES);
    let high_pass_filter = InternalHighPass {
        frequency: (hz / (hz + SUPER_SAMPLES) * 10.0).sqrt() as f32,
        ramp: ((per_sample - 1.0) / 0.0003) as f32,
    };

    InternalSettings {
        wave_type: r.wave_type,
        envelope,
        frequency,
        vibrato,
        arpeggiation,
        duty,
        retrigger,
        flanger,
        low_pass_filter,
        high_pass_filter,
    }
}

/// Convert an internal definition back to physical units.
pub fn to_readable(s: &InternalSettings) -> ReadableSettings {
    let e = &s.envelope;
    let envelope = ReadableEnvelope {
        attack_sec: sec_from_internal(e.attack as f64) as f32,
        sustain_sec: sec_from_internal(e.sustain as f64) as f32,
        decay_sec: sec_from_internal(e.decay as f64) as f32,
        punch_percent: e.punch * 100.0,
    };

    let f = &s.frequency;
    let fslide = 1.0 - (f.slide as f64).powi(3) * 0.01;
    let slide = fslide.ln() * SAMPLES / LOG_HALF;
    let fdslide = -(f.delta_slide as f64).powi(3) * 0.000_001;
    let frequency = ReadableFrequency {
        base_hz: hz_from_internal(f.base as f64) as f32,
        limit_hz: hz_from_internal(f.limit as f64) as f32,
        slide_octaves_per_sec: if slide.is_finite() { slide as f32 } else { 0.0 },
        slide_octaves_per_sec2: (fdslide * SAMPLES / (-SAMPLES_PLUS_ONE / SAMPLES).exp2()) as f32,
    };

    let vb = &s.vibrato;
    let vibrato = ReadableVibrato {
        strength_percent: (vb.strength as f64 * 50.0) as f32,
        speed_hz: (SAMPLES * 10.0 / 64.0 * (vb.speed as f64).powi(2) * 0.01) as f32,
        delay_sec: sec_from_internal(vb.delay as f64) as f32,
    };

    let a = &s.arpeggiation;
    let a_f = a.frequency as f64;
    let multiplier = if a_f >= 0.0 {
        1.0 - a_f * a_f * 0.9
    } else {
        1.0 + a_f * a_f * 10.0
    };
    let ratio = 1.0 / multiplier.max(1e-5);
    let arpeggiation = ReadableArpeggiation {
        frequency_semitones: (12.0 * ratio.log2()) as f32,
        speed_sec: if a.speed == 1.0 {
            0.0
        } else {
            (period_from_internal(a.speed as f64) / SAMPLES) as f32
        },
    };

    let d = &s.duty;
    let duty = ReadableDuty {
        cycle_percent: ((0.5 - d.cycle as f64 * 0.5) * 100.0) as f32,
        sweep_percent_per_sec: (SUPER_SAMPLES * -(d.sweep as f64) * 0.000_05) as f32,
    };

    let retrigger = ReadableRetrigger {
        rate_hz: if s.retrigger.speed == 0.0 {
            0.0
        } else {
            (SAMPLES / period_from_internal(s.retrigger.speed as f64)) as f32
        },
    };

    let fl = &s.flanger;
    let offset = fl.offset as f64;
    let sweep = fl.sweep as f64;
    let flanger = ReadableFlanger {
        offset_ms_per_sec: (sign(offset) * offset * offset * 1020.0 * 1000.0 / SAMPLES) as f32,
        sweep_ms_per_sec2: (sign(sweep) * sweep * sweep * 100.0) as f32,
    };

    let lp = &s.low_pass_filter;
    let w = (lp.frequency as f64).powi(3) * 0.1;
    let damping = 5.0 / (1.0 + (lp.resonance as f64).powi(2) * 20.0);
    let low_pass_filter = ReadableLowPass {
        cutoff_frequency_hz: (SUPER_SAMPLES * w / (1.0 - w)) as f32,
        cutoff_sweep_per_sec: (1.0 + lp.ramp as f64 * 0.0001).powf(SAMPLES) as f32,
        resonance_percent: (100.0 * (1.0 - damping * 0.11)) as f32,
    };

    let hp = &s.high_pass_filter;
    let w = (hp.frequency as f64).powi(2) * 0.1;
    let high_pass_filter = ReadableHighPass {
        cutoff_frequency_hz: (SUPER_SAMPLES * w / (1.0 - w)) as f32,
        cutoff_sweep_per_sec: (1.0 + hp.ramp as f64 * 0.0003).powf(SAMPLES) as f32,
    };

    ReadableSettings {
        wave_type: s.wave_type,
        envelope,
        frequency,
        vibrato,
        arpeggiation,
        duty,
        retrigger,
        flanger,
        low_pass_filter,
        high_pass_filter,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::FIELD_COUNT;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    fn readable_fields(r: &ReadableSettings) -> [f32; FIELD_COUNT] {
        let e = &r.envelope;
        let f = &r.frequency;
        let v = &r.vibrato;
        let a = &r.arpeggiation;
        let d = &r.duty;
        let fl = &r.flanger;
        let lp = &r.low_pass_filter;
        let hp = &r.high_pass_filter;
        [
            e.attack_sec,
            e.sustain_sec,
            e.decay_sec,
            e.punch_percent,
            f.base_hz,
            f.limit_hz,
            f.slide_octaves_per_sec,
            f.slide_octaves_per_sec2,
            v.strength_percent,
            v.speed_hz,
            v.delay_sec,
            a.frequency_semitones,
            a.speed_sec,
            d.cycle_percent,
            d.sweep_percent_per_sec,
            r.retrigger.rate_hz,
            fl.offset_ms_per_sec,
            fl.sweep_ms_per_sec2,
            lp.cutoff_frequency_hz,
            lp.cutoff_sweep_per_sec,
            lp.resonance_percent,
            hp.cutoff_frequency_hz,
            hp.cutoff_sweep_per_sec,
        ]
    }

    fn close(a: f32, b: f32) -> bool {
        let diff = (a as f64 - b as f64).abs();
        diff <= 1e-4 * (a.abs().max(b.abs()) as f64) || diff < 1e-4
    }

    /// Internal values in the ranges the preset recipes produce, restricted to
    /// the half of each domain the forward transform maps onto.
    fn random_internal(rng: &mut Pcg32) -> InternalSettings {
        let mut s = InternalSettings::default();
        s.envelope.attack = rng.random_range(0.0..1.0);
        s.envelope.sustain = rng.random_range(0.0..1.0);
        s.envelope.decay = rng.random_range(0.0..1.0);
        s.envelope.punch = rng.random_range(0.0..1.0);
        s.frequency.base = rng.random_range(0.05..1.0);
        s.frequency.limit = rng.random_range(0.05..1.0);
        s.frequency.slide = rng.random_range(-1.0..1.0);
        s.frequency.delta_slide = rng.random_range(-1.0..1.0);
        s.vibrato.strength = rng.random_range(-1.0..1.0);
        s.vibrato.speed = rng.random_range(0.0..1.0);
        s.vibrato.delay = rng.random_range(0.0..1.0);
        s.arpeggiation.frequency = rng.random_range(-1.0..1.0);
        s.arpeggiation.speed = rng.random_range(0.0..0.99);
        s.duty.cycle = rng.random_range(-1.0..1.0);
        s.duty.sweep = rng.random_range(-1.0..1.0);
        s.retrigger.speed = rng.random_range(0.01..1.0);
        s.flanger.offset = rng.random_range(-1.0..1.0);
        s.flanger.sweep = rng.random_range(-1.0..1.0);
        s.low_pass_filter.frequency = rng.random_range(0.0..1.0);
        s.low_pass_filter.ramp = rng.random_range(-1.0..1.0);
        s.low_pass_filter.resonance = rng.random_range(0.0..1.0);
        s.high_pass_filter.frequency = rng.random_range(0.0..1.0);
        s.high_pass_filter.ramp = rng.random_range(-1.0..1.0);
        s
    }

    #[test]
    fn readable_roundtrip() {
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..200 {
            let readable = to_readable(&random_internal(&mut rng));
            let back = to_readable(&to_internal(&readable));
            let names = [
                "attack", "sustain", "decay", "punch", "base", "limit", "slide", "delta slide",
                "vib strength", "vib speed", "vib delay", "arp frequency", "arp speed",
                "duty cycle", "duty sweep", "retrigger", "flanger offset", "flanger sweep",
                "lp cutoff", "lp sweep", "lp resonance", "hp cutoff", "hp sweep",
            ];
            for ((name, a), b) in names.iter().zip(readable_fields(&readable)).zip(readable_fields(&back)) {
                assert!(close(a, b), "{name}: {a} -> {b}");
            }
        }
    }

    #[test]
    fn internal_roundtrip_of_defaults() {
        let internal = InternalSettings::default();
        let back = to_internal(&to_readable(&internal));
        for (a, b) in internal.fields().iter().zip(back.fields()) {
            assert!((a - b).abs() < 1e-5, "{a} vs {b}");
        }
    }

    #[test]
    fn default_readable_units() {
        let r = ReadableSettings::default();
        assert!((r.frequency.base_hz - 440.0).abs() < 0.01);
        // 0.6641² * 100000 / 44100 ≈ 1 s
        assert!((r.envelope.sustain_sec - 1.0).abs() < 0.001);
        assert_eq!(r.retrigger.rate_hz, 0.0);
        assert!((r.low_pass_filter.cutoff_frequency_hz - 39200.0).abs() < 0.01);
        assert!((r.duty.cycle_percent - 50.0).abs() < 1e-6);
    }

    #[test]
    fn seconds_transform() {
        assert!((internal_from_sec(1.0) - (0.441f64).sqrt()).abs() < 1e-12);
        assert!((sec_from_internal(internal_from_sec(2.5)) - 2.5).abs() < 1e-9);
    }

    #[test]
    fn hz_transform() {
        assert!((hz_from_internal(internal_from_hz(440.0)) - 440.0).abs() < 1e-9);
        // below the representable floor the internal value clamps to zero
        assert_eq!(internal_from_hz(1.0), 0.0);
    }

    #[test]
    fn non_finite_slide_is_zeroed() {
        let mut r = ReadableSettings::default();
        r.frequency.slide_octaves_per_sec = -f32::MAX;
        r.frequency.slide_octaves_per_sec2 = f32::INFINITY;
        let s = to_internal(&r);
        assert_eq!(s.frequency.slide, 0.0);
        assert_eq!(s.frequency.delta_slide, 0.0);
    }

    #[test]
    fn zero_slide_stays_zero() {
        let s = to_internal(&ReadableSettings::default());
        assert_eq!(s.frequency.slide, 0.0);
        assert_eq!(s.frequency.delta_slide, 0.0);
    }

    #[test]
    fn disabled_arpeggio_and_retrigger() {
        let mut r = ReadableSettings::default();
        r.arpeggiation.speed_sec = 0.0;
        r.retrigger.rate_hz = 0.0;
        let s = to_internal(&r);
        assert_eq!(s.arpeggiation.speed, 1.0);
        assert_eq!(s.retrigger.speed, 0.0);
        let back = to_readable(&s);
        assert_eq!(back.arpeggiation.speed_sec, 0.0);
        assert_eq!(back.retrigger.rate_hz, 0.0);
    }

    #[test]
    fn arpeggio_octave_up() {
        let mut r = ReadableSettings::default();
        r.arpeggiation.frequency_semitones = 12.0;
        let s = to_internal(&r);
        // period multiplier 1 - a² * 0.9 should halve the period
        let a = s.arpeggiation.frequency as f64;
        assert!((1.0 - a * a * 0.9 - 0.5).abs() < 1e-6);
    }

    #[test]
    fn duty_cycle_sign() {
        let mut r = ReadableSettings::default();
        r.duty.cycle_percent = 25.0;
        assert!((to_internal(&r).duty.cycle - 0.5).abs() < 1e-6);
    }

    #[test]
    fn all_outputs_finite_for_extreme_inputs() {
        let mut r = ReadableSettings::default();
        r.frequency.base_hz = -50.0;
        r.frequency.limit_hz = 0.0;
        r.vibrato.speed_hz = -3.0;
        r.low_pass_filter.cutoff_frequency_hz = -1.0;
        r.low_pass_filter.cutoff_sweep_per_sec = -2.0;
        r.low_pass_filter.resonance_percent = 100.0;
        r.high_pass_filter.cutoff_frequency_hz = -1.0;
        r.high_pass_filter.cutoff_sweep_per_sec = -2.0;
        r.retrigger.rate_hz = 100_000.0;
        r.arpeggiation.speed_sec = 1e-6;
        let s = to_internal(&r);
        for v in s.fields() {
            assert!(v.is_finite(), "non-finite internal value {v}");
        }
    }

    #[test]
    fn full_resonance_saturates() {
        let mut r = ReadableSettings::default();
        let mut last = 0.0f32;
        for pct in [50.0, 90.0, 99.0, 100.0, 120.0, f32::INFINITY] {
            r.low_pass_filter.resonance_percent = pct;
            let res = to_internal(&r).low_pass_filter.resonance;
            assert!(res.is_finite(), "{pct}% gave {res}");
            assert!(res >= last, "{pct}% gave {res}, below {last}");
            last = res;
        }
        r.low_pass_filter.resonance_percent = 120.0;
        let back = to_readable(&to_internal(&r)).low_pass_filter.resonance_percent;
        assert!(back > 99.9, "120% read back as {back}");
    }
}
