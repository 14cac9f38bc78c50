//! Procedural preset generators.
//!
//! Every generator starts from the default sound, writes a recipe of
//! randomized internal values and hands back the readable form. Randomness
//! always comes from the caller's generator, so a seeded `Pcg32` reproduces
//! a preset exactly.

use std::fmt;
use std::str::FromStr;

use log::trace;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::convert::{to_internal, to_readable};
use crate::error::SfxrError;
use crate::settings::{InternalSettings, ReadableSettings, WaveType};

/// Uniform integer in `0..=n`.
pub fn rnd<R: Rng + ?Sized>(rng: &mut R, n: u32) -> u32 {
    rng.random_range(0..=n)
}

/// `range` scaled by a uniform draw from 10001 evenly spaced steps in
/// `[0, 1]`.
pub fn frnd<R: Rng + ?Sized>(rng: &mut R, range: f32) -> f32 {
    rnd(rng, 10_000) as f32 / 10_000.0 * range
}

/// A coin flip.
fn chance<R: Rng + ?Sized>(rng: &mut R) -> bool {
    rnd(rng, 1) == 1
}

/// Uniform draw in `[-1, 1]`.
fn signed<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    frnd(rng, 2.0) - 1.0
}

/// Preset families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetKind {
    Coin,
    Laser,
    Explosion,
    Powerup,
    Hit,
    Jump,
    Blip,
    Randomize,
}

impl PresetKind {
    pub const ALL: [PresetKind; 8] = [
        PresetKind::Coin,
        PresetKind::Laser,
        PresetKind::Explosion,
        PresetKind::Powerup,
        PresetKind::Hit,
        PresetKind::Jump,
        PresetKind::Blip,
        PresetKind::Randomize,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PresetKind::Coin => "coin",
            PresetKind::Laser => "laser",
            PresetKind::Explosion => "explosion",
            PresetKind::Powerup => "powerup",
            PresetKind::Hit => "hit",
            PresetKind::Jump => "jump",
            PresetKind::Blip => "blip",
            PresetKind::Randomize => "randomize",
        }
    }

    /// Run this family's generator.
    pub fn generate<R: Rng + ?Sized>(self, rng: &mut R) -> ReadableSettings {
        let settings = match self {
            PresetKind::Coin => coin(rng),
            PresetKind::Laser => laser(rng),
            PresetKind::Explosion => explosion(rng),
            PresetKind::Powerup => powerup(rng),
            PresetKind::Hit => hit(rng),
            PresetKind::Jump => jump(rng),
            PresetKind::Blip => blip(rng),
            PresetKind::Randomize => randomize(rng),
        };
        trace!("generated {} preset", self.name());
        settings
    }
}

impl fmt::Display for PresetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PresetKind {
    type Err = SfxrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        PresetKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| SfxrError::UnknownPreset(s.to_string()))
    }
}

pub fn coin<R: Rng + ?Sized>(rng: &mut R) -> ReadableSettings {
    let mut s = InternalSettings::default();
    s.frequency.base = 0.4 + frnd(rng, 0.5);
    s.envelope.attack = 0.0;
    s.envelope.sustain = frnd(rng, 0.1);
    s.envelope.decay = 0.1 + frnd(rng, 0.4);
    s.envelope.punch = 0.3 + frnd(rng, 0.3);
    if chance(rng) {
        s.arpeggiation.speed = 0.5 + frnd(rng, 0.2);
        s.arpeggiation.frequency = 0.2 + frnd(rng, 0.4);
    }
    to_readable(&s)
}

pub fn laser<R: Rng + ?Sized>(rng: &mut R) -> ReadableSettings {
    let mut s = InternalSettings::default();
    let mut wave = rnd(rng, 2);
    if wave == 2 && chance(rng) {
        wave = rnd(rng, 1);
    }
    s.wave_type = WaveType::from_index(wave);

    let f = &mut s.frequency;
    f.base = 0.5 + frnd(rng, 0.5);
    f.limit = (f.base - 0.2 - frnd(rng, 0.6)).max(0.2);
    f.slide = -0.15 - frnd(rng, 0.2);
    if rnd(rng, 2) == 0 {
        f.base = 0.3 + frnd(rng, 0.6);
        f.limit = frnd(rng, 0.1);
        f.slide = -0.35 - frnd(rng, 0.3);
    }

    if chance(rng) {
        s.duty.cycle = frnd(rng, 0.5);
        s.duty.sweep = frnd(rng, 0.2);
    } else {
        s.duty.cycle = 0.4 + frnd(rng, 0.5);
        s.duty.sweep = -frnd(rng, 0.7);
    }

    s.envelope.attack = 0.0;
    s.envelope.sustain = 0.1 + frnd(rng, 0.2);
    s.envelope.decay = frnd(rng, 0.4);
    if chance(rng) {
        s.envelope.punch = frnd(rng, 0.3);
    }
    if rnd(rng, 2) == 0 {
        s.flanger.offset = frnd(rng, 0.2);
        s.flanger.sweep = -frnd(rng, 0.2);
    }
    if chance(rng) {
        s.high_pass_filter.frequency = frnd(rng, 0.3);
    }
    to_readable(&s)
}

pub fn explosion<R: Rng + ?Sized>(rng: &mut R) -> ReadableSettings {
    let mut s = InternalSettings::default();
    s.wave_type = WaveType::Noise;

    if chance(rng) {
        s.frequency.base = 0.1 + frnd(rng, 0.4);
        s.frequency.slide = -0.1 + frnd(rng, 0.4);
    } else {
        s.frequency.base = 0.2 + frnd(rng, 0.7);
        s.frequency.slide = -0.2 - frnd(rng, 0.2);
    }
    s.frequency.base *= s.frequency.base;
    if rnd(rng, 4) == 0 {
        s.frequency.slide = 0.0;
    }
    if rnd(rng, 2) == 0 {
        s.retrigger.speed = 0.3 + frnd(rng, 0.5);
    }

    s.envelope.attack = 0.0;
    s.envelope.sustain = 0.1 + frnd(rng, 0.3);
    s.envelope.decay = frnd(rng, 0.5);
    if !chance(rng) {
        s.flanger.offset = -0.3 + frnd(rng, 0.9);
        s.flanger.sweep = -frnd(rng, 0.3);
    }
    s.envelope.punch = 0.2 + frnd(rng, 0.6);
    if chance(rng) {
        s.vibrato.strength = frnd(rng, 0.7);
        s.vibrato.speed = frnd(rng, 0.6);
    }
    if rnd(rng, 2) == 0 {
        s.arpeggiation.speed = 0.6 + frnd(rng, 0.3);
        s.arpeggiation.frequency = 0.8 - frnd(rng, 1.6);
    }
    to_readable(&s)
}

pub fn powerup<R: Rng + ?Sized>(rng: &mut R) -> ReadableSettings {
    let mut s = InternalSettings::default();
    if chance(rng) {
        s.wave_type = WaveType::Sawtooth;
    } else {
        s.duty.cycle = frnd(rng, 0.6);
    }

    if chance(rng) {
        s.frequency.base = 0.2 + frnd(rng, 0.3);
        s.frequency.slide = 0.1 + frnd(rng, 0.4);
        s.retrigger.speed = 0.4 + frnd(rng, 0.4);
    } else {
        s.frequency.base = 0.2 + frnd(rng, 0.3);
        s.frequency.slide = 0.05 + frnd(rng, 0.2);
        if chance(rng) {
            s.vibrato.strength = frnd(rng, 0.7);
            s.vibrato.speed = frnd(rng, 0.6);
        }
    }

    s.envelope.attack = 0.0;
    s.envelope.sustain = frnd(rng, 0.4);
    s.envelope.decay = 0.1 + frnd(rng, 0.4);
    to_readable(&s)
}

pub fn hit<R: Rng + ?Sized>(rng: &mut R) -> ReadableSettings {
    let mut s = InternalSettings::default();
    s.wave_type = match rnd(rng, 2) {
        0 => WaveType::Square,
        1 => WaveType::Sawtooth,
        _ => WaveType::Noise,
    };
    if s.wave_type == WaveType::Square {
        s.duty.cycle = frnd(rng, 0.6);
    }
    s.frequency.base = 0.2 + frnd(rng, 0.6);
    s.frequency.slide = -0.3 - frnd(rng, 0.4);
    s.envelope.attack = 0.0;
    s.envelope.sustain = frnd(rng, 0.1);
    s.envelope.decay = 0.1 + frnd(rng, 0.2);
    if chance(rng) {
        s.high_pass_filter.frequency = frnd(rng, 0.3);
    }
    to_readable(&s)
}

pub fn jump<R: Rng + ?Sized>(rng: &mut R) -> ReadableSettings {
    let mut s = InternalSettings::default();
    s.wave_type = WaveType::Square;
    s.duty.cycle = frnd(rng, 0.6);
    s.frequency.base = 0.3 + frnd(rng, 0.3);
    s.frequency.slide = 0.1 + frnd(rng, 0.2);
    s.envelope.attack = 0.0;
    s.envelope.sustain = 0.1 + frnd(rng, 0.3);
    s.envelope.decay = 0.1 + frnd(rng, 0.2);
    if chance(rng) {
        s.high_pass_filter.frequency = frnd(rng, 0.3);
    }
    if chance(rng) {
        s.low_pass_filter.frequency = 1.0 - frnd(rng, 0.6);
    }
    to_readable(&s)
}

pub fn blip<R: Rng + ?Sized>(rng: &mut R) -> ReadableSettings {
    let mut s = InternalSettings::default();
    s.wave_type = WaveType::from_index(rnd(rng, 1));
    if s.wave_type == WaveType::Square {
        s.duty.cycle = frnd(rng, 0.6);
    }
    s.frequency.base = 0.2 + frnd(rng, 0.4);
    s.envelope.attack = 0.0;
    s.envelope.sustain = 0.1 + frnd(rng, 0.1);
    s.envelope.decay = frnd(rng, 0.2);
    s.high_pass_filter.frequency = 0.1;
    to_readable(&s)
}

/// Anything goes, within a few sanity rules: the pitch does not glide
/// out of range and the envelope is not vanishingly short.
pub fn randomize<R: Rng + ?Sized>(rng: &mut R) -> ReadableSettings {
    let mut s = InternalSettings::default();

    let f = &mut s.frequency;
    f.base = signed(rng).powi(2);
    if chance(rng) {
        f.base = signed(rng).powi(3) + 0.5;
    }
    f.limit = 0.0;
    f.slide = signed(rng).powi(5);
    if f.base > 0.7 && f.slide > 0.2 {
        f.slide = -f.slide;
    }
    if f.base < 0.2 && f.slide < -0.05 {
        f.slide = -f.slide;
    }
    f.delta_slide = signed(rng).powi(3);

    s.duty.cycle = signed(rng);
    s.duty.sweep = signed(rng).powi(3);
    s.vibrato.strength = signed(rng).powi(3);
    s.vibrato.speed = signed(rng);
    s.vibrato.delay = signed(rng);

    let e = &mut s.envelope;
    e.attack = signed(rng).powi(3);
    e.sustain = signed(rng).powi(2);
    e.decay = signed(rng);
    e.punch = frnd(rng, 0.8).powi(2);
    if e.attack + e.sustain + e.decay < 0.2 {
        e.sustain += 0.2 + frnd(rng, 0.3);
        e.decay += 0.2 + frnd(rng, 0.3);
    }

    let lp = &mut s.low_pass_filter;
    lp.resonance = signed(rng);
    lp.frequency = 1.0 - frnd(rng, 1.0).powi(3);
    lp.ramp = signed(rng).powi(3);
    if lp.frequency < 0.1 && lp.ramp < -0.05 {
        lp.ramp = -lp.ramp;
    }

    s.high_pass_filter.frequency = frnd(rng, 1.0).powi(5);
    s.high_pass_filter.ramp = signed(rng).powi(5);
    s.flanger.offset = signed(rng).powi(3);
    s.flanger.sweep = signed(rng).powi(3);
    s.retrigger.speed = signed(rng);
    s.arpeggiation.speed = signed(rng);
    s.arpeggiation.frequency = signed(rng);
    to_readable(&s)
}

/// Jitter a sound: each internal field except the frequency limit moves by
/// up to ±0.05 with even odds. Returns the mutated copy.
pub fn mutate<R: Rng + ?Sized>(settings: &ReadableSettings, rng: &mut R) -> ReadableSettings {
    let mut s = to_internal(settings);
    for (i, field) in s.fields_mut().into_iter().enumerate() {
        if i == InternalSettings::LIMIT_FIELD {
            continue;
        }
        if chance(rng) {
            *field += frnd(rng, 0.1) - 0.05;
        }
    }
    trace!("mutated preset");
    to_readable(&s)
}
