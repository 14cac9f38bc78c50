//! Sound definitions in their two representations.
//!
//! [`ReadableSettings`] carries physical units (seconds, Hz, percent) and is
//! what users edit and what presets produce. [`InternalSettings`] holds the
//! same fields pre-warped into the normalized space the synthesis recurrence
//! works in. [`crate::convert`] maps between the two.
//!
//! Both derive serde with camelCase names and field-level defaults, so partial
//! JSON documents deserialize onto the default sound.

use serde::{Deserialize, Serialize};

use crate::error::SfxrError;

/// Number of float parameters in a settings struct (wave type excluded).
pub const FIELD_COUNT: usize = 23;

/// Base waveform of the voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaveType {
    #[default]
    Square,
    Sawtooth,
    Sine,
    Noise,
}

impl WaveType {
    /// Map a preset-recipe index (0..=3) to a wave type. Out-of-range values
    /// fall through to noise.
    pub fn from_index(index: u32) -> Self {
        match index {
            0 => WaveType::Square,
            1 => WaveType::Sawtooth,
            2 => WaveType::Sine,
            _ => WaveType::Noise,
        }
    }
}

// ── Readable ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReadableEnvelope {
    /// Fade-in time. Longer attack gives a smoother start.
    pub attack_sec: f32,
    /// Time the volume is held before fading out.
    pub sustain_sec: f32,
    /// Fade-out time.
    pub decay_sec: f32,
    /// Extra volume at the start of sustain, falling off over the stage.
    pub punch_percent: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReadableFrequency {
    pub base_hz: f32,
    /// Cutoff that silences the sound when a downward slide passes it.
    pub limit_hz: f32,
    pub slide_octaves_per_sec: f32,
    /// Slide of the slide.
    pub slide_octaves_per_sec2: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReadableVibrato {
    pub strength_percent: f32,
    pub speed_hz: f32,
    pub delay_sec: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReadableArpeggiation {
    /// Pitch jump applied once per retrigger cycle.
    pub frequency_semitones: f32,
    /// Delay before the jump. Zero disables the arpeggio.
    pub speed_sec: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReadableDuty {
    /// Square-wave high fraction.
    pub cycle_percent: f32,
    pub sweep_percent_per_sec: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReadableRetrigger {
    /// Zero disables retrigger.
    pub rate_hz: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReadableFlanger {
    pub offset_ms_per_sec: f32,
    pub sweep_ms_per_sec2: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReadableLowPass {
    pub cutoff_frequency_hz: f32,
    /// Cutoff multiplier applied over one second.
    pub cutoff_sweep_per_sec: f32,
    pub resonance_percent: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReadableHighPass {
    pub cutoff_frequency_hz: f32,
    pub cutoff_sweep_per_sec: f32,
}

/// Human-facing sound definition. Values are unconstrained; anything out of
/// range is absorbed by clamps during synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReadableSettings {
    pub wave_type: WaveType,
    pub envelope: ReadableEnvelope,
    pub frequency: ReadableFrequency,
    pub vibrato: ReadableVibrato,
    pub arpeggiation: ReadableArpeggiation,
    pub duty: ReadableDuty,
    pub retrigger: ReadableRetrigger,
    pub flanger: ReadableFlanger,
    pub low_pass_filter: ReadableLowPass,
    pub high_pass_filter: ReadableHighPass,
}

impl Default for ReadableSettings {
    fn default() -> Self {
        crate::convert::to_readable(&InternalSettings::default())
    }
}

impl ReadableSettings {
    /// Parse settings from a JSON document. Missing fields take their
    /// default values.
    pub fn from_json(json: &str) -> Result<Self, SfxrError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Pretty-printed JSON, mostly for inspecting generated presets.
    pub fn to_json(&self) -> Result<String, SfxrError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// ── Internal ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InternalEnvelope {
    pub attack: f32,
    pub sustain: f32,
    pub decay: f32,
    pub punch: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InternalFrequency {
    pub base: f32,
    pub limit: f32,
    pub slide: f32,
    pub delta_slide: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InternalVibrato {
    pub strength: f32,
    pub speed: f32,
    pub delay: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InternalArpeggiation {
    pub frequency: f32,
    pub speed: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InternalDuty {
    pub cycle: f32,
    pub sweep: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InternalRetrigger {
    pub speed: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InternalFlanger {
    pub offset: f32,
    pub sweep: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InternalLowPass {
    pub frequency: f32,
    pub ramp: f32,
    pub resonance: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InternalHighPass {
    pub frequency: f32,
    pub ramp: f32,
}

/// Sound definition in the normalized space used by [`crate::dsp::Model`].
/// Most fields live roughly in `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InternalSettings {
    pub wave_type: WaveType,
    pub envelope: InternalEnvelope,
    pub frequency: InternalFrequency,
    pub vibrato: InternalVibrato,
    pub arpeggiation: InternalArpeggiation,
    pub duty: InternalDuty,
    pub retrigger: InternalRetrigger,
    pub flanger: InternalFlanger,
    pub low_pass_filter: InternalLowPass,
    pub high_pass_filter: InternalHighPass,
}

impl Default for InternalSettings {
    fn default() -> Self {
        InternalSettings {
            wave_type: WaveType::Square,
            envelope: InternalEnvelope {
                attack: 0.0,
                sustain: 0.6641, // ~1 s
                decay: 0.4,
                punch: 0.0,
            },
            frequency: InternalFrequency {
                base: 0.351_733_64, // 440 Hz
                ..Default::default()
            },
            low_pass_filter: InternalLowPass {
                frequency: 1.0,
                ..Default::default()
            },
            vibrato: InternalVibrato::default(),
            arpeggiation: InternalArpeggiation::default(),
            duty: InternalDuty::default(),
            retrigger: InternalRetrigger::default(),
            flanger: InternalFlanger::default(),
            high_pass_filter: InternalHighPass::default(),
        }
    }
}

impl InternalSettings {
    /// Index of `frequency.limit` in [`InternalSettings::fields`].
    pub const LIMIT_FIELD: usize = 5;

    /// Base frequency in Hz.
    pub fn base_hz(&self) -> f32 {
        crate::convert::hz_from_internal(self.frequency.base as f64) as f32
    }

    pub fn set_base_hz(&mut self, hz: f32) {
        self.frequency.base = crate::convert::internal_from_hz(hz as f64) as f32;
    }

    /// All float parameters in declaration order.
    pub fn fields(&self) -> [f32; FIELD_COUNT] {
        let mut copy = *self;
        copy.fields_mut().map(|v| *v)
    }

    /// Mutable access to every float parameter in declaration order.
    pub fn fields_mut(&mut self) -> [&mut f32; FIELD_COUNT] {
        let InternalSettings {
            wave_type: _,
            envelope: e,
            frequency: f,
            vibrato: v,
            arpeggiation: a,
            duty: d,
            retrigger: r,
            flanger: fl,
            low_pass_filter: lp,
            high_pass_filter: hp,
        } = self;
        [
            &mut e.attack,
            &mut e.sustain,
            &mut e.decay,
            &mut e.punch,
            &mut f.base,
            &mut f.limit,
            &mut f.slide,
            &mut f.delta_slide,
            &mut v.strength,
            &mut v.speed,
            &mut v.delay,
            &mut a.frequency,
            &mut a.speed,
            &mut d.cycle,
            &mut d.sweep,
            &mut r.speed,
            &mut fl.offset,
            &mut fl.sweep,
            &mut lp.frequency,
            &mut lp.ramp,
            &mut lp.resonance,
            &mut hp.frequency,
            &mut hp.ramp,
        ]
    }

    /// Field-wise `self - other`. The wave type is taken from `self`.
    pub fn delta(&self, other: &InternalSettings) -> InternalSettings {
        let mut out = *self;
        let theirs = other.fields();
        for (mine, theirs) in out.fields_mut().into_iter().zip(theirs) {
            *mine -= theirs;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_uses_defaults() {
        let s = ReadableSettings::from_json(r#"{ "waveType": "noise", "envelope": { "decaySec": 0.5 } }"#)
            .expect("parse failed");
        let d = ReadableSettings::default();
        assert_eq!(s.wave_type, WaveType::Noise);
        assert_eq!(s.envelope.decay_sec, 0.5);
        assert_eq!(s.envelope.attack_sec, 0.0);
        assert_eq!(s.frequency, d.frequency);
    }

    #[test]
    fn json_roundtrip() {
        let mut s = ReadableSettings::default();
        s.wave_type = WaveType::Sine;
        s.vibrato.speed_hz = 12.5;
        let json = s.to_json().expect("serialize failed");
        assert!(json.contains("\"sine\""));
        assert!(json.contains("speedHz"));
        let back = ReadableSettings::from_json(&json).expect("parse failed");
        assert_eq!(back, s);
    }

    #[test]
    fn invalid_json_is_an_error() {
        let err = ReadableSettings::from_json("{ not json").unwrap_err();
        assert!(matches!(err, SfxrError::Json(_)));
    }

    #[test]
    fn default_base_is_440hz() {
        let s = InternalSettings::default();
        assert!((s.base_hz() - 440.0).abs() < 0.01, "got {}", s.base_hz());
    }

    #[test]
    fn set_base_hz_inverts_base_hz() {
        let mut s = InternalSettings::default();
        s.set_base_hz(1000.0);
        assert!((s.base_hz() - 1000.0).abs() < 0.05, "got {}", s.base_hz());
    }

    #[test]
    fn delta_of_self_is_zero() {
        let s = InternalSettings::default();
        assert!(s.delta(&s).fields().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn limit_field_index() {
        let mut s = InternalSettings::default();
        s.frequency.limit = 0.25;
        assert_eq!(s.fields()[InternalSettings::LIMIT_FIELD], 0.25);
    }
}
