//! MIDI key helpers used for pitching a sound to a musical note.
//!
//! Keys follow the usual numbering: C4 = 60, A4 = 69 = 440 Hz.

use crate::error::SfxrError;

/// Frequency of A4.
pub const A4_HZ: f64 = 440.0;
/// MIDI key number of A4.
pub const A4_KEY: i32 = 69;

const KEY_NAMES: [&str; 12] = [
    "c", "c#", "d", "d#", "e", "f", "f#", "g", "g#", "a", "a#", "b",
];

/// Equal-tempered frequency of a MIDI key.
pub fn key_to_frequency(key: i32) -> f64 {
    A4_HZ * 2.0_f64.powf((key - A4_KEY) as f64 / 12.0)
}

/// Nearest MIDI key to a frequency. Non-positive frequencies have no key
/// and return `None`.
pub fn frequency_to_key(freq: f64) -> Option<i32> {
    if freq <= 0.0 || !freq.is_finite() {
        return None;
    }
    Some(((freq / A4_HZ).log2() * 12.0).round() as i32 + A4_KEY)
}

/// Parse a key name such as `"a4"`, `"C#3"`, `"bb5"` or `"c-1"`.
///
/// Letters are case-insensitive. `#` raises and `b` lowers the note by a
/// semitone. A missing octave means octave 4.
pub fn key_from_name(name: &str) -> Result<i32, SfxrError> {
    let invalid = || SfxrError::InvalidKeyName(name.to_string());
    let mut chars = name.trim().chars();

    let semitone = match chars.next().map(|c| c.to_ascii_lowercase()) {
        Some('c') => 0,
        Some('d') => 2,
        Some('e') => 4,
        Some('f') => 5,
        Some('g') => 7,
        Some('a') => 9,
        Some('b') => 11,
        _ => return Err(invalid()),
    };

    let rest = chars.as_str();
    let (semitone, octave_str) = if let Some(tail) = rest.strip_prefix('#') {
        (semitone + 1, tail)
    } else if let Some(tail) = rest.strip_prefix('b') {
        (semitone - 1, tail)
    } else {
        (semitone, rest)
    };

    let octave: i32 = if octave_str.is_empty() {
        4
    } else {
        octave_str.parse().map_err(|_| invalid())?
    };

    Ok((octave + 1) * 12 + semitone)
}

/// Lowercase name of a key, e.g. `60` → `"c4"`, `61` → `"c#4"`.
pub fn name_from_key(key: i32) -> String {
    let name = KEY_NAMES[key.rem_euclid(12) as usize];
    format!("{name}{}", key.div_euclid(12) - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_is_440() {
        assert!((key_to_frequency(69) - 440.0).abs() < 1e-9);
        assert_eq!(frequency_to_key(440.0), Some(69));
        assert_eq!(key_from_name("a4").unwrap(), 69);
        assert_eq!(name_from_key(69), "a4");
    }

    #[test]
    fn middle_c() {
        let f = key_to_frequency(60);
        assert!((f - 261.626).abs() < 0.01, "C4 should be ~261.63Hz, got {f}");
        assert_eq!(frequency_to_key(262.0), Some(60));
        assert_eq!(key_from_name("c4").unwrap(), 60);
        assert_eq!(name_from_key(60), "c4");
    }

    #[test]
    fn accidentals_and_defaults() {
        assert_eq!(key_from_name("F#4").unwrap(), key_from_name("Gb4").unwrap());
        assert_eq!(key_from_name("bb3").unwrap(), 58);
        assert_eq!(key_from_name("a").unwrap(), 69);
        assert_eq!(key_from_name("c-1").unwrap(), 0);
        assert_eq!(key_from_name("C0").unwrap(), 12);
    }

    #[test]
    fn bad_names_are_rejected() {
        for name in ["", "h4", "c#x", "4c"] {
            assert!(
                matches!(key_from_name(name), Err(SfxrError::InvalidKeyName(_))),
                "{name:?} should not parse"
            );
        }
    }

    #[test]
    fn helpers_invert_each_other() {
        for key in 0..128 {
            assert_eq!(frequency_to_key(key_to_frequency(key)), Some(key), "key {key}");
            assert_eq!(key_from_name(&name_from_key(key)).unwrap(), key, "key {key}");
        }
    }

    #[test]
    fn no_key_for_silence() {
        assert_eq!(frequency_to_key(0.0), None);
        assert_eq!(frequency_to_key(-5.0), None);
        assert_eq!(frequency_to_key(f64::NAN), None);
    }
}
