use thiserror::Error;

/// Errors surfaced by the library. Synthesis itself never fails; everything
/// here comes from parsing input or writing output.
#[derive(Debug, Error)]
pub enum SfxrError {
    #[error("WAV encoding failed: {0}")]
    Wav(#[from] hound::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported bit depth {0} (expected 8, 16 or 32)")]
    UnsupportedBitDepth(u16),

    #[error("unsupported sample rate {0}")]
    UnsupportedSampleRate(u32),

    #[error("unknown preset '{0}'")]
    UnknownPreset(String),

    #[error("invalid key name '{0}'")]
    InvalidKeyName(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_value() {
        assert_eq!(
            SfxrError::UnsupportedBitDepth(24).to_string(),
            "unsupported bit depth 24 (expected 8, 16 or 32)"
        );
        assert_eq!(SfxrError::UnknownPreset("boom".into()).to_string(), "unknown preset 'boom'");
    }

    #[test]
    fn json_errors_convert() {
        let err: SfxrError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, SfxrError::Json(_)));
    }
}
