//! Three-stage volume envelope: linear attack, punchy sustain, linear decay.

/// Envelope stages. Moving past `Decay` ends the sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Attack,
    Sustain,
    Decay,
    Finished,
}

impl Stage {
    /// Position of the stage in the model's length table. `Finished` has
    /// no length.
    pub fn index(self) -> Option<usize> {
        match self {
            Stage::Attack => Some(0),
            Stage::Sustain => Some(1),
            Stage::Decay => Some(2),
            Stage::Finished => None,
        }
    }

    pub fn next(self) -> Stage {
        match self {
            Stage::Attack => Stage::Sustain,
            Stage::Sustain => Stage::Decay,
            Stage::Decay | Stage::Finished => Stage::Finished,
        }
    }
}

/// Volume at `time` samples into `stage`, where the stage lasts `length`
/// samples. Zero-length stages count as already complete (fraction 0).
///
/// Returns `None` for `Finished`; the caller keeps its last volume.
pub fn volume(stage: Stage, time: u32, length: u32, punch: f32) -> Option<f32> {
    let fraction = if length == 0 {
        0.0
    } else {
        time as f32 / length as f32
    };
    match stage {
        Stage::Attack => Some(fraction),
        Stage::Sustain => Some(1.0 + (1.0 - fraction) * 2.0 * punch),
        Stage::Decay => Some(1.0 - fraction),
        Stage::Finished => None,
    }
}
