pub mod bank;
pub mod convert;
pub mod dsp;
pub mod error;
pub mod midi;
pub mod preset;
pub mod settings;

pub use crate::bank::{SoundBank, SoundId};
pub use crate::convert::{SAMPLE_RATE, to_internal, to_readable};
pub use crate::dsp::{BitDepth, Engine, ExportConfig, Model, Stage};
pub use crate::error::SfxrError;
pub use crate::preset::PresetKind;
pub use crate::settings::{InternalSettings, ReadableSettings, WaveType};

use rand::SeedableRng;
use rand_pcg::Pcg32;
use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the sfxr-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// Render readable settings to mono f32 samples at 44100 Hz, cut after
/// `max_samples`.
pub fn render(settings: &ReadableSettings, max_samples: usize) -> Vec<f32> {
    dsp::renderer::render(&Model::from(&to_internal(settings)), max_samples)
}

/// Render readable settings and encode them as a WAV file.
pub fn render_wav(settings: &ReadableSettings, config: &ExportConfig) -> Result<Vec<u8>, SfxrError> {
    config.validate()?;
    dsp::renderer::encode_wav(&render(settings, config.max_samples()), config)
}

/// Generate a preset by family name from a seeded generator.
pub fn preset_settings(kind: &str, seed: u64) -> Result<ReadableSettings, SfxrError> {
    let kind: PresetKind = kind.parse()?;
    Ok(kind.generate(&mut Pcg32::seed_from_u64(seed)))
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{e}"))
}

/// WASM-exposed: render a JSON settings document to a WAV byte array.
#[wasm_bindgen]
pub fn render_settings_wav(json: &str, sample_rate: u32, bits: u16) -> Result<Vec<u8>, JsValue> {
    let settings = ReadableSettings::from_json(json).map_err(js_error)?;
    let config = ExportConfig::new(sample_rate, bits).map_err(js_error)?;
    render_wav(&settings, &config).map_err(js_error)
}

/// WASM-exposed: render a JSON settings document to mono f32 samples.
/// Returns the raw 44100 Hz buffer for AudioWorklet playback, at most
/// `max_seconds` long (60 s when omitted).
#[wasm_bindgen]
pub fn render_settings_samples(json: &str, max_seconds: Option<f32>) -> Result<Vec<f32>, JsValue> {
    let settings = ReadableSettings::from_json(json).map_err(js_error)?;
    let limit = dsp::renderer::max_samples(max_seconds.unwrap_or(dsp::renderer::DEFAULT_MAX_SECONDS));
    Ok(render(&settings, limit))
}

/// WASM-exposed: generate a preset (`"coin"`, `"laser"`, ...) and return
/// its readable settings as a JS object.
#[wasm_bindgen]
pub fn generate_preset(kind: &str, seed: u32) -> Result<JsValue, JsValue> {
    let settings = preset_settings(kind, seed as u64).map_err(js_error)?;
    serde_wasm_bindgen::to_value(&settings).map_err(js_error)
}

/// WASM-exposed: convert a JSON settings document to its internal
/// parameter form.
#[wasm_bindgen]
pub fn settings_to_internal(json: &str) -> Result<JsValue, JsValue> {
    let settings = ReadableSettings::from_json(json).map_err(js_error)?;
    serde_wasm_bindgen::to_value(&to_internal(&settings)).map_err(js_error)
}
