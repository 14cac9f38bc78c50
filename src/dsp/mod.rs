//! DSP engine: the sfxr voice, its sample-count estimator and WAV export.
//!
//! A [`Model`] is derived once per sound and never changes. Any number of
//! [`Engine`]s may borrow the same model, each with its own mutable state,
//! so voices can run on separate threads as long as each engine stays with
//! one owner.

pub mod control;
pub mod engine;
pub mod envelope;
pub mod estimator;
pub mod filter;
pub mod flanger;
pub mod model;
pub mod oscillator;
pub mod renderer;

pub use engine::Engine;
pub use envelope::Stage;
pub use model::Model;
pub use renderer::{BitDepth, ExportConfig};
