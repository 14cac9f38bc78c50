//! Owned storage for sound definitions.
//!
//! A [`SoundBank`] keeps every derived [`Model`] alive for as long as the
//! bank exists. Voices are created on demand and borrow their model from
//! the bank, so no engine can outlive the definition it plays.

use log::debug;

use crate::convert::to_internal;
use crate::dsp::renderer;
use crate::dsp::{Engine, Model};
use crate::settings::ReadableSettings;

/// Index of a sound inside a [`SoundBank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SoundId(usize);

impl SoundId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A named sound definition.
#[derive(Debug, Clone)]
pub struct BankEntry {
    pub name: String,
    /// Settings the model was derived from.
    pub settings: ReadableSettings,
    /// MIDI key overriding the base frequency, if any.
    pub key: Option<i32>,
    pub model: Model,
}

/// Append-only arena of sounds.
#[derive(Debug, Clone, Default)]
pub struct SoundBank {
    entries: Vec<BankEntry>,
}

impl SoundBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive a model from `settings` and store it under `name`. Names need
    /// not be unique; [`SoundBank::find`] returns the earliest match.
    pub fn insert(&mut self, name: impl Into<String>, settings: ReadableSettings, key: Option<i32>) -> SoundId {
        let name = name.into();
        let model = Model::new(&to_internal(&settings), key);
        let id = SoundId(self.entries.len());
        debug!("bank: stored '{name}' as sound {}", id.0);
        self.entries.push(BankEntry { name, settings, key, model });
        id
    }

    pub fn get(&self, id: SoundId) -> Option<&BankEntry> {
        self.entries.get(id.0)
    }

    pub fn model(&self, id: SoundId) -> Option<&Model> {
        self.get(id).map(|entry| &entry.model)
    }

    /// Look a sound up by name (exact match).
    pub fn find(&self, name: &str) -> Option<SoundId> {
        self.entries.iter().position(|entry| entry.name == name).map(SoundId)
    }

    /// A fresh voice playing sound `id` from the start.
    pub fn voice(&self, id: SoundId) -> Option<Engine<'_>> {
        self.model(id).map(Engine::new)
    }

    /// Render sound `id` at 44100 Hz, cut after `max_samples`.
    pub fn render(&self, id: SoundId, max_samples: usize) -> Option<Vec<f32>> {
        self.model(id).map(|model| renderer::render(model, max_samples))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SoundId, &BankEntry)> {
        self.entries.iter().enumerate().map(|(i, entry)| (SoundId(i), entry))
    }
}
