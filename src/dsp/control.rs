//! The part of the per-sample recurrence that decides when a sound stops.
//!
//! Retrigger, arpeggio, frequency slide and envelope timing live here and
//! nowhere else. The engine runs them once per output sample before doing
//! any waveform work; the estimator runs the same methods without the
//! waveform, so both always agree on the sample count.

use super::envelope::Stage;
use super::model::Model;

#[derive(Debug, Clone, PartialEq)]
pub struct Control {
    pub stage: Stage,
    pub env_time: u32,
    pub rep_time: u32,
    pub arp_time: u32,
    pub arp_limit: u32,
    pub fperiod: f64,
    pub fslide: f64,
    pub playing: bool,
}

impl Control {
    pub fn new(model: &Model) -> Self {
        let mut control = Control {
            stage: Stage::Attack,
            env_time: 0,
            rep_time: 0,
            arp_time: 0,
            arp_limit: 0,
            fperiod: 0.0,
            fslide: 0.0,
            playing: true,
        };
        control.reset_frequency(model);
        control
    }

    /// Restart the frequency glide and re-arm the arpeggio. Envelope and
    /// retrigger counters are untouched.
    pub fn reset_frequency(&mut self, model: &Model) {
        self.fperiod = model.start_period();
        self.fslide = model.start_slide();
        self.arp_time = 0;
        self.arp_limit = model.arp_limit;
    }

    /// Count one sample towards the retrigger period; on reaching it,
    /// restart the frequency glide. Returns whether that happened.
    pub fn retrigger(&mut self, model: &Model) -> bool {
        self.rep_time = self.rep_time.saturating_add(1);
        if model.rep_limit != 0 && self.rep_time >= model.rep_limit {
            self.rep_time = 0;
            self.reset_frequency(model);
            true
        } else {
            false
        }
    }

    /// Apply the one-shot arpeggio jump once its delay has elapsed.
    pub fn arpeggiate(&mut self, model: &Model) {
        self.arp_time = self.arp_time.saturating_add(1);
        if self.arp_limit != 0 && self.arp_time >= self.arp_limit {
            self.arp_limit = 0;
            self.fperiod *= model.arp_mod;
        }
    }

    /// Advance the frequency glide by one sample. Overrunning the maximum
    /// period clamps it, and stops the sound if a limit is configured.
    pub fn slide(&mut self, model: &Model) {
        self.fslide += model.fdslide;
        self.fperiod *= self.fslide;
        if self.fperiod > model.fmaxperiod {
            self.fperiod = model.fmaxperiod;
            if model.limit_stops {
                self.playing = false;
            }
        }
    }

    /// Count one sample of envelope time, moving to the next stage past the
    /// current stage's length. Leaving the decay stage stops the sound.
    pub fn advance_envelope(&mut self, model: &Model) {
        let Some(index) = self.stage.index() else {
            self.playing = false;
            return;
        };
        self.env_time = self.env_time.saturating_add(1);
        if self.env_time > model.env_length[index] {
            self.env_time = 0;
            self.stage = self.stage.next();
            if self.stage == Stage::Finished {
                self.playing = false;
            }
        }
    }

    /// One full sample of the control recurrence, in engine order.
    /// Returns whether a retrigger fired.
    pub fn step(&mut self, model: &Model) -> bool {
        let retriggered = self.retrigger(model);
        self.arpeggiate(model);
        self.slide(model);
        self.advance_envelope(model);
        retriggered
    }

    /// Samples until the current envelope stage ends, counting the sample
    /// that moves to the next stage.
    pub fn envelope_remaining_in_stage(&self, model: &Model) -> u64 {
        match self.stage.index() {
            Some(index) => (model.env_length[index] as u64 + 1)
                .saturating_sub(self.env_time as u64)
                .max(1),
            None => 1,
        }
    }

    /// Samples until the envelope finishes, counting the current one.
    pub fn envelope_remaining(&self, model: &Model) -> u64 {
        let Some(index) = self.stage.index() else {
            return 0;
        };
        let current = (model.env_length[index] as u64 + 1).saturating_sub(self.env_time as u64);
        let later: u64 = model.env_length[index + 1..]
            .iter()
            .map(|&len| len as u64 + 1)
            .sum();
        current + later
    }
}
