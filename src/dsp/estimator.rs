//! Exact sample-count prediction without generating audio.
//!
//! Only the control recurrence decides when a sound stops, so the estimator
//! replays [`Control`] alone. It jumps between discrete events (retrigger,
//! arpeggio, envelope stage change) in one step each, and iterates the
//! frequency slide sample by sample only while a limit stop is still
//! possible before the next frequency reset.

use super::control::Control;
use super::model::Model;

/// Guard band keeping the slide factor clear of zero across rounding.
const SLIDE_MARGIN: f64 = 1e-6;

/// Number of samples an engine in state `control` will still produce.
pub fn remaining_samples(model: &Model, control: &Control) -> usize {
    if !control.playing {
        return 0;
    }

    let mut c = control.clone();
    let mut count: u64 = 0;
    // While dormant the slide cannot stop the sound before the next reset,
    // so its state is left stale.
    let mut dormant = false;

    loop {
        let k_rep = if model.rep_limit != 0 {
            (model.rep_limit as u64).saturating_sub(c.rep_time as u64).max(1)
        } else {
            u64::MAX
        };
        let k_arp = if c.arp_limit != 0 {
            (c.arp_limit as u64).saturating_sub(c.arp_time as u64).max(1)
        } else {
            u64::MAX
        };
        let k_env = c.envelope_remaining_in_stage(model);
        let k = k_rep.min(k_arp).min(k_env);

        if !dormant {
            let horizon = k_rep.min(c.envelope_remaining(model));
            dormant = slide_cannot_stop(model, &c, horizon);
        }

        // k - 1 samples with no discrete event
        let quiet = k - 1;
        if !dormant {
            for j in 1..=quiet {
                c.slide(model);
                if !c.playing {
                    return to_count(count + j);
                }
            }
        }
        let skipped = u32::try_from(quiet).unwrap_or(u32::MAX);
        c.rep_time = c.rep_time.saturating_add(skipped);
        c.arp_time = c.arp_time.saturating_add(skipped);
        c.env_time = c.env_time.saturating_add(skipped);
        count += quiet;

        // the event sample itself, in engine order
        if c.retrigger(model) {
            dormant = false;
        }
        c.arpeggiate(model);
        if !dormant {
            c.slide(model);
        }
        c.advance_envelope(model);
        count += 1;
        if !c.playing {
            return to_count(count);
        }
    }
}

fn to_count(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

/// True when the frequency limit cannot stop the sound within `horizon`
/// samples: no stop is configured, or the period can only shrink until
/// then (slide factor in `[0, 1]` and non-increasing, arpeggio jump staying
/// under the cap).
fn slide_cannot_stop(model: &Model, c: &Control, horizon: u64) -> bool {
    if !model.limit_stops {
        return true;
    }
    if model.fdslide > 0.0 || c.fslide > 1.0 || c.fperiod > model.fmaxperiod {
        return false;
    }
    if c.fslide + model.fdslide * (horizon as f64) < SLIDE_MARGIN {
        return false;
    }
    c.arp_limit == 0 || c.fperiod * model.arp_mod <= model.fmaxperiod
}
