//! Flanger: the dry signal plus a copy delayed by a swept integer lag.

/// Delay line length. Must stay a power of two for the index masking.
pub const BUFFER_LEN: usize = 1024;
const MASK: usize = BUFFER_LEN - 1;

#[derive(Debug, Clone)]
pub struct Flanger {
    buffer: Vec<f32>,
    write_pos: usize,
    /// Fractional lag in samples; its magnitude is the delay.
    phase: f32,
    /// Change of `phase` per output sample.
    pub sweep: f32,
    lag: usize,
}

impl Flanger {
    pub fn new(phase: f32, sweep: f32) -> Self {
        let mut flanger = Flanger {
            buffer: vec![0.0; BUFFER_LEN],
            write_pos: 0,
            phase,
            sweep,
            lag: 0,
        };
        flanger.lag = flanger.lag_for_phase();
        flanger
    }

    fn lag_for_phase(&self) -> usize {
        ((self.phase as i32).unsigned_abs() as usize).min(MASK)
    }

    pub fn lag(&self) -> usize {
        self.lag
    }

    /// Advance the lag sweep. Called once per output sample.
    pub fn sweep_lag(&mut self) {
        self.phase += self.sweep;
        self.lag = self.lag_for_phase();
    }

    /// Process one sub-sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.buffer[self.write_pos & MASK] = input;
        let delayed = self.buffer[(self.write_pos + BUFFER_LEN - self.lag) & MASK];
        self.write_pos = (self.write_pos + 1) & MASK;
        input + delayed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impulse_echoes_after_lag() {
        let mut fl = Flanger::new(10.0, 0.0);
        assert_eq!(fl.lag(), 10);
        let out: Vec<f32> = (0..20)
            .map(|i| fl.process(if i == 0 { 1.0 } else { 0.0 }))
            .collect();
        assert_eq!(out[0], 1.0);
        assert_eq!(out[10], 1.0);
        assert_eq!(out.iter().sum::<f32>(), 2.0);
    }

    #[test]
    fn zero_lag_doubles_signal() {
        let mut fl = Flanger::new(0.0, 0.0);
        assert_eq!(fl.process(0.25), 0.5);
    }

    #[test]
    fn negative_phase_uses_magnitude() {
        let fl = Flanger::new(-255.0, 0.0);
        assert_eq!(fl.lag(), 255);
    }

    #[test]
    fn sweep_is_clamped_to_buffer() {
        let mut fl = Flanger::new(1000.0, 10.0);
        for _ in 0..10 {
            fl.sweep_lag();
        }
        assert_eq!(fl.lag(), 1023);
    }
}
