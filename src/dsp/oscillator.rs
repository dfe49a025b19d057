use std::f32::consts::TAU;

/// Phase-accumulating sine oscillator.
///
/// Produces one sample per `process` call in `[-1, 1]`. The same struct is
/// used for audible tones and for the per-voice control LFO; an LFO is just
/// this oscillator run at sub-audio frequencies.
#[derive(Debug, Clone)]
pub struct SineOsc {
    sample_rate: f32,
    frequency: f32,
    phase: f32,
    phase_inc: f32,
}

impl SineOsc {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            frequency: 0.0,
            phase: 0.0,
            phase_inc: 0.0,
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.update_phase_inc();
    }

    /// Retune the oscillator. The phase is left untouched, so a running
    /// oscillator changes pitch without a discontinuity.
    pub fn set_frequency(&mut self, hz: f32) {
        self.frequency = hz;
        self.update_phase_inc();
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    fn update_phase_inc(&mut self) {
        self.phase_inc = if self.sample_rate > 0.0 {
            TAU * self.frequency / self.sample_rate
        } else {
            0.0
        };
    }

    /// Emit the sample for the current phase, then advance one sample.
    pub fn process(&mut self) -> f32 {
        let out = self.phase.sin();
        self.phase += self.phase_inc;
        if self.phase >= TAU {
            self.phase -= TAU;
        }
        out
    }
}
