use rand::Rng;

use crate::dsp::{SineOsc, SmoothedValue};
use crate::tuning::Tuning;

/// Ramp window shared by every smoothed parameter in a voice, seconds.
pub const RAMP_TIME: f32 = 0.1;

/// Envelope state of a voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    /// Gain target is 1: audible, or fading toward audible.
    Active,
    /// Gain target is 0: fading out, or resting at zero.
    FadingOut,
    /// Fading out with a restart queued for the moment the gain lands on
    /// exactly zero.
    FadingOutThenRestart,
}

/// Which end of the LFO swing was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LfoExtreme {
    High,
    Low,
}

/// Edge detection on the LFO reaching the top or bottom of its swing.
///
/// Fires once per excursion into the `>= +1` / `<= -1` region; the voice
/// redraws the bottomed-out oscillator on that edge.
#[derive(Debug, Default)]
pub struct ExtremeDetector {
    in_high: bool,
    in_low: bool,
}

impl ExtremeDetector {
    pub fn detect(&mut self, value: f32) -> Option<LfoExtreme> {
        if value >= 1.0 {
            self.in_low = false;
            if !self.in_high {
                self.in_high = true;
                return Some(LfoExtreme::High);
            }
        } else if value <= -1.0 {
            self.in_high = false;
            if !self.in_low {
                self.in_low = true;
                return Some(LfoExtreme::Low);
            }
        } else {
            self.in_high = false;
            self.in_low = false;
        }
        None
    }
}

/// One drone voice: two audio oscillators cross-faded by a slow LFO, with
/// independent stereo placement per oscillator and a smoothed fade-in/out
/// envelope.
///
/// As the LFO swings toward +1, energy moves from oscillator B to A and the
/// silent side is re-randomized; at -1 the roles are mirrored. The combined
/// energy stays governed by `avg_level` regardless of where the LFO sits.
pub struct DroneVoice {
    osc_a: SineOsc,
    osc_b: SineOsc,
    lfo: SineOsc,
    master_gain: SmoothedValue,
    avg_level: SmoothedValue,
    max_level: SmoothedValue,
    pan: [f32; 2],
    lfo_base: f32,
    state: VoiceState,
    extremes: ExtremeDetector,
}

impl DroneVoice {
    pub fn new<R: Rng>(
        sample_rate: f32,
        max_level: f32,
        start_silenced: bool,
        tuning: &Tuning,
        rng: &mut R,
    ) -> Self {
        let mut master_gain = SmoothedValue::new(0.0);
        master_gain.reset(sample_rate, RAMP_TIME);
        master_gain.set_current_and_target_value(0.0);
        master_gain.set_target_value(if start_silenced { 0.0 } else { 1.0 });

        let mut avg_level = SmoothedValue::new(0.0);
        avg_level.reset(sample_rate, RAMP_TIME);
        avg_level.set_target_value(max_level / 2.0);

        let mut max = SmoothedValue::new(0.0);
        max.reset(sample_rate, RAMP_TIME);
        max.set_target_value(max_level);

        let lfo_base = rng.gen::<f32>();
        let mut lfo = SineOsc::new(sample_rate);
        lfo.set_frequency(tuning.lfo_freq(lfo_base));

        let pan = [tuning.random_pan(rng), tuning.random_pan(rng)];

        let mut osc_a = SineOsc::new(sample_rate);
        osc_a.set_frequency(tuning.random_osc_freq(rng));
        let mut osc_b = SineOsc::new(sample_rate);
        osc_b.set_frequency(tuning.random_osc_freq(rng));

        Self {
            osc_a,
            osc_b,
            lfo,
            master_gain,
            avg_level,
            max_level: max,
            pan,
            lfo_base,
            state: if start_silenced {
                VoiceState::FadingOut
            } else {
                VoiceState::Active
            },
            extremes: ExtremeDetector::default(),
        }
    }

    /// Render one stereo sample.
    ///
    /// Silenced voices must keep being processed so their fade-out ramps run
    /// to completion and their oscillators keep advancing.
    pub fn process<R: Rng>(&mut self, tuning: &Tuning, rng: &mut R) -> (f32, f32) {
        if self.master_gain.current_value() == 0.0 && self.state == VoiceState::FadingOutThenRestart
        {
            self.state = VoiceState::FadingOut;
            self.start(tuning, rng);
        }

        let delta = self.advance_levels(tuning, rng);
        let avg = self.avg_level.current_value();

        let raw_a = self.osc_a.process() * (avg + delta);
        let raw_b = self.osc_b.process() * (avg - delta);

        let mut left = raw_a * (1.0 - self.pan[0]) + raw_b * (1.0 - self.pan[1]);
        let mut right = raw_a * self.pan[0] + raw_b * self.pan[1];

        // fade envelope applied after cross-fade and panning
        let gain = self.master_gain.next_value();
        left *= gain;
        right *= gain;
        (left, right)
    }

    /// Request fade-out. A silence request always cancels a pending restart.
    pub fn silence(&mut self) {
        match self.state {
            VoiceState::Active => {
                self.master_gain.set_target_value(0.0);
                self.state = VoiceState::FadingOut;
            }
            VoiceState::FadingOutThenRestart => {
                self.state = VoiceState::FadingOut;
            }
            VoiceState::FadingOut => {}
        }
    }

    /// Unsilence the voice.
    ///
    /// At exactly zero gain the voice restarts immediately with fresh
    /// frequencies; mid-fade-out the restart is deferred until the gain
    /// reaches zero, so no discontinuity is audible.
    pub fn start<R: Rng>(&mut self, tuning: &Tuning, rng: &mut R) {
        if self.master_gain.current_value() == 0.0 {
            self.reset_frequencies(tuning, rng);
            self.master_gain.set_target_value(1.0);
            self.state = VoiceState::Active;
        } else if self.state != VoiceState::Active {
            self.state = VoiceState::FadingOutThenRestart;
        }
    }

    /// Fade out and come back with fresh frequencies once zero is reached.
    pub fn restart(&mut self) {
        self.master_gain.set_target_value(0.0);
        self.state = VoiceState::FadingOutThenRestart;
    }

    /// Retarget the loudness ceiling, ramped. Used by the pool when the
    /// active-voice count changes.
    pub fn set_max_level(&mut self, level: f32) {
        self.max_level.set_target_value(level);
        self.avg_level.set_target_value(level / 2.0);
    }

    /// Re-derive the LFO frequency from this voice's base scalar and the
    /// shared tuning. The LFO phase is untouched.
    pub fn update_lfo_freq(&mut self, tuning: &Tuning) {
        self.lfo.set_frequency(tuning.lfo_freq(self.lfo_base));
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == VoiceState::Active
    }

    /// Fading out or resting at zero, with no restart queued.
    pub fn is_silenced(&self) -> bool {
        self.state == VoiceState::FadingOut
    }

    pub fn master_gain(&self) -> f32 {
        self.master_gain.current_value()
    }

    pub fn max_level_target(&self) -> f32 {
        self.max_level.target_value()
    }

    pub fn pans(&self) -> [f32; 2] {
        self.pan
    }

    pub fn osc_frequencies(&self) -> (f32, f32) {
        (self.osc_a.frequency(), self.osc_b.frequency())
    }

    /// Advance the level ramps and the LFO one sample, redrawing whichever
    /// oscillator just bottomed out. Returns the cross-fade delta.
    fn advance_levels<R: Rng>(&mut self, tuning: &Tuning, rng: &mut R) -> f32 {
        self.max_level.next_value();
        let lfo_val = self.lfo.process();
        match self.extremes.detect(lfo_val) {
            Some(LfoExtreme::High) => self.redraw_osc(1, tuning, rng),
            Some(LfoExtreme::Low) => self.redraw_osc(0, tuning, rng),
            None => {}
        }
        lfo_val * self.avg_level.next_value()
    }

    fn redraw_osc<R: Rng>(&mut self, index: usize, tuning: &Tuning, rng: &mut R) {
        let osc = match index {
            0 => &mut self.osc_a,
            1 => &mut self.osc_b,
            _ => return,
        };
        osc.set_frequency(tuning.random_osc_freq(rng));
        self.pan[index] = tuning.random_pan(rng);
    }

    fn reset_frequencies<R: Rng>(&mut self, tuning: &Tuning, rng: &mut R) {
        self.osc_a.set_frequency(tuning.random_osc_freq(rng));
        self.osc_b.set_frequency(tuning.random_osc_freq(rng));
        self.lfo_base = rng.gen::<f32>();
        self.lfo.set_frequency(tuning.lfo_freq(self.lfo_base));
    }
}
