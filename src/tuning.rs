use rand::Rng;

use crate::dsp::{constrain, constrain01};

/// Hard bounds for the audible oscillator range, Hz.
pub const OSC_FREQ_MIN_HZ: f32 = 80.0;
pub const OSC_FREQ_MAX_HZ: f32 = 2000.0;

pub const DEFAULT_MIN_OSC_FREQ: f32 = 120.0;
pub const DEFAULT_MAX_OSC_FREQ: f32 = 1200.0;
pub const DEFAULT_MIN_LFO_FREQ: f32 = 0.01;
pub const DEFAULT_MAX_LFO_FREQ: f32 = 0.1;

/// Shared tuning state for every voice in a pool.
///
/// Owned by the pool and passed by reference into voice operations. Range
/// changes only affect future randomization events; oscillators that are
/// already sounding keep their frequency until their next redraw.
#[derive(Debug, Clone)]
pub struct Tuning {
    min_osc_freq: f32,
    max_osc_freq: f32,
    min_lfo_freq: f32,
    max_lfo_freq: f32,
    lfo_rate: f32,
    stereo_width: f32,
    lfo_spread: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            min_osc_freq: DEFAULT_MIN_OSC_FREQ,
            max_osc_freq: DEFAULT_MAX_OSC_FREQ,
            min_lfo_freq: DEFAULT_MIN_LFO_FREQ,
            max_lfo_freq: DEFAULT_MAX_LFO_FREQ,
            lfo_rate: 0.0,
            stereo_width: 1.0,
            lfo_spread: 1.0,
        }
    }
}

impl Tuning {
    pub fn new(min_osc_freq: f32, max_osc_freq: f32) -> Self {
        let mut tuning = Self::default();
        tuning.set_osc_freq_range(min_osc_freq, max_osc_freq);
        tuning
    }

    /// Set the audible oscillator range. Both bounds are clamped to
    /// [80, 2000] Hz; a reversed range is normalized so draws always fall
    /// inside `[min, max]`.
    pub fn set_osc_freq_range(&mut self, min_hz: f32, max_hz: f32) {
        let min = constrain(min_hz, OSC_FREQ_MIN_HZ, OSC_FREQ_MAX_HZ);
        let max = constrain(max_hz, OSC_FREQ_MIN_HZ, OSC_FREQ_MAX_HZ);
        if min <= max {
            self.min_osc_freq = min;
            self.max_osc_freq = max;
        } else {
            self.min_osc_freq = max;
            self.max_osc_freq = min;
        }
    }

    pub fn set_lfo_freq_range(&mut self, min_hz: f32, max_hz: f32) {
        let min = min_hz.max(0.0);
        let max = max_hz.max(0.0);
        if min <= max {
            self.min_lfo_freq = min;
            self.max_lfo_freq = max;
        } else {
            self.min_lfo_freq = max;
            self.max_lfo_freq = min;
        }
    }

    pub fn set_lfo_rate(&mut self, rate: f32) {
        self.lfo_rate = constrain01(rate);
    }

    pub fn set_stereo_width(&mut self, width: f32) {
        self.stereo_width = constrain01(width);
    }

    pub fn min_osc_freq(&self) -> f32 {
        self.min_osc_freq
    }

    pub fn max_osc_freq(&self) -> f32 {
        self.max_osc_freq
    }

    pub fn lfo_rate(&self) -> f32 {
        self.lfo_rate
    }

    pub fn stereo_width(&self) -> f32 {
        self.stereo_width
    }

    /// Uniform draw from the audible oscillator range.
    pub fn random_osc_freq<R: Rng>(&self, rng: &mut R) -> f32 {
        rng.gen::<f32>() * (self.max_osc_freq - self.min_osc_freq) + self.min_osc_freq
    }

    /// Map a per-voice base scalar in [0, 1] onto the LFO range, widened at
    /// the top by the shared rate offset.
    pub fn lfo_freq(&self, base: f32) -> f32 {
        let scale = constrain01(base);
        let top = self.max_lfo_freq + self.lfo_rate * self.lfo_spread;
        self.min_lfo_freq + (top - self.min_lfo_freq) * scale
    }

    /// Stereo placement draw: 0.5 +/- width/2.
    pub fn random_pan<R: Rng>(&self, rng: &mut R) -> f32 {
        0.5 + (rng.gen::<f32>() - 0.5) * self.stereo_width
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn osc_draws_stay_inside_range() {
        let mut rng = StdRng::seed_from_u64(1);
        let tuning = Tuning::new(120.0, 1200.0);
        for _ in 0..1000 {
            let f = tuning.random_osc_freq(&mut rng);
            assert!((120.0..=1200.0).contains(&f), "out of range: {f}");
        }
    }

    #[test]
    fn osc_range_is_clamped_and_normalized() {
        let mut tuning = Tuning::default();
        tuning.set_osc_freq_range(10.0, 5000.0);
        assert_eq!(tuning.min_osc_freq(), 80.0);
        assert_eq!(tuning.max_osc_freq(), 2000.0);

        tuning.set_osc_freq_range(900.0, 300.0);
        assert_eq!(tuning.min_osc_freq(), 300.0);
        assert_eq!(tuning.max_osc_freq(), 900.0);
    }

    #[test]
    fn lfo_freq_spans_range_plus_rate() {
        let mut tuning = Tuning::default();
        assert!((tuning.lfo_freq(0.0) - DEFAULT_MIN_LFO_FREQ).abs() < 1e-6);
        assert!((tuning.lfo_freq(1.0) - DEFAULT_MAX_LFO_FREQ).abs() < 1e-6);

        tuning.set_lfo_rate(0.5);
        assert!((tuning.lfo_freq(1.0) - (DEFAULT_MAX_LFO_FREQ + 0.5)).abs() < 1e-6);
        // base scalar is clamped
        assert!((tuning.lfo_freq(7.0) - tuning.lfo_freq(1.0)).abs() < 1e-6);
    }

    #[test]
    fn rate_and_width_setters_clamp_to_unit() {
        let mut tuning = Tuning::default();
        tuning.set_lfo_rate(3.0);
        assert_eq!(tuning.lfo_rate(), 1.0);
        tuning.set_lfo_rate(-1.0);
        assert_eq!(tuning.lfo_rate(), 0.0);
        tuning.set_stereo_width(2.0);
        assert_eq!(tuning.stereo_width(), 1.0);
    }

    #[test]
    fn pan_draws_follow_width() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut tuning = Tuning::default();
        for _ in 0..1000 {
            let p = tuning.random_pan(&mut rng);
            assert!((0.0..=1.0).contains(&p));
        }

        tuning.set_stereo_width(0.0);
        for _ in 0..10 {
            assert_eq!(tuning.random_pan(&mut rng), 0.5);
        }

        tuning.set_stereo_width(0.4);
        for _ in 0..1000 {
            let p = tuning.random_pan(&mut rng);
            assert!((0.3..=0.7).contains(&p));
        }
    }
}
