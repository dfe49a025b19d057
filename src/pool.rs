use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::command::Command;
use crate::dsp::SmoothedValue;
use crate::models::DroneSettings;
use crate::tuning::Tuning;
use crate::voice::DroneVoice;

/// Ramp window for the loudness-compensation gain, seconds.
const GAIN_RAMP_TIME: f32 = 0.1;

/// Fixed-capacity bank of drone voices.
///
/// All voices are allocated once at construction and never destroyed;
/// changing the active count only flips voices between fading in and fading
/// out. Silenced voices keep being processed so their ramps complete and
/// their oscillators stay in motion, which keeps every control operation an
/// index mutation into an already-allocated array -- nothing on the audio
/// path allocates.
pub struct VoicePool {
    voices: Vec<DroneVoice>,
    tuning: Tuning,
    num_active: usize,
    gain: SmoothedValue,
    sample_rate: f32,
    paused: bool,
    rng: StdRng,
}

impl VoicePool {
    pub fn new(
        num_active: usize,
        sample_rate: f32,
        capacity: usize,
        min_osc_freq: f32,
        max_osc_freq: f32,
    ) -> Self {
        Self::build(
            num_active,
            sample_rate,
            capacity,
            Tuning::new(min_osc_freq, max_osc_freq),
            StdRng::from_entropy(),
        )
    }

    /// Like `new` but with a caller-supplied RNG, so tests are deterministic.
    pub fn with_rng(
        num_active: usize,
        sample_rate: f32,
        capacity: usize,
        min_osc_freq: f32,
        max_osc_freq: f32,
        rng: StdRng,
    ) -> Self {
        Self::build(
            num_active,
            sample_rate,
            capacity,
            Tuning::new(min_osc_freq, max_osc_freq),
            rng,
        )
    }

    /// Build a pool from a session's drone settings.
    pub fn from_settings(settings: &DroneSettings, sample_rate: f32) -> Self {
        let mut tuning = Tuning::new(settings.min_osc_freq, settings.max_osc_freq);
        tuning.set_lfo_freq_range(settings.min_lfo_freq, settings.max_lfo_freq);
        tuning.set_lfo_rate(settings.lfo_rate);
        tuning.set_stereo_width(settings.stereo_width);
        let capacity = settings.max_voices.max(settings.num_voices);
        Self::build(
            settings.num_voices,
            sample_rate,
            capacity,
            tuning,
            StdRng::from_entropy(),
        )
    }

    fn build(
        num_active: usize,
        sample_rate: f32,
        capacity: usize,
        tuning: Tuning,
        mut rng: StdRng,
    ) -> Self {
        let num_active = num_active.min(capacity);
        let max_level = if num_active > 0 {
            0.5 / num_active as f32
        } else {
            0.0
        };
        let mut voices = Vec::with_capacity(capacity);
        for i in 0..capacity {
            voices.push(DroneVoice::new(
                sample_rate,
                max_level,
                i >= num_active,
                &tuning,
                &mut rng,
            ));
        }

        let mut gain = SmoothedValue::new(0.0);
        gain.reset(sample_rate, GAIN_RAMP_TIME);

        let mut pool = Self {
            voices,
            tuning,
            num_active,
            gain,
            sample_rate,
            paused: false,
            rng,
        };
        pool.set_gain_offset();
        pool
    }

    /// Render one stereo sample: every voice processed (silenced ones
    /// included), summed, scaled by the smoothed compensation gain.
    pub fn process(&mut self) -> (f32, f32) {
        let Self {
            voices,
            tuning,
            rng,
            gain,
            ..
        } = self;
        let mut left = 0.0f32;
        let mut right = 0.0f32;
        for voice in voices.iter_mut() {
            let (l, r) = voice.process(tuning, rng);
            left += l;
            right += r;
        }
        let g = gain.next_value();
        (left * g, right * g)
    }

    /// Fill an interleaved stereo buffer. Writes silence while paused.
    pub fn process_block(&mut self, buffer: &mut [f32]) {
        buffer.fill(0.0);
        if self.paused {
            return;
        }
        for frame in buffer.chunks_exact_mut(2) {
            let (l, r) = self.process();
            frame[0] = l;
            frame[1] = r;
        }
    }

    /// Change how many voices are audible. Clamped to the pool capacity.
    ///
    /// Fewer simultaneous voices means each must be louder to keep the total
    /// perceived output roughly constant, so every voice (active or not) is
    /// retargeted to the new per-voice level, ramped.
    pub fn set_num_voices(&mut self, n: usize) {
        let n = n.min(self.voices.len());
        let Self {
            voices,
            tuning,
            rng,
            ..
        } = self;
        if n > 0 {
            let max_level = 1.0 / n as f32;
            for (i, voice) in voices.iter_mut().enumerate() {
                if i < n {
                    voice.start(tuning, rng);
                } else {
                    voice.silence();
                }
                voice.set_max_level(max_level);
            }
        } else {
            for voice in voices.iter_mut() {
                voice.silence();
            }
        }
        self.num_active = n;
        self.set_gain_offset();
    }

    /// Shared LFO rate offset in [0, 1]; pushed to every voice immediately.
    pub fn set_lfo_rate(&mut self, rate: f32) {
        let Self { voices, tuning, .. } = self;
        tuning.set_lfo_rate(rate);
        for voice in voices.iter_mut() {
            voice.update_lfo_freq(tuning);
        }
    }

    /// Audible frequency range, clamped to [80, 2000] Hz. Only affects
    /// future randomization events; sounding oscillators are left alone.
    pub fn set_osc_freq_range(&mut self, min_hz: f32, max_hz: f32) {
        self.tuning.set_osc_freq_range(min_hz, max_hz);
    }

    /// Stereo width in [0, 1]. Only affects future pan draws.
    pub fn set_stereo_width(&mut self, width: f32) {
        self.tuning.set_stereo_width(width);
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::SetNumVoices(n) => self.set_num_voices(n),
            Command::SetLfoRate(rate) => self.set_lfo_rate(rate),
            Command::SetOscFreqRange { min_hz, max_hz } => self.set_osc_freq_range(min_hz, max_hz),
            Command::SetStereoWidth(width) => self.set_stereo_width(width),
            Command::SetPaused(paused) => self.paused = paused,
        }
    }

    pub fn num_active(&self) -> usize {
        self.num_active
    }

    pub fn capacity(&self) -> usize {
        self.voices.len()
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn voices(&self) -> &[DroneVoice] {
        &self.voices
    }

    pub fn output_gain_target(&self) -> f32 {
        self.gain.target_value()
    }

    /// Loudness compensation: 2 active voices sit at 0.6, rising linearly to
    /// 1.0 at 14 and capped there.
    fn set_gain_offset(&mut self) {
        let offset = ((self.num_active as f32 - 2.0) / 12.0).clamp(0.0, 1.0);
        self.gain.set_target_value(0.6 + 0.4 * offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::VoiceState;

    const SAMPLE_RATE: f32 = 48_000.0;
    const RAMP_SAMPLES: usize = 4800;

    fn seeded_pool(num_active: usize, capacity: usize) -> VoicePool {
        VoicePool::with_rng(
            num_active,
            SAMPLE_RATE,
            capacity,
            120.0,
            1200.0,
            StdRng::seed_from_u64(42),
        )
    }

    #[test]
    fn gain_offset_curve_endpoints() {
        let mut pool = seeded_pool(2, 24);
        assert!((pool.output_gain_target() - 0.6).abs() < 1e-6);

        pool.set_num_voices(14);
        assert!((pool.output_gain_target() - 1.0).abs() < 1e-6);

        pool.set_num_voices(21);
        assert!((pool.output_gain_target() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn gain_offset_curve_is_monotonic() {
        let mut pool = seeded_pool(1, 24);
        let mut prev = 0.0f32;
        for n in 0..=24 {
            pool.set_num_voices(n);
            let target = pool.output_gain_target();
            assert!(target >= prev - 1e-6, "not monotonic at n = {n}");
            assert!((0.6..=1.0).contains(&target));
            prev = target;
        }
    }

    #[test]
    fn set_num_voices_activates_prefix_and_rebalances_levels() {
        let mut pool = seeded_pool(3, 6);
        pool.set_num_voices(2);

        for (i, voice) in pool.voices().iter().enumerate() {
            if i < 2 {
                assert!(voice.is_active(), "voice {i} should be active");
            } else {
                assert!(!voice.is_active(), "voice {i} should be silenced");
            }
            assert!((voice.max_level_target() - 0.5).abs() < 1e-6);
        }
        assert_eq!(pool.num_active(), 2);
    }

    #[test]
    fn set_num_voices_clamps_to_capacity() {
        let mut pool = seeded_pool(2, 6);
        pool.set_num_voices(40);
        assert_eq!(pool.num_active(), 6);
        assert!(pool.voices().iter().all(|v| v.is_active()));
    }

    #[test]
    fn set_num_voices_zero_silences_everything() {
        let mut pool = seeded_pool(4, 6);
        pool.set_num_voices(0);
        assert_eq!(pool.num_active(), 0);
        assert!(pool.voices().iter().all(|v| !v.is_active()));

        // once the fades complete the pool emits exact silence
        for _ in 0..RAMP_SAMPLES + 10 {
            pool.process();
        }
        for _ in 0..100 {
            let (l, r) = pool.process();
            assert_eq!(l, 0.0);
            assert_eq!(r, 0.0);
        }
    }

    #[test]
    fn grown_count_restarts_silenced_voices() {
        let mut pool = seeded_pool(1, 4);
        // let the initial silenced voices rest at zero
        for _ in 0..RAMP_SAMPLES + 10 {
            pool.process();
        }
        pool.set_num_voices(3);
        assert_eq!(pool.voices()[1].state(), VoiceState::Active);
        assert_eq!(pool.voices()[2].state(), VoiceState::Active);
        assert!(!pool.voices()[3].is_active());
    }

    #[test]
    fn one_second_run_is_finite_bounded_and_keeps_inactive_voices_silent() {
        let mut pool = seeded_pool(2, 4);
        for i in 0..SAMPLE_RATE as usize {
            let (l, r) = pool.process();
            assert!(l.is_finite() && r.is_finite());
            assert!(l.abs() <= 1.0 && r.abs() <= 1.0, "clipped at sample {i}");
            if i % 1000 == 0 {
                assert_eq!(pool.voices()[2].master_gain(), 0.0);
                assert_eq!(pool.voices()[3].master_gain(), 0.0);
            }
        }
    }

    #[test]
    fn pause_writes_silence_and_resume_recovers() {
        let mut pool = seeded_pool(2, 4);
        let mut buffer = [1.0f32; 256];
        pool.pause();
        pool.process_block(&mut buffer);
        assert!(buffer.iter().all(|&s| s == 0.0));

        pool.resume();
        for _ in 0..40 {
            pool.process_block(&mut buffer);
        }
        assert!(buffer.iter().any(|&s| s != 0.0));
    }

    #[test]
    fn commands_map_to_setters() {
        let mut pool = seeded_pool(2, 8);
        pool.handle_command(Command::SetNumVoices(5));
        assert_eq!(pool.num_active(), 5);

        pool.handle_command(Command::SetLfoRate(2.0));
        assert_eq!(pool.tuning().lfo_rate(), 1.0);

        pool.handle_command(Command::SetOscFreqRange {
            min_hz: 10.0,
            max_hz: 5000.0,
        });
        assert_eq!(pool.tuning().min_osc_freq(), 80.0);
        assert_eq!(pool.tuning().max_osc_freq(), 2000.0);

        pool.handle_command(Command::SetStereoWidth(-0.2));
        assert_eq!(pool.tuning().stereo_width(), 0.0);

        pool.handle_command(Command::SetPaused(true));
        assert!(pool.is_paused());
    }

    #[test]
    fn capacity_is_fixed_after_construction() {
        let mut pool = seeded_pool(2, 4);
        pool.set_num_voices(9);
        assert_eq!(pool.capacity(), 4);
        pool.set_num_voices(0);
        assert_eq!(pool.capacity(), 4);
    }
}
