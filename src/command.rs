/// Control messages applied on the audio thread between blocks.
///
/// Every variant carries plain scalars only, so pushing one through the
/// command ring buffer never allocates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Change how many voices are audible.
    SetNumVoices(usize),
    /// Shared LFO rate offset, 0..=1.
    SetLfoRate(f32),
    /// Audible oscillator frequency range in Hz.
    SetOscFreqRange { min_hz: f32, max_hz: f32 },
    /// Stereo width, 0..=1.
    SetStereoWidth(f32),
    SetPaused(bool),
}
