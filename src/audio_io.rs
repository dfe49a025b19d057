use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use crossbeam::channel::Receiver;
use log::{error, info, warn};
use ringbuf::traits::Consumer;
use ringbuf::HeapCons;

use crate::command::Command;
use crate::config::CONFIG;
use crate::pool::VoicePool;

/// Run the output stream until the stop channel fires.
///
/// The audio callback owns the pool outright; the control side only reaches
/// it through the command ring buffer, drained at the start of every block.
/// Nothing in the callback locks or allocates.
pub fn run_audio_stream(mut pool: VoicePool, mut commands: HeapCons<Command>, stop: Receiver<()>) {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .expect("no output device available");
    let supported_config = device.default_output_config().expect("no default config");
    let sample_format = supported_config.sample_format();
    let config: StreamConfig = supported_config.into();
    info!(
        "output stream: {} ch at {} Hz",
        config.channels, config.sample_rate.0
    );
    if config.channels != 2 {
        warn!("device is not stereo; output assumes interleaved stereo frames");
    }

    let master_gain = CONFIG.master_gain;
    let audio_callback = move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
        while let Some(cmd) = commands.try_pop() {
            pool.handle_command(cmd);
        }
        pool.process_block(data);
        if master_gain != 1.0 {
            for sample in data.iter_mut() {
                *sample *= master_gain;
            }
        }
    };
    let err_fn = |err| error!("stream error: {err}");

    let stream = match sample_format {
        SampleFormat::F32 => device
            .build_output_stream(&config, audio_callback, err_fn, None)
            .unwrap(),
        _ => panic!("Unsupported sample format"),
    };
    stream.play().unwrap();

    // Block until the control side asks us to stop; dropping the stream
    // tears the callback down.
    let _ = stop.recv();
    info!("audio stream stopped");
}
