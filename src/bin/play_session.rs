use clap::Parser;
use cpal::traits::{DeviceTrait, HostTrait};
use crossbeam::channel::unbounded;
use ringbuf::traits::Split;
use ringbuf::HeapRb;

use drone_engine::audio_io;
use drone_engine::command::Command;
use drone_engine::models::SessionData;
use drone_engine::pool::VoicePool;

/// Simple CLI to play a drone session JSON file
#[derive(Parser)]
struct Args {
    /// Path to the session JSON file
    session_file: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();
    let json_str = std::fs::read_to_string(&args.session_file)?;
    let session: SessionData = serde_json::from_str(&json_str)?;

    let host = cpal::default_host();
    let device = host.default_output_device().ok_or("no output device")?;
    let cfg = device.default_output_config()?;
    let stream_rate = cfg.sample_rate().0;

    let pool = VoicePool::from_settings(&session.drone, stream_rate as f32);
    let rb = HeapRb::<Command>::new(64);
    let (_prod, cons) = rb.split();
    let (stop_tx, stop_rx) = unbounded();

    let audio_thread = std::thread::spawn(move || {
        audio_io::run_audio_stream(pool, cons, stop_rx);
    });

    println!("Playing {}... press Ctrl+C to stop", args.session_file);
    ctrlc::set_handler(move || {
        let _ = stop_tx.send(());
    })?;

    let _ = audio_thread.join();
    Ok(())
}
