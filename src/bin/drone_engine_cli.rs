use std::io::BufRead;
use std::path::{Path, PathBuf};

use clap::{Args as ClapArgs, Parser, Subcommand};
use cpal::traits::{DeviceTrait, HostTrait};
use crossbeam::channel::unbounded;
use ringbuf::traits::{Producer, Split};
use ringbuf::{HeapProd, HeapRb};

use drone_engine::audio_io;
use drone_engine::command::Command;
use drone_engine::config::{BackendConfig, CONFIG};
use drone_engine::models::SessionData;
use drone_engine::pool::VoicePool;

/// CLI for streaming or rendering a drone session
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream or render a session JSON file
    Run(RunArgs),
    /// Generate a default config file and exit
    GenerateConfig(ConfigArgs),
}

#[derive(ClapArgs)]
struct RunArgs {
    /// Path to the session JSON file
    #[arg(long)]
    path: String,
    /// Render the session to the output file instead of streaming
    #[arg(long, default_value_t = false)]
    generate: bool,
}

#[derive(ClapArgs)]
struct ConfigArgs {
    /// Output path for the generated configuration
    #[arg(long, default_value = "config.toml")]
    out: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run_command(args)?,
        Commands::GenerateConfig(cfg) => {
            BackendConfig::generate_default(&cfg.out)?;
            println!("Generated default config at {}", cfg.out);
        }
    }
    Ok(())
}

fn run_command(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let json_str = std::fs::read_to_string(&args.path)?;
    let session: SessionData = serde_json::from_str(&json_str)?;

    if args.generate {
        let out_name = session
            .global_settings
            .output_filename
            .clone()
            .ok_or("outputFilename missing in global settings")?;
        let out_path = if Path::new(&out_name).is_absolute() {
            PathBuf::from(&out_name)
        } else {
            CONFIG.output_dir.join(&out_name)
        };
        render_full_wav(&session, &out_path)?;
        println!("Generated session at {}", out_path.display());
        return Ok(());
    }

    let host = cpal::default_host();
    let device = host.default_output_device().ok_or("no output device")?;
    let cfg = device.default_output_config()?;
    let stream_rate = cfg.sample_rate().0;

    let pool = VoicePool::from_settings(&session.drone, stream_rate as f32);
    let rb = HeapRb::<Command>::new(64);
    let (mut prod, cons) = rb.split();
    let (stop_tx, stop_rx) = unbounded();

    let audio_thread = std::thread::spawn(move || {
        audio_io::run_audio_stream(pool, cons, stop_rx);
    });

    println!(
        "Streaming {}... type 'help' for commands, Ctrl+C to stop",
        args.path
    );

    let (ctrlc_tx, ctrlc_rx) = unbounded::<()>();
    ctrlc::set_handler(move || {
        let _ = ctrlc_tx.send(());
    })?;

    // stdin lines feed the command queue; Ctrl+C or `quit` ends the session
    let (line_tx, line_rx) = unbounded::<String>();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(text) => {
                    if line_tx.send(text).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });

    loop {
        crossbeam::select! {
            recv(line_rx) -> line => {
                match line {
                    Ok(text) => {
                        if !apply_control_line(&text, &mut prod) {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
            recv(ctrlc_rx) -> _ => break,
        }
    }

    let _ = stop_tx.send(());
    let _ = audio_thread.join();
    Ok(())
}

/// Parse one control line and push the matching command. Returns false when
/// the session should end.
fn apply_control_line(line: &str, prod: &mut HeapProd<Command>) -> bool {
    let mut parts = line.split_whitespace();
    let keyword = match parts.next() {
        Some(word) => word,
        None => return true,
    };
    let command = match keyword {
        "quit" | "exit" => return false,
        "help" => {
            println!("commands: voices N | rate X | range MIN MAX | width X | pause | resume | quit");
            return true;
        }
        "voices" => parts
            .next()
            .and_then(|v| v.parse().ok())
            .map(Command::SetNumVoices),
        "rate" => parts
            .next()
            .and_then(|v| v.parse().ok())
            .map(Command::SetLfoRate),
        "width" => parts
            .next()
            .and_then(|v| v.parse().ok())
            .map(Command::SetStereoWidth),
        "range" => {
            let min = parts.next().and_then(|v| v.parse().ok());
            let max = parts.next().and_then(|v| v.parse().ok());
            match (min, max) {
                (Some(min_hz), Some(max_hz)) => Some(Command::SetOscFreqRange { min_hz, max_hz }),
                _ => None,
            }
        }
        "pause" => Some(Command::SetPaused(true)),
        "resume" => Some(Command::SetPaused(false)),
        _ => None,
    };
    match command {
        Some(cmd) => {
            if prod.try_push(cmd).is_err() {
                log::warn!("command queue full, dropped {cmd:?}");
            }
        }
        None => println!("unrecognized command: {line}"),
    }
    true
}

fn render_full_wav(session: &SessionData, out_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    use hound::{SampleFormat, WavSpec, WavWriter};

    let sample_rate = session.global_settings.sample_rate;
    let mut pool = VoicePool::from_settings(&session.drone, sample_rate as f32);
    let target_frames = (session.global_settings.duration * sample_rate as f64) as usize;

    let spec = WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    if let Some(dir) = out_path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }
    let mut writer = WavWriter::create(out_path, spec)?;
    let start_time = std::time::Instant::now();
    let master_gain = CONFIG.master_gain;

    let mut remaining = target_frames;
    let mut buffer = vec![0.0f32; 512 * 2];
    while remaining > 0 {
        let frames = 512.min(remaining);
        buffer.resize(frames * 2, 0.0);
        pool.process_block(&mut buffer);
        for sample in &buffer[..frames * 2] {
            let s = ((sample * master_gain).clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer.write_sample(s)?;
        }
        remaining -= frames;
    }

    writer.finalize()?;
    println!(
        "Total generation time: {:.2}s",
        start_time.elapsed().as_secs_f32()
    );
    Ok(())
}
