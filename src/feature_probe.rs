use anyhow::Result;
use clap::Parser;
use log::info;

mod audio;

use audio::pitch;
use audio::{AudioConfig, FeatureStream, MicCapture};

#[derive(Parser)]
#[command(name = "feature-probe")]
#[command(about = "Prints per-frame audio features from the microphone, no lights involved")]
struct Args {
    /// Capture sample rate in Hz
    #[arg(long, default_value = "16000")]
    sample_rate: u32,

    /// Samples per capture buffer
    #[arg(long, default_value = "8")]
    buffer_size: u32,

    /// Frames in the loudness moving average
    #[arg(long, default_value = "8")]
    volume_window: usize,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let audio_config = AudioConfig {
        sample_rate: args.sample_rate,
        channels: 1,
        buffer_size: args.buffer_size,
        volume_window: args.volume_window,
    };

    let mut stream = FeatureStream::new(
        audio_config.sample_rate as f32,
        audio_config.volume_window,
    );
    stream.on_volume(|volume| println!("volume: {volume:.1}"));
    stream.on_dominant_frequency(|frequency| match pitch::classify(frequency) {
        Some(note) => println!("dominant: {frequency:.1} Hz ({note})"),
        None => println!("dominant: {frequency:.1} Hz (no pitch)"),
    });

    let mut capture = MicCapture::start(&audio_config)?;
    info!("Probe running; press Ctrl-C to stop");
    stream.run(&mut capture);

    Ok(())
}
