use anyhow::Result;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, Device, SampleRate, Stream, StreamConfig};
use crossbeam_channel::{Receiver, Sender};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::stream::FrameSource;

/// Capture and analysis tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Capture sample rate in Hz.
    pub sample_rate: u32,
    /// Capture channel count; the pipeline analyzes mono.
    pub channels: u16,
    /// Samples per capture buffer; one buffer is one analysis frame.
    pub buffer_size: u32,
    /// Frames in the loudness moving average; smaller is more reactive.
    pub volume_window: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            channels: 1,
            buffer_size: 8,
            volume_window: 8,
        }
    }
}

/// Live microphone capture.
///
/// Opens the default input device with the configured rate/channel/buffer
/// shape and forwards every delivery as a raw little-endian byte frame over an
/// unbounded channel. The capture callback does no analysis work; the consumer
/// pulls frames sequentially through [`FrameSource`].
pub struct MicCapture {
    // Held so capture keeps running; cpal stops the stream on drop.
    #[allow(dead_code)]
    stream: Stream,
    frames: Receiver<Vec<u8>>,
}

impl MicCapture {
    pub fn start(config: &AudioConfig) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| anyhow::anyhow!("no input device available"))?;

        info!(
            "Using audio device: {}",
            device.name().unwrap_or_else(|_| "unknown".to_string())
        );

        let stream_config = StreamConfig {
            channels: config.channels,
            sample_rate: SampleRate(config.sample_rate),
            buffer_size: BufferSize::Fixed(config.buffer_size),
        };

        let (sender, frames) = crossbeam_channel::unbounded();
        let stream = Self::create_input_stream(&device, &stream_config, sender)?;
        stream.play()?;

        info!(
            "Microphone stream started: {} Hz, {} channel(s), {}-sample buffers",
            config.sample_rate, config.channels, config.buffer_size
        );

        Ok(Self { stream, frames })
    }

    fn create_input_stream(
        device: &Device,
        config: &StreamConfig,
        sender: Sender<Vec<u8>>,
    ) -> Result<Stream> {
        let stream = device.build_input_stream(
            config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                let bytes: Vec<u8> = data.iter().flat_map(|s| s.to_le_bytes()).collect();
                if sender.send(bytes).is_err() {
                    warn!("failed to forward capture buffer");
                }
            },
            |err| {
                warn!("microphone stream error: {err}");
            },
            None,
        )?;

        Ok(stream)
    }
}

impl FrameSource for MicCapture {
    fn next_frame(&mut self) -> Option<Vec<u8>> {
        self.frames.recv().ok()
    }
}

impl Drop for MicCapture {
    fn drop(&mut self) {
        info!("Microphone stream stopped");
    }
}
