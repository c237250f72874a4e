use log::{debug, warn};

use super::decoder;
use super::dominant;
use super::loudness::LoudnessMeter;
use super::spectrum::SpectralAnalyzer;
use super::InputError;

/// A live source of raw capture frames.
///
/// The sequence is lazy, effectively infinite, and non-restartable; `None`
/// means the capture has stopped for good. Implementations deliver frames one
/// at a time so the consumer's shared state only ever sees sequential access.
pub trait FrameSource {
    /// Blocks until the next raw byte frame, or `None` once capture has ended.
    fn next_frame(&mut self) -> Option<Vec<u8>>;
}

type Listener = Box<dyn FnMut(f32) + Send>;

/// Handle for a registered listener, used to unregister it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

/// Wires the per-frame pipeline together and fans results out to listeners.
///
/// Each raw frame is decoded, run through spectral analysis and dominant-bin
/// extraction, then loudness metering, and the two features are emitted on
/// independent channels. Emission is synchronous and fire-and-forget: listeners
/// run inside the frame's processing, and with no listeners registered the
/// values are simply dropped. Malformed frames are logged and skipped; they
/// never stop the stream.
pub struct FeatureStream {
    analyzer: SpectralAnalyzer,
    loudness: LoudnessMeter,
    volume_listeners: Vec<(ListenerId, Listener)>,
    frequency_listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
}

impl FeatureStream {
    pub fn new(sample_rate: f32, volume_window: usize) -> Self {
        Self {
            analyzer: SpectralAnalyzer::new(sample_rate),
            loudness: LoudnessMeter::new(volume_window),
            volume_listeners: Vec::new(),
            frequency_listeners: Vec::new(),
            next_listener: 0,
        }
    }

    /// Registers a listener for the smoothed loudness emitted every frame.
    pub fn on_volume(&mut self, listener: impl FnMut(f32) + Send + 'static) -> ListenerId {
        let id = self.next_id();
        self.volume_listeners.push((id, Box::new(listener)));
        id
    }

    /// Registers a listener for the dominant frequency (Hz) emitted every frame.
    pub fn on_dominant_frequency(
        &mut self,
        listener: impl FnMut(f32) + Send + 'static,
    ) -> ListenerId {
        let id = self.next_id();
        self.frequency_listeners.push((id, Box::new(listener)));
        id
    }

    /// Unregisters a listener from either channel; returns whether it existed.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.volume_listeners.len() + self.frequency_listeners.len();
        self.volume_listeners.retain(|(lid, _)| *lid != id);
        self.frequency_listeners.retain(|(lid, _)| *lid != id);
        before != self.volume_listeners.len() + self.frequency_listeners.len()
    }

    fn next_id(&mut self) -> ListenerId {
        self.next_listener += 1;
        ListenerId(self.next_listener)
    }

    /// Processes one raw capture buffer.
    pub fn process_frame(&mut self, buffer: &[u8]) {
        let samples = decoder::decode_frame(buffer);
        match self.analyze(&samples) {
            Ok((frequency, volume)) => {
                debug!("frame: dominant {frequency:.1} Hz, volume {volume:.1}");
                for (_, listener) in &mut self.frequency_listeners {
                    listener(frequency);
                }
                for (_, listener) in &mut self.volume_listeners {
                    listener(volume);
                }
            }
            Err(err) => warn!("skipping frame: {err}"),
        }
    }

    fn analyze(&mut self, samples: &[i16]) -> Result<(f32, f32), InputError> {
        if samples.is_empty() {
            return Err(InputError::EmptyFrame);
        }

        let spectrum = self.analyzer.analyze(samples)?;
        let frequency = dominant::dominant_frequency(&spectrum.frequencies, &spectrum.magnitudes)?;
        let volume = self.loudness.update(samples);

        Ok((frequency, volume))
    }

    /// Drains the source until it ends, processing frames strictly in order.
    pub fn run(&mut self, source: &mut dyn FrameSource) {
        while let Some(buffer) = source.next_frame() {
            self.process_frame(&buffer);
        }
        debug!("frame source ended");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct VecSource(std::vec::IntoIter<Vec<u8>>);

    impl FrameSource for VecSource {
        fn next_frame(&mut self) -> Option<Vec<u8>> {
            self.0.next()
        }
    }

    fn sine_bytes(frequency: f32, sample_rate: f32, len: usize) -> Vec<u8> {
        (0..len)
            .flat_map(|i| {
                let t = i as f32 / sample_rate;
                let sample = ((2.0 * std::f32::consts::PI * frequency * t).sin() * 10_000.0) as i16;
                sample.to_le_bytes()
            })
            .collect()
    }

    fn collected(stream: &mut FeatureStream) -> (Arc<Mutex<Vec<f32>>>, Arc<Mutex<Vec<f32>>>) {
        let volumes = Arc::new(Mutex::new(Vec::new()));
        let frequencies = Arc::new(Mutex::new(Vec::new()));
        {
            let volumes = Arc::clone(&volumes);
            stream.on_volume(move |v| volumes.lock().unwrap().push(v));
        }
        {
            let frequencies = Arc::clone(&frequencies);
            stream.on_dominant_frequency(move |f| frequencies.lock().unwrap().push(f));
        }
        (volumes, frequencies)
    }

    #[test]
    fn emits_both_features_per_frame() {
        let mut stream = FeatureStream::new(16_000.0, 8);
        let (volumes, frequencies) = collected(&mut stream);

        let mut source = VecSource(
            vec![
                sine_bytes(1_000.0, 16_000.0, 256),
                sine_bytes(1_000.0, 16_000.0, 256),
            ]
            .into_iter(),
        );
        stream.run(&mut source);

        let volumes = volumes.lock().unwrap();
        let frequencies = frequencies.lock().unwrap();
        assert_eq!(volumes.len(), 2);
        assert_eq!(frequencies.len(), 2);

        // 256 samples at 16 kHz gives 62.5 Hz bins; 1 kHz is bin-aligned.
        for &f in frequencies.iter() {
            assert!((f - 1_000.0).abs() <= 62.5, "dominant {f} Hz");
        }
        assert!(volumes.iter().all(|&v| v > 0.0));
    }

    #[test]
    fn silent_frames_emit_zero_volume_and_no_pitch_frequency() {
        let mut stream = FeatureStream::new(16_000.0, 8);
        let (volumes, frequencies) = collected(&mut stream);

        for _ in 0..4 {
            stream.process_frame(&[0u8; 64]);
        }

        assert!(volumes.lock().unwrap().iter().all(|&v| v == 0.0));
        // Flat spectrum resolves to the DC bin.
        assert!(frequencies.lock().unwrap().iter().all(|&f| f == 0.0));
    }

    #[test]
    fn empty_and_single_byte_frames_are_skipped() {
        let mut stream = FeatureStream::new(16_000.0, 8);
        let (volumes, frequencies) = collected(&mut stream);

        stream.process_frame(&[]);
        stream.process_frame(&[0x7f]);

        assert!(volumes.lock().unwrap().is_empty());
        assert!(frequencies.lock().unwrap().is_empty());
    }

    #[test]
    fn listeners_are_optional() {
        let mut stream = FeatureStream::new(16_000.0, 8);
        // No listeners registered: the frame is processed and values dropped.
        stream.process_frame(&sine_bytes(500.0, 16_000.0, 128));
    }

    #[test]
    fn unsubscribed_listeners_stop_receiving() {
        let mut stream = FeatureStream::new(16_000.0, 8);
        let (volumes, _frequencies) = collected(&mut stream);

        let extra = Arc::new(Mutex::new(Vec::new()));
        let id = {
            let extra = Arc::clone(&extra);
            stream.on_volume(move |v| extra.lock().unwrap().push(v))
        };

        stream.process_frame(&sine_bytes(500.0, 16_000.0, 128));
        assert!(stream.unsubscribe(id));
        assert!(!stream.unsubscribe(id));
        stream.process_frame(&sine_bytes(500.0, 16_000.0, 128));

        assert_eq!(extra.lock().unwrap().len(), 1);
        assert_eq!(volumes.lock().unwrap().len(), 2);
    }
}
