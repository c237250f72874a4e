use rustfft::{num_complex::Complex, FftPlanner};

use super::InputError;

/// One frame's frequency-domain view: parallel per-bin frequency and magnitude
/// vectors covering the non-negative frequencies (DC through Nyquist).
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    pub frequencies: Vec<f32>,
    pub magnitudes: Vec<f32>,
}

/// Forward FFT over one sample frame.
///
/// Accepts any non-zero frame length; rustfft handles non-power-of-two sizes,
/// and the planner caches plans so a fixed capture buffer size costs one plan
/// for the process lifetime. Bin `i` sits at `i * sample_rate / len` Hz and its
/// magnitude is the modulus of the complex coefficient. Only the first
/// `len / 2 + 1` bins are returned; the mirror half carries no additional
/// information for a real-valued signal.
pub struct SpectralAnalyzer {
    sample_rate: f32,
    planner: FftPlanner<f32>,
}

impl SpectralAnalyzer {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            planner: FftPlanner::new(),
        }
    }

    pub fn analyze(&mut self, samples: &[i16]) -> Result<Spectrum, InputError> {
        if samples.is_empty() {
            return Err(InputError::EmptyFrame);
        }

        let len = samples.len();
        let fft = self.planner.plan_fft_forward(len);

        let mut buffer: Vec<Complex<f32>> = samples
            .iter()
            .map(|&s| Complex::new(s as f32, 0.0))
            .collect();
        fft.process(&mut buffer);

        let bin_width = self.sample_rate / len as f32;
        let kept = (len / 2 + 1).min(len);

        let frequencies = (0..kept).map(|i| i as f32 * bin_width).collect();
        let magnitudes = buffer[..kept].iter().map(|c| c.norm()).collect();

        Ok(Spectrum {
            frequencies,
            magnitudes,
        })
    }
}
