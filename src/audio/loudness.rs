use std::collections::VecDeque;

/// Per-frame loudness with temporal smoothing.
///
/// Instantaneous loudness is the mean absolute sample amplitude. Each frame's
/// value is pushed into a bounded FIFO history and the returned loudness is the
/// arithmetic mean of the current history contents. A smaller window makes the
/// output more reactive at the cost of jitter.
pub struct LoudnessMeter {
    history: VecDeque<f32>,
    window: usize,
}

impl LoudnessMeter {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            history: VecDeque::with_capacity(window),
            window,
        }
    }

    /// Measures one frame and returns the smoothed average.
    ///
    /// The history always holds at least the frame just pushed, so the average
    /// is well defined from the very first frame.
    pub fn update(&mut self, samples: &[i16]) -> f32 {
        let instant = Self::mean_abs(samples);

        self.history.push_back(instant);
        if self.history.len() > self.window {
            self.history.pop_front();
        }

        self.history.iter().sum::<f32>() / self.history.len() as f32
    }

    fn mean_abs(samples: &[i16]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }
        samples.iter().map(|&s| (s as f32).abs()).sum::<f32>() / samples.len() as f32
    }

    #[allow(dead_code)]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_frames_average_to_zero() {
        let mut meter = LoudnessMeter::new(8);
        for _ in 0..8 {
            assert_eq!(meter.update(&[0i16; 16]), 0.0);
        }
        assert_eq!(meter.history_len(), 8);
    }

    #[test]
    fn first_frame_is_a_one_element_average() {
        let mut meter = LoudnessMeter::new(8);
        let average = meter.update(&[100, -100, 100, -100]);
        assert_eq!(average, 100.0);
        assert_eq!(meter.history_len(), 1);
    }

    #[test]
    fn history_evicts_oldest_beyond_window() {
        let mut meter = LoudnessMeter::new(3);

        // Constant frames with mean-abs 10, 20, 30, 40 in turn.
        let mut average = 0.0;
        for level in [10i16, 20, 30, 40] {
            average = meter.update(&[level; 4]);
        }

        assert_eq!(meter.history_len(), 3);
        // Oldest (10) evicted: (20 + 30 + 40) / 3.
        assert_eq!(average, 30.0);
    }

    #[test]
    fn window_is_never_exceeded() {
        let mut meter = LoudnessMeter::new(4);
        for _ in 0..32 {
            meter.update(&[1i16; 2]);
            assert!(meter.history_len() <= 4);
        }
    }

    #[test]
    fn negative_samples_count_toward_loudness() {
        let mut meter = LoudnessMeter::new(1);
        assert_eq!(meter.update(&[-200i16; 8]), 200.0);
    }
}
