/// Outcome of pushing one sample into a [`WindowBuffer`].
#[derive(Debug, PartialEq)]
pub enum WindowPush<'a> {
    /// The window is not full yet.
    Accumulating,
    /// The window just filled. The slice stays valid until the next push,
    /// which starts overwriting it.
    Ready(&'a [f32]),
}

/// Fixed-capacity sample accumulator. The backing storage is allocated once
/// and overwritten window after window.
#[derive(Debug, Clone)]
pub struct WindowBuffer {
    samples: Vec<f32>,
    filled: usize,
}

impl WindowBuffer {
    pub fn new(window_size: usize) -> Self {
        Self {
            samples: vec![0.0; window_size.max(1)],
            filled: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    /// Number of samples accumulated towards the current window.
    pub fn len(&self) -> usize {
        self.filled
    }

    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    pub fn push(&mut self, sample: f32) -> WindowPush<'_> {
        self.samples[self.filled] = sample;
        self.filled += 1;

        if self.filled == self.samples.len() {
            self.filled = 0;
            WindowPush::Ready(&self.samples)
        } else {
            WindowPush::Accumulating
        }
    }

    /// Converts a signed 16-bit sample and pushes it.
    pub fn push_pcm(&mut self, sample: i16) -> WindowPush<'_> {
        self.push(pcm_to_unit(sample))
    }

    /// Drops any partially accumulated window.
    pub fn clear(&mut self) {
        self.filled = 0;
    }
}

/// Maps a signed 16-bit sample onto `[-1.0, 1.0]`.
pub fn pcm_to_unit(sample: i16) -> f32 {
    (f32::from(sample) / 32767.0).max(-1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hands_out_a_full_window_then_starts_over() {
        let mut buffer = WindowBuffer::new(3);
        assert_eq!(buffer.push(0.1), WindowPush::Accumulating);
        assert_eq!(buffer.push(0.2), WindowPush::Accumulating);
        assert_eq!(buffer.push(0.3), WindowPush::Ready(&[0.1, 0.2, 0.3]));
        assert!(buffer.is_empty());

        assert_eq!(buffer.push(0.4), WindowPush::Accumulating);
        assert_eq!(buffer.len(), 1);
        buffer.push(0.5);
        match buffer.push(0.6) {
            WindowPush::Ready(window) => assert_eq!(window, &[0.4, 0.5, 0.6]),
            WindowPush::Accumulating => panic!("window should be full"),
        }
    }

    #[test]
    fn clear_discards_partial_window() {
        let mut buffer = WindowBuffer::new(4);
        buffer.push(1.0);
        buffer.push(1.0);
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), 4);
    }

    #[test]
    fn pcm_conversion_stays_in_unit_range() {
        assert_eq!(pcm_to_unit(32767), 1.0);
        assert_eq!(pcm_to_unit(i16::MIN), -1.0);
        assert_eq!(pcm_to_unit(0), 0.0);
    }
}
