use std::time::Duration;

use crate::{Result, ToneLinkError};

pub const DEFAULT_FREQ_X: f64 = 440.0;
pub const DEFAULT_FREQ_Y: f64 = 660.0;
pub const DEFAULT_FREQ_KEY: f64 = 880.0;
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;
/// Frame rate used for file replay and encoding.
pub const REPLAY_FRAME_RATE: u32 = 120;

/// Amplitude of each carrier in the encoded signal. Three carriers at this
/// weight can never sum past unit amplitude.
pub const CARRIER_WEIGHT: f64 = 1.0 / 3.0;

/// Correlation magnitude of a full-strength, in-phase carrier against its own
/// sine reference over a window.
pub const FULL_SCALE_POWER: f64 = CARRIER_WEIGHT / 2.0;

/// The three carrier frequencies, the sample rate and the frame rate that
/// together fix the window length. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarrierBasis {
    freq_x: f64,
    freq_y: f64,
    freq_key: f64,
    sample_rate: u32,
    frame_rate: u32,
}

impl CarrierBasis {
    /// Builds a basis, rejecting carriers at or above Nyquist and frame rates
    /// that leave fewer than two samples per window.
    pub fn new(
        freq_x: f64,
        freq_y: f64,
        freq_key: f64,
        sample_rate: u32,
        frame_rate: u32,
    ) -> Result<Self> {
        if sample_rate == 0 {
            return Err(ToneLinkError::Config("sample rate must be positive".into()));
        }
        if frame_rate == 0 {
            return Err(ToneLinkError::Config("frame rate must be positive".into()));
        }
        if sample_rate / frame_rate < 2 {
            return Err(ToneLinkError::Config(format!(
                "frame rate {frame_rate} Hz leaves fewer than two samples per window at {sample_rate} Hz"
            )));
        }

        let nyquist = f64::from(sample_rate) / 2.0;
        for (name, freq) in [("x", freq_x), ("y", freq_y), ("key", freq_key)] {
            if !(freq > 0.0 && freq < nyquist) {
                return Err(ToneLinkError::Config(format!(
                    "{name} carrier {freq} Hz must lie in (0, {nyquist}) Hz"
                )));
            }
        }

        Ok(Self {
            freq_x,
            freq_y,
            freq_key,
            sample_rate,
            frame_rate,
        })
    }

    /// Default carriers at the replay frame rate.
    pub fn replay() -> Self {
        Self::standard(REPLAY_FRAME_RATE)
    }

    /// Default carriers at an arbitrary frame rate, typically the display
    /// refresh rate for live decoding. Rates too high for the default sample
    /// rate are clamped so the window keeps at least two samples.
    pub fn standard(frame_rate: u32) -> Self {
        let frame_rate = frame_rate.clamp(1, DEFAULT_SAMPLE_RATE / 2);
        Self {
            freq_x: DEFAULT_FREQ_X,
            freq_y: DEFAULT_FREQ_Y,
            freq_key: DEFAULT_FREQ_KEY,
            sample_rate: DEFAULT_SAMPLE_RATE,
            frame_rate,
        }
    }

    /// Same carriers and sample rate, different frame rate.
    pub fn with_frame_rate(&self, frame_rate: u32) -> Result<Self> {
        Self::new(
            self.freq_x,
            self.freq_y,
            self.freq_key,
            self.sample_rate,
            frame_rate,
        )
    }

    pub fn freq_x(&self) -> f64 {
        self.freq_x
    }

    pub fn freq_y(&self) -> f64 {
        self.freq_y
    }

    pub fn freq_key(&self) -> f64 {
        self.freq_key
    }

    /// Carrier frequencies in `[x, y, key]` order.
    pub fn frequencies(&self) -> [f64; 3] {
        [self.freq_x, self.freq_y, self.freq_key]
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frame_rate(&self) -> u32 {
        self.frame_rate
    }

    /// Samples per analysis window: `sample_rate / frame_rate`.
    pub fn window_size(&self) -> usize {
        (self.sample_rate / self.frame_rate) as usize
    }

    /// Wall-clock time allotted to one window.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.frame_rate))
    }

    /// Time offset of sample `index` within a window, in seconds.
    pub fn sample_time(&self, index: usize) -> f64 {
        index as f64 / f64::from(self.sample_rate)
    }
}

impl Default for CarrierBasis {
    fn default() -> Self {
        Self::replay()
    }
}
