use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    basis::{
        DEFAULT_FREQ_KEY, DEFAULT_FREQ_X, DEFAULT_FREQ_Y, DEFAULT_SAMPLE_RATE, FULL_SCALE_POWER,
        REPLAY_FRAME_RATE,
    },
    CarrierBasis, Result,
};

/// X11 keycode of the space bar on a standard PC layout.
pub const DEFAULT_KEY_CODE: u32 = 65;

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub carriers: CarrierConfig,
    pub encode: EncodeConfig,
    pub replay: ReplayConfig,
    pub live: LiveConfig,
    /// Host key code synthesised for the key carrier.
    pub key_code: u32,
}

impl AppConfig {
    /// Reads a JSON configuration file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, or the contents of `path` when one is given.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Rejects configurations that cannot produce a valid carrier basis.
    pub fn validate(&self) -> Result<()> {
        self.encode_basis()?;
        self.replay_basis()?;
        self.carriers.basis(self.live.fallback_refresh_rate)?;
        Ok(())
    }

    pub fn encode_basis(&self) -> Result<CarrierBasis> {
        self.carriers.basis(self.encode.frame_rate)
    }

    pub fn replay_basis(&self) -> Result<CarrierBasis> {
        self.carriers.basis(self.replay.frame_rate)
    }

    /// Basis for live decoding at the host refresh rate, falling back when the
    /// host cannot report one.
    pub fn live_basis(&self, refresh_rate: Option<u32>) -> Result<CarrierBasis> {
        let rate = refresh_rate
            .filter(|rate| *rate > 0)
            .unwrap_or(self.live.fallback_refresh_rate);
        self.carriers.basis(rate)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            carriers: CarrierConfig::default(),
            encode: EncodeConfig::default(),
            replay: ReplayConfig::default(),
            live: LiveConfig::default(),
            key_code: DEFAULT_KEY_CODE,
        }
    }
}

/// Carrier frequencies and sample rate shared by every mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarrierConfig {
    pub freq_x: f64,
    pub freq_y: f64,
    pub freq_key: f64,
    pub sample_rate: u32,
}

impl CarrierConfig {
    pub fn basis(&self, frame_rate: u32) -> Result<CarrierBasis> {
        CarrierBasis::new(
            self.freq_x,
            self.freq_y,
            self.freq_key,
            self.sample_rate,
            frame_rate,
        )
    }
}

impl Default for CarrierConfig {
    fn default() -> Self {
        Self {
            freq_x: DEFAULT_FREQ_X,
            freq_y: DEFAULT_FREQ_Y,
            freq_key: DEFAULT_FREQ_KEY,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeConfig {
    /// Window rate the encoder's time cursor is locked to. Must match the
    /// replay frame rate for replayed windows to stay phase-aligned.
    pub frame_rate: u32,
    /// Pace sample production against the wall clock.
    pub realtime: bool,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            frame_rate: REPLAY_FRAME_RATE,
            realtime: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    pub frame_rate: u32,
    pub coordinate_gain: f64,
    /// Weight of the previous position in the moving average; the new value
    /// always has weight one.
    pub history_weight: u32,
    /// Fraction of the key carrier's full-scale power.
    pub key_threshold_fraction: f64,
}

impl ReplayConfig {
    /// Absolute key power above which the key counts as held.
    pub fn key_power_threshold(&self) -> f64 {
        self.key_threshold_fraction * FULL_SCALE_POWER
    }
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            frame_rate: REPLAY_FRAME_RATE,
            coordinate_gain: 2.0,
            history_weight: 3,
            key_threshold_fraction: 0.30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    pub fallback_refresh_rate: u32,
    pub coordinate_gain: f64,
    pub history_weight: u32,
    /// Threshold on the max-normalised key power.
    pub key_threshold: f64,
    /// Pointer motion is only emitted when x or y normalised power exceeds this.
    pub motion_threshold: f64,
    /// Capture device name; `None` selects the host default.
    pub device: Option<String>,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            fallback_refresh_rate: 60,
            coordinate_gain: 1.0,
            history_weight: 7,
            key_threshold: 0.50,
            motion_threshold: 0.10,
            device: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_reproduce_the_standard_bases() {
        let config = AppConfig::default();
        assert_eq!(config.replay_basis().unwrap(), CarrierBasis::replay());
        assert_eq!(config.encode_basis().unwrap().window_size(), 367);
        assert_eq!(config.live_basis(None).unwrap().frame_rate(), 60);
        assert_eq!(config.live_basis(Some(0)).unwrap().frame_rate(), 60);
        assert_eq!(config.live_basis(Some(144)).unwrap().frame_rate(), 144);
    }

    #[test]
    fn partial_files_fill_in_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "replay": {{ "key_threshold_fraction": 0.4 }}, "key_code": 38 }}"#).unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.replay.key_threshold_fraction, 0.4);
        assert_eq!(config.replay.history_weight, 3);
        assert_eq!(config.key_code, 38);
        assert_eq!(config.live, LiveConfig::default());
    }

    #[test]
    fn rejects_carriers_beyond_nyquist() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "carriers": {{ "sample_rate": 1000 }} }}"#).unwrap();

        let err = AppConfig::load(file.path()).unwrap_err();
        assert!(format!("{err}").contains("invalid configuration"));
    }

    #[test]
    fn missing_path_means_defaults() {
        assert_eq!(AppConfig::load_or_default(None).unwrap(), AppConfig::default());
    }
}
