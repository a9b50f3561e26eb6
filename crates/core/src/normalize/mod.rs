//! Turns raw power triples into screen coordinates and a key state.
//!
//! Two variants exist. [`ReplayNormalizer`] scales absolute power by a fixed
//! gain because a replayed file has a known, clean level. [`LiveNormalizer`]
//! divides by the running maximum of each carrier since the capture gain of
//! a live signal path is unknown, and smooths more heavily.

use crate::{
    config::{LiveConfig, ReplayConfig},
    PowerTriple,
};

/// Screen dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenSize {
    pub width: u32,
    pub height: u32,
}

impl ScreenSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn center(&self) -> (i32, i32) {
        ((self.width / 2) as i32, (self.height / 2) as i32)
    }
}

/// Smoothed pointer position and latched key state. This is the memory of the
/// exponential moving average and persists across windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorState {
    pub x: i32,
    pub y: i32,
    pub key_down: bool,
}

impl CursorState {
    /// Pointer at the screen centre, key up.
    pub fn centered(screen: ScreenSize) -> Self {
        let (x, y) = screen.center();
        Self {
            x,
            y,
            key_down: false,
        }
    }
}

/// Decoded state for one window, ready for the action emitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedFrame {
    pub cursor: CursorState,
    /// Whether the pointer should be warped for this window.
    pub move_pointer: bool,
    /// Powers after normalisation (equal to the raw powers for replay).
    pub power: PowerTriple,
}

/// Running per-carrier maxima. Values never decrease.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MaxTracker {
    max: [f64; 3],
}

impl MaxTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn maxima(&self) -> PowerTriple {
        let [x, y, key] = self.max;
        PowerTriple { x, y, key }
    }

    /// Folds `power` into the maxima, then returns `power` divided by them.
    /// A carrier whose maximum is still zero normalises to zero.
    pub fn normalize(&mut self, power: PowerTriple) -> PowerTriple {
        let raw = power.as_array();
        let mut scaled = [0.0; 3];
        for ((peak, value), out) in self.max.iter_mut().zip(raw).zip(scaled.iter_mut()) {
            if value.is_finite() {
                *peak = peak.max(value);
            }
            *out = if *peak > 0.0 { value / *peak } else { 0.0 };
        }

        let [x, y, key] = scaled;
        PowerTriple { x, y, key }
    }
}

/// Maps a normalised power onto `[0, extent - 1]`.
fn to_pixel(power: f64, extent: u32, gain: f64) -> i32 {
    let max = extent.saturating_sub(1) as f64;
    let value = (power * f64::from(extent) * gain).trunc();
    if value.is_nan() {
        0
    } else {
        value.clamp(0.0, max) as i32
    }
}

/// `(target + history * previous) / (history + 1)`, rounded to the nearest pixel.
fn smooth(target: i32, previous: i32, history: u32) -> i32 {
    let history = f64::from(history);
    ((f64::from(target) + history * f64::from(previous)) / (history + 1.0)).round() as i32
}

/// File-replay variant.
#[derive(Debug, Clone)]
pub struct ReplayNormalizer {
    screen: ScreenSize,
    config: ReplayConfig,
    cursor: CursorState,
}

impl ReplayNormalizer {
    pub fn new(screen: ScreenSize, config: ReplayConfig) -> Self {
        Self {
            screen,
            config,
            cursor: CursorState::centered(screen),
        }
    }

    pub fn cursor(&self) -> CursorState {
        self.cursor
    }

    /// Absolute key power above which the key counts as held. The configured
    /// threshold is a fraction of the key carrier's full-scale correlation.
    pub fn key_power_threshold(&self) -> f64 {
        self.config.key_power_threshold()
    }

    pub fn update(&mut self, power: PowerTriple) -> DecodedFrame {
        let gain = self.config.coordinate_gain;
        let x = to_pixel(power.x, self.screen.width, gain);
        let y = to_pixel(power.y, self.screen.height, gain);

        self.cursor = CursorState {
            x: smooth(x, self.cursor.x, self.config.history_weight),
            y: smooth(y, self.cursor.y, self.config.history_weight),
            key_down: power.key > self.key_power_threshold(),
        };

        DecodedFrame {
            cursor: self.cursor,
            move_pointer: true,
            power,
        }
    }
}

/// Live-capture variant with adaptive max normalisation.
#[derive(Debug, Clone)]
pub struct LiveNormalizer {
    screen: ScreenSize,
    config: LiveConfig,
    cursor: CursorState,
    tracker: MaxTracker,
}

impl LiveNormalizer {
    pub fn new(screen: ScreenSize, config: LiveConfig) -> Self {
        Self {
            screen,
            config,
            cursor: CursorState::centered(screen),
            tracker: MaxTracker::new(),
        }
    }

    pub fn cursor(&self) -> CursorState {
        self.cursor
    }

    pub fn tracker(&self) -> &MaxTracker {
        &self.tracker
    }

    pub fn update(&mut self, raw: PowerTriple) -> DecodedFrame {
        let power = self.tracker.normalize(raw);
        let gain = self.config.coordinate_gain;
        let x = to_pixel(power.x, self.screen.width, gain);
        let y = to_pixel(power.y, self.screen.height, gain);

        self.cursor = CursorState {
            x: smooth(x, self.cursor.x, self.config.history_weight),
            y: smooth(y, self.cursor.y, self.config.history_weight),
            key_down: power.key > self.config.key_threshold,
        };

        let motion = self.config.motion_threshold;
        DecodedFrame {
            cursor: self.cursor,
            move_pointer: power.x > motion || power.y > motion,
            power,
        }
    }
}
