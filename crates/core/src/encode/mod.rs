use std::f64::consts::PI;

use crate::{basis::CARRIER_WEIGHT, CarrierBasis};

/// Input state sampled from the host for one output sample.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputState {
    /// Pointer x as a fraction of screen width, in `[0, 1]`.
    pub x_mod: f64,
    /// Pointer y as a fraction of screen height, in `[0, 1]`.
    pub y_mod: f64,
    pub key_down: bool,
}

impl InputState {
    pub fn new(x_mod: f64, y_mod: f64, key_down: bool) -> Self {
        Self {
            x_mod: x_mod.clamp(0.0, 1.0),
            y_mod: y_mod.clamp(0.0, 1.0),
            key_down,
        }
    }

    /// Normalises an absolute pointer position against the screen extent.
    pub fn from_pointer(x: i32, y: i32, width: u32, height: u32, key_down: bool) -> Self {
        Self::new(
            f64::from(x) / f64::from(width.max(1)),
            f64::from(y) / f64::from(height.max(1)),
            key_down,
        )
    }
}

/// Synthesises the three-carrier signal one sample at a time.
///
/// Position is carried as a phase offset of `mod * pi` on the x and y
/// carriers; the key carrier is simply gated. The time cursor restarts at
/// every window boundary so each window is encoded against the same
/// `i / sample_rate` reference the analyzer correlates with.
#[derive(Debug, Clone)]
pub struct SignalEncoder {
    basis: CarrierBasis,
    window_size: usize,
    position: usize,
    produced: u64,
}

impl SignalEncoder {
    pub fn new(basis: &CarrierBasis) -> Self {
        Self {
            basis: *basis,
            window_size: basis.window_size(),
            position: 0,
            produced: 0,
        }
    }

    /// Current value of the time cursor in seconds.
    pub fn time(&self) -> f64 {
        self.basis.sample_time(self.position)
    }

    /// Samples produced so far.
    pub fn produced(&self) -> u64 {
        self.produced
    }

    /// True when the next sample starts a new window.
    pub fn at_window_start(&self) -> bool {
        self.position == 0
    }

    /// Signal value in `[-1, 1]` for `state` at the current cursor, then
    /// advances the cursor.
    pub fn next_value(&mut self, state: &InputState) -> f64 {
        let t = self.time();
        let phase = |freq: f64| 2.0 * PI * freq * t;

        let x = (phase(self.basis.freq_x()) + state.x_mod * PI).sin();
        let y = (phase(self.basis.freq_y()) + state.y_mod * PI).sin();
        let key = if state.key_down {
            phase(self.basis.freq_key()).sin()
        } else {
            0.0
        };

        self.position = (self.position + 1) % self.window_size;
        self.produced += 1;

        CARRIER_WEIGHT * x + CARRIER_WEIGHT * y + CARRIER_WEIGHT * key
    }

    /// Next sample quantised to signed 16-bit PCM.
    pub fn next_sample(&mut self, state: &InputState) -> i16 {
        quantize(self.next_value(state))
    }
}

/// `round(value * 32767)`, clamped to the `i16` range.
pub fn quantize(value: f64) -> i16 {
    (value * 32767.0)
        .round()
        .clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantize_rounds_and_clamps() {
        assert_eq!(quantize(0.0), 0);
        assert_eq!(quantize(1.0), 32767);
        assert_eq!(quantize(-1.0), -32767);
        assert_eq!(quantize(2.0), i16::MAX);
        assert_eq!(quantize(-2.0), i16::MIN);
        assert_eq!(quantize(0.5 / 32767.0), 1);
    }

    #[test]
    fn amplitude_never_exceeds_unity() {
        let basis = CarrierBasis::default();
        let mut encoder = SignalEncoder::new(&basis);
        let state = InputState::new(0.0, 0.0, true);
        for _ in 0..basis.sample_rate() {
            assert!(encoder.next_value(&state).abs() <= 1.0 + 1e-12);
        }
    }

    #[test]
    fn first_sample_of_each_window_matches_phase_offsets() {
        let basis = CarrierBasis::default();
        let mut encoder = SignalEncoder::new(&basis);
        let state = InputState::new(0.5, 0.0, true);

        // At t = 0 only the x carrier's pi/2 offset contributes.
        assert!((encoder.next_value(&state) - CARRIER_WEIGHT).abs() < 1e-12);
        for _ in 1..basis.window_size() {
            encoder.next_value(&state);
        }
        assert!(encoder.at_window_start());
        assert!((encoder.next_value(&state) - CARRIER_WEIGHT).abs() < 1e-12);
        assert_eq!(encoder.produced(), basis.window_size() as u64 + 1);
    }

    #[test]
    fn time_cursor_advances_by_one_sample_period() {
        let basis = CarrierBasis::default();
        let mut encoder = SignalEncoder::new(&basis);
        encoder.next_sample(&InputState::default());
        encoder.next_sample(&InputState::default());
        assert!((encoder.time() - 2.0 / 44_100.0).abs() < 1e-15);
    }

    #[test]
    fn pointer_state_is_normalised_and_clamped() {
        let state = InputState::from_pointer(960, 1200, 1920, 1080, false);
        assert_eq!(state.x_mod, 0.5);
        assert_eq!(state.y_mod, 1.0);
    }
}
