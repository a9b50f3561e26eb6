use std::{f64::consts::PI, fmt};

use serde::{Deserialize, Serialize};

use crate::CarrierBasis;

pub mod spectrum;

pub use spectrum::{SpectrumProbe, SpectrumReport};

/// Correlation strength of one window against each carrier's sine reference.
/// All three values are non-negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PowerTriple {
    pub x: f64,
    pub y: f64,
    pub key: f64,
}

impl PowerTriple {
    pub fn new(x: f64, y: f64, key: f64) -> Self {
        Self { x, y, key }
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.x, self.y, self.key]
    }
}

/// Single-bin correlator for the three carriers.
///
/// For each carrier `f` the analyzer computes
/// `|sum(window[i] * sin(2*pi*f * i / sample_rate))| / N`, ignoring phase.
/// The time index is relative to the start of the window, the same convention
/// the encoder uses, so the reference tables are built once per basis and
/// reused for every window.
pub struct SignalAnalyzer {
    basis: CarrierBasis,
    references: [Vec<f64>; 3],
}

impl SignalAnalyzer {
    pub fn new(basis: &CarrierBasis) -> Self {
        let len = basis.window_size();
        let references: [Vec<f64>; 3] = basis.frequencies().map(|freq| {
            (0..len)
                .map(|i| (2.0 * PI * freq * basis.sample_time(i)).sin())
                .collect()
        });

        Self {
            basis: *basis,
            references,
        }
    }

    pub fn basis(&self) -> &CarrierBasis {
        &self.basis
    }

    /// Computes the power triple for one window. Windows shorter than the
    /// basis window are correlated over their own length; longer windows are
    /// truncated to the basis window.
    pub fn analyze(&self, window: &[f32]) -> PowerTriple {
        let [x, y, key] = &self.references;
        PowerTriple {
            x: correlate(window, x),
            y: correlate(window, y),
            key: correlate(window, key),
        }
    }
}

impl fmt::Debug for SignalAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalAnalyzer")
            .field("basis", &self.basis)
            .field("window_size", &self.references[0].len())
            .finish()
    }
}

/// Normalised correlation magnitude of `window` against `reference`.
pub fn correlate(window: &[f32], reference: &[f64]) -> f64 {
    let len = window.len().min(reference.len());
    if len == 0 {
        return 0.0;
    }

    let sum: f64 = window
        .iter()
        .zip(reference)
        .map(|(sample, reference)| f64::from(*sample) * reference)
        .sum();

    sum.abs() / len as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::FULL_SCALE_POWER;

    /// Basis whose carriers complete a whole number of cycles per window.
    fn aligned_basis() -> CarrierBasis {
        CarrierBasis::new(400.0, 600.0, 800.0, 48_000, 100).unwrap()
    }

    fn tone(basis: &CarrierBasis, freq: f64, phase: f64, amplitude: f64) -> Vec<f32> {
        (0..basis.window_size())
            .map(|i| (amplitude * (2.0 * PI * freq * basis.sample_time(i) + phase).sin()) as f32)
            .collect()
    }

    #[test]
    fn silence_has_no_power() {
        let basis = CarrierBasis::default();
        let analyzer = SignalAnalyzer::new(&basis);
        let power = analyzer.analyze(&vec![0.0; basis.window_size()]);
        assert_eq!(power, PowerTriple::default());
    }

    #[test]
    fn isolates_each_carrier() {
        let basis = aligned_basis();
        let analyzer = SignalAnalyzer::new(&basis);

        let power = analyzer.analyze(&tone(&basis, 600.0, 0.0, 1.0 / 3.0));
        assert!((power.y - FULL_SCALE_POWER).abs() < 1e-6);
        assert!(power.x < 1e-6);
        assert!(power.key < 1e-6);
    }

    #[test]
    fn phase_offset_scales_magnitude_by_cosine() {
        let basis = aligned_basis();
        let analyzer = SignalAnalyzer::new(&basis);

        for phase in [0.0, PI / 4.0, PI / 2.0, 3.0 * PI / 4.0, PI] {
            let power = analyzer.analyze(&tone(&basis, 400.0, phase, 1.0 / 3.0));
            let expected = FULL_SCALE_POWER * phase.cos().abs();
            assert!(
                (power.x - expected).abs() < 1e-6,
                "phase {phase}: got {}, expected {expected}",
                power.x
            );
        }
    }

    #[test]
    fn short_windows_do_not_panic() {
        let analyzer = SignalAnalyzer::new(&CarrierBasis::default());
        assert_eq!(analyzer.analyze(&[]), PowerTriple::default());
        let power = analyzer.analyze(&[0.5; 10]);
        assert!(power.x.is_finite());
    }
}
