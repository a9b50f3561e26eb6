//! Offline spectral diagnostics for recorded signals.
//!
//! The decoders never look at a full spectrum; this probe exists so a signal
//! file can be checked for carrier content without a display attached.

use std::{f32::consts::PI, fmt, sync::Arc};

use realfft::{num_complex::Complex32, RealFftPlanner, RealToComplex};
use serde::{Deserialize, Serialize};

use crate::{CarrierBasis, Result, ToneLinkError};

/// Averaged magnitude spectrum summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpectrumReport {
    pub blocks: usize,
    /// Frequency of the strongest non-DC bin.
    pub dominant_hz: f32,
    /// Mean magnitude at the bins nearest the x, y and key carriers.
    pub carrier_magnitudes: [f32; 3],
}

/// Hann-windowed real FFT accumulating an average magnitude spectrum over
/// fixed-size blocks.
pub struct SpectrumProbe {
    sample_rate: u32,
    plan: Arc<dyn RealToComplex<f32>>,
    input: Vec<f32>,
    spectrum: Vec<Complex32>,
    scratch: Vec<Complex32>,
    accumulated: Vec<f32>,
    blocks: usize,
}

impl SpectrumProbe {
    pub fn new(sample_rate: u32, block_size: usize) -> Self {
        let mut planner = RealFftPlanner::<f32>::new();
        let plan = planner.plan_fft_forward(block_size.max(2));
        let input = plan.make_input_vec();
        let spectrum = plan.make_output_vec();
        let scratch = plan.make_scratch_vec();
        let accumulated = vec![0.0; spectrum.len()];

        Self {
            sample_rate,
            plan,
            input,
            spectrum,
            scratch,
            accumulated,
            blocks: 0,
        }
    }

    /// Probe with 100 ms blocks, giving 10 Hz bins.
    pub fn for_basis(basis: &CarrierBasis) -> Self {
        Self::new(basis.sample_rate(), (basis.sample_rate() / 10) as usize)
    }

    pub fn block_size(&self) -> usize {
        self.input.len()
    }

    /// Adds one block to the running average. Short blocks are zero-padded.
    pub fn push_block(&mut self, samples: &[f32]) -> Result<()> {
        let len = self.input.len();
        for (index, slot) in self.input.iter_mut().enumerate() {
            let sample = samples.get(index).copied().unwrap_or(0.0);
            *slot = sample * hann_value(index, len);
        }

        self.plan
            .process_with_scratch(&mut self.input, &mut self.spectrum, &mut self.scratch)
            .map_err(|err| ToneLinkError::msg(format!("fft failed: {err}")))?;

        for (total, bin) in self.accumulated.iter_mut().zip(&self.spectrum) {
            *total += bin.norm();
        }
        self.blocks += 1;
        Ok(())
    }

    pub fn report(&self, basis: &CarrierBasis) -> SpectrumReport {
        if self.blocks == 0 {
            return SpectrumReport::default();
        }

        let scale = 1.0 / self.blocks as f32;
        let bin_hz = self.sample_rate as f32 / self.input.len() as f32;

        let dominant_bin = self
            .accumulated
            .iter()
            .enumerate()
            .skip(1)
            .fold((0, 0.0_f32), |best, (index, magnitude)| {
                if *magnitude > best.1 {
                    (index, *magnitude)
                } else {
                    best
                }
            })
            .0;

        let carrier_magnitudes = basis.frequencies().map(|freq| {
            let bin = ((freq as f32 / bin_hz).round() as usize).min(self.accumulated.len() - 1);
            self.accumulated[bin] * scale
        });

        SpectrumReport {
            blocks: self.blocks,
            dominant_hz: dominant_bin as f32 * bin_hz,
            carrier_magnitudes,
        }
    }
}

impl fmt::Debug for SpectrumProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpectrumProbe")
            .field("sample_rate", &self.sample_rate)
            .field("block_size", &self.input.len())
            .field("blocks", &self.blocks)
            .finish()
    }
}

fn hann_value(index: usize, len: usize) -> f32 {
    if len <= 1 {
        return 1.0;
    }

    0.5 - 0.5 * ((2.0 * PI * index as f32) / (len as f32 - 1.0)).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f32 / sample_rate as f32).sin() * 0.3)
            .collect()
    }

    #[test]
    fn finds_the_dominant_carrier() {
        let basis = CarrierBasis::default();
        let mut probe = SpectrumProbe::for_basis(&basis);
        let block = sine(660.0, basis.sample_rate(), probe.block_size());
        probe.push_block(&block).unwrap();
        probe.push_block(&block).unwrap();

        let report = probe.report(&basis);
        assert_eq!(report.blocks, 2);
        assert!((report.dominant_hz - 660.0).abs() < 1.0);
        assert!(report.carrier_magnitudes[1] > 10.0 * report.carrier_magnitudes[0]);
        assert!(report.carrier_magnitudes[1] > 10.0 * report.carrier_magnitudes[2]);
    }

    #[test]
    fn empty_probe_reports_defaults() {
        let basis = CarrierBasis::default();
        let probe = SpectrumProbe::for_basis(&basis);
        assert_eq!(probe.report(&basis), SpectrumReport::default());
    }

    #[test]
    fn zero_pads_short_blocks() {
        let basis = CarrierBasis::default();
        let mut probe = SpectrumProbe::for_basis(&basis);
        probe.push_block(&[0.25; 16]).unwrap();
        assert_eq!(probe.report(&basis).blocks, 1);
    }
}
