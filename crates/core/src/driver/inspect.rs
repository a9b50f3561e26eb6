use std::io::Read;

use serde::Serialize;
use tracing::info;

use crate::{
    analysis::{SpectrumProbe, SpectrumReport},
    window::{pcm_to_unit, WindowBuffer, WindowPush},
    AppConfig, PowerTriple, Result, SignalAnalyzer, SignalInfo, SignalReader,
};

/// Offline summary of a signal file, decoded with the replay basis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InspectReport {
    pub info: SignalInfo,
    /// Samples actually read, which may be fewer than the header declares.
    pub samples: u64,
    pub duration_secs: f64,
    pub windows: u64,
    pub mean_power: PowerTriple,
    /// Share of windows whose key power exceeds the replay key threshold.
    pub key_active_fraction: f64,
    pub spectrum: SpectrumReport,
}

/// Reads a whole signal file without touching the host and reports carrier
/// powers and spectral content.
pub fn inspect<R: Read>(mut reader: SignalReader<R>, config: &AppConfig) -> Result<InspectReport> {
    let basis = config.replay_basis()?;
    reader.check_sample_rate(basis.sample_rate());
    let key_threshold = config.replay.key_power_threshold();

    let analyzer = SignalAnalyzer::new(&basis);
    let mut window = WindowBuffer::new(basis.window_size());
    let mut probe = SpectrumProbe::for_basis(&basis);
    let mut block = Vec::with_capacity(probe.block_size());

    let mut samples = 0u64;
    let mut windows = 0u64;
    let mut key_windows = 0u64;
    let mut totals = [0.0f64; 3];

    while let Some(sample) = reader.next_sample()? {
        samples += 1;

        block.push(pcm_to_unit(sample));
        if block.len() == probe.block_size() {
            probe.push_block(&block)?;
            block.clear();
        }

        if let WindowPush::Ready(frame) = window.push_pcm(sample) {
            let power = analyzer.analyze(frame);
            for (total, value) in totals.iter_mut().zip(power.as_array()) {
                *total += value;
            }
            if power.key > key_threshold {
                key_windows += 1;
            }
            windows += 1;
        }
    }
    if !block.is_empty() {
        probe.push_block(&block)?;
    }

    let mean_power = if windows > 0 {
        let [x, y, key] = totals.map(|total| total / windows as f64);
        PowerTriple::new(x, y, key)
    } else {
        PowerTriple::default()
    };
    let key_active_fraction = if windows > 0 {
        key_windows as f64 / windows as f64
    } else {
        0.0
    };

    let report = InspectReport {
        info: reader.info(),
        samples,
        duration_secs: samples as f64 / f64::from(reader.info().sample_rate.max(1)),
        windows,
        mean_power,
        key_active_fraction,
        spectrum: probe.report(&basis),
    };
    info!(
        samples,
        windows,
        key_active_fraction,
        dominant_hz = report.spectrum.dominant_hz,
        "inspection finished"
    );
    Ok(report)
}
