//! Scripted capture device for tests.

use std::collections::VecDeque;

use super::{CaptureDevice, CaptureError};
use crate::RunFlag;

/// One scripted response to [`CaptureDevice::read`].
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptedRead {
    Samples(Vec<i16>),
    Error(CaptureError),
}

/// Replays a fixed sequence of reads. Once the script is exhausted the device
/// stops the attached [`RunFlag`] (if any) and returns empty reads, so a live
/// driver winds down on its next iteration.
#[derive(Debug, Default)]
pub struct ScriptedCapture {
    script: VecDeque<ScriptedRead>,
    stop_when_done: Option<RunFlag>,
    pub recoveries: usize,
    pub reads: usize,
}

impl ScriptedCapture {
    pub fn new(script: impl IntoIterator<Item = ScriptedRead>) -> Self {
        Self {
            script: script.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Splits `samples` into reads of `chunk` samples each.
    pub fn from_samples(samples: &[i16], chunk: usize) -> Self {
        Self::new(
            samples
                .chunks(chunk.max(1))
                .map(|chunk| ScriptedRead::Samples(chunk.to_vec())),
        )
    }

    pub fn stop_when_done(mut self, flag: &RunFlag) -> Self {
        self.stop_when_done = Some(flag.clone());
        self
    }
}

impl CaptureDevice for ScriptedCapture {
    fn read(&mut self, buf: &mut [i16]) -> Result<usize, CaptureError> {
        self.reads += 1;
        match self.script.pop_front() {
            Some(ScriptedRead::Samples(samples)) => {
                let len = samples.len().min(buf.len());
                buf[..len].copy_from_slice(&samples[..len]);
                Ok(len)
            }
            Some(ScriptedRead::Error(err)) => Err(err),
            None => {
                if let Some(flag) = &self.stop_when_done {
                    flag.stop();
                }
                Ok(0)
            }
        }
    }

    fn recover(&mut self) -> Result<(), CaptureError> {
        self.recoveries += 1;
        Ok(())
    }
}
