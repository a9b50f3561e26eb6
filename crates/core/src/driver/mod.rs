//! The mode drivers: blocking loops that wire capture or storage, the
//! analysis pipeline, the pacer and the emitter together.
//!
//! Every loop polls the [`RunFlag`](crate::RunFlag) once per iteration and
//! runs the same cleanup (key release, header back-patch) on every exit path.

mod encode;
mod inspect;
mod listen;
mod replay;

pub use encode::encode;
pub use inspect::{inspect, InspectReport};
pub use listen::listen;
pub use replay::replay;

use serde::{Deserialize, Serialize};

use crate::{pacer::Clock, AppConfig, RunFlag};

/// Operating mode of a driver run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// Capture host input and write an encoded signal file.
    Encode,
    /// Replay a signal file as host input.
    Replay,
    /// Decode a live capture stream as host input.
    Listen,
}

/// Why a driver loop stopped without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    /// The run flag was cleared.
    Cancelled,
    /// The input file ran out of samples.
    EndOfInput,
    /// The requested number of samples was produced.
    LimitReached,
}

/// Counters reported by a driver when it finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub mode: Mode,
    pub exit: ExitReason,
    /// Samples produced (encode) or consumed (replay, listen).
    pub samples: u64,
    /// Complete windows encoded or analysed.
    pub windows: u64,
    /// Pointer warps sent to the host.
    pub warps: u64,
    /// Key presses and releases sent to the host, including cleanup.
    pub key_transitions: u64,
    /// Capture xruns recovered in place.
    pub xruns: u64,
}

impl RunSummary {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            exit: ExitReason::Cancelled,
            samples: 0,
            windows: 0,
            warps: 0,
            key_transitions: 0,
            xruns: 0,
        }
    }
}

/// Shared inputs of every driver.
#[derive(Debug)]
pub struct DriverContext<'a, C: Clock> {
    pub config: &'a AppConfig,
    pub clock: &'a C,
    pub flag: &'a RunFlag,
}

impl<'a, C: Clock> DriverContext<'a, C> {
    pub fn new(config: &'a AppConfig, clock: &'a C, flag: &'a RunFlag) -> Self {
        Self {
            config,
            clock,
            flag,
        }
    }
}

impl<C: Clock> Clone for DriverContext<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: Clock> Copy for DriverContext<'_, C> {}
