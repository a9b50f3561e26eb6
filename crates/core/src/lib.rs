//! Core library for ToneLink.
//!
//! Pointer position and key state are carried over an audio channel as three
//! sine carriers: position as the phase of the x and y carriers, the key as
//! the presence of the third. Each module owns one stage of that pipeline
//! (encoding, windowing, correlation, normalisation, pacing, emission) and the
//! [`driver`] module wires them into the three operating modes. Host input
//! and audio capture sit behind traits so everything here runs headless.

pub mod analysis;
pub mod basis;
pub mod capture;
pub mod config;
pub mod driver;
pub mod emit;
pub mod encode;
pub mod error;
pub mod host;
pub mod normalize;
pub mod pacer;
pub mod record;
pub mod shutdown;
pub mod window;

pub use analysis::{PowerTriple, SignalAnalyzer, SpectrumProbe, SpectrumReport};
pub use basis::CarrierBasis;
pub use capture::{CaptureDevice, CaptureError};
pub use config::{AppConfig, CarrierConfig, EncodeConfig, LiveConfig, ReplayConfig};
pub use driver::{DriverContext, ExitReason, InspectReport, Mode, RunSummary};
pub use emit::ActionEmitter;
pub use encode::{InputState, SignalEncoder};
pub use error::{Result, ToneLinkError};
pub use host::{InputSink, InputSource, ScreenInfo};
pub use normalize::{
    CursorState, DecodedFrame, LiveNormalizer, MaxTracker, ReplayNormalizer, ScreenSize,
};
pub use pacer::{Clock, LivePacer, ManualClock, ReplayPacer, SystemClock};
pub use record::{SignalInfo, SignalReader, SignalWriter};
pub use shutdown::RunFlag;
pub use window::WindowBuffer;
