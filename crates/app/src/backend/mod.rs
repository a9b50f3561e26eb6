//! Native host and capture backends, selected by cargo features.
//!
//! A build without a backend still links: the stand-in types are uninhabited
//! and the `open_*` functions fail at setup.

#[cfg(feature = "cpal")]
mod capture;
#[cfg(all(feature = "x11", target_os = "linux"))]
mod display;

#[cfg(not(all(feature = "x11", target_os = "linux")))]
use tonelink_core::{
    host::{InputSink, InputSource, ScreenInfo},
    ScreenSize,
};
#[cfg(not(feature = "cpal"))]
use tonelink_core::{CaptureDevice, CaptureError};
#[cfg(any(
    not(feature = "cpal"),
    not(all(feature = "x11", target_os = "linux"))
))]
use tonelink_core::ToneLinkError;
use tonelink_core::{AppConfig, Result};

#[cfg(all(feature = "x11", target_os = "linux"))]
pub fn open_host() -> Result<display::X11Host> {
    display::X11Host::open()
}

#[cfg(not(all(feature = "x11", target_os = "linux")))]
pub fn open_host() -> Result<NoHost> {
    Err(ToneLinkError::setup(
        "built without a display backend; rebuild with `--features x11` on Linux",
    ))
}

#[cfg(feature = "cpal")]
pub fn open_capture(config: &AppConfig) -> Result<capture::CpalCapture> {
    capture::CpalCapture::open(config.live.device.as_deref(), config.carriers.sample_rate)
}

#[cfg(not(feature = "cpal"))]
pub fn open_capture(config: &AppConfig) -> Result<NoCapture> {
    let _ = config;
    Err(ToneLinkError::setup(
        "built without an audio backend; rebuild with `--features cpal`",
    ))
}

#[cfg(not(all(feature = "x11", target_os = "linux")))]
#[derive(Debug)]
pub enum NoHost {}

#[cfg(not(all(feature = "x11", target_os = "linux")))]
impl ScreenInfo for NoHost {
    fn screen_size(&self) -> Result<ScreenSize> {
        match *self {}
    }

    fn refresh_rate(&self) -> Option<u32> {
        match *self {}
    }
}

#[cfg(not(all(feature = "x11", target_os = "linux")))]
impl InputSource for NoHost {
    fn pointer_position(&mut self) -> Result<(i32, i32)> {
        match *self {}
    }

    fn any_key_down(&mut self) -> Result<bool> {
        match *self {}
    }
}

#[cfg(not(all(feature = "x11", target_os = "linux")))]
impl InputSink for NoHost {
    fn warp_pointer(&mut self, _x: i32, _y: i32) -> Result<()> {
        match *self {}
    }

    fn key_event(&mut self, _key_code: u32, _pressed: bool) -> Result<()> {
        match *self {}
    }

    fn flush(&mut self) -> Result<()> {
        match *self {}
    }
}

#[cfg(not(feature = "cpal"))]
#[derive(Debug)]
pub enum NoCapture {}

#[cfg(not(feature = "cpal"))]
impl CaptureDevice for NoCapture {
    fn read(&mut self, _buf: &mut [i16]) -> std::result::Result<usize, CaptureError> {
        match *self {}
    }

    fn recover(&mut self) -> std::result::Result<(), CaptureError> {
        match *self {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(all(feature = "x11", target_os = "linux")))]
    #[test]
    fn missing_display_backend_is_a_setup_error() {
        assert!(matches!(open_host(), Err(ToneLinkError::Setup(_))));
    }

    #[cfg(not(feature = "cpal"))]
    #[test]
    fn missing_audio_backend_is_a_setup_error() {
        let config = AppConfig::default();
        assert!(matches!(open_capture(&config), Err(ToneLinkError::Setup(_))));
    }
}
