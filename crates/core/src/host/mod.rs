//! Boundary to the host display and input subsystem.
//!
//! The encoder reads pointer and keyboard state through [`InputSource`]; the
//! decoders inject events through [`InputSink`]. Both also need the screen
//! geometry from [`ScreenInfo`]. Native backends live in the application
//! crate; [`mock::MockHost`] records everything in memory for tests.

pub mod mock;

use crate::{normalize::ScreenSize, Result};

pub trait ScreenInfo {
    fn screen_size(&self) -> Result<ScreenSize>;

    /// Current monitor refresh rate in Hz, if the host can report one.
    fn refresh_rate(&self) -> Option<u32>;
}

pub trait InputSource {
    /// Absolute pointer position in screen pixels.
    fn pointer_position(&mut self) -> Result<(i32, i32)>;

    /// True when any key on the keyboard is held.
    fn any_key_down(&mut self) -> Result<bool>;
}

pub trait InputSink {
    /// Moves the pointer to absolute screen coordinates.
    fn warp_pointer(&mut self, x: i32, y: i32) -> Result<()>;

    /// Synthesises a press (`true`) or release (`false`) of the configured key.
    fn key_event(&mut self, key_code: u32, pressed: bool) -> Result<()>;

    /// Pushes any buffered requests to the host.
    fn flush(&mut self) -> Result<()>;
}
