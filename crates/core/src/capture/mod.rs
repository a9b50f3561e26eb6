//! Boundary to the audio capture device used by live decoding.

pub mod mock;

/// Errors surfaced by a capture device. Only [`CaptureError::Xrun`] is
/// recoverable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    /// The device buffer under- or overflowed; re-prime and keep reading.
    #[error("capture buffer xrun")]
    Xrun,
    #[error("{0}")]
    Device(String),
}

/// Blocking source of mono signed 16-bit PCM at the basis sample rate.
pub trait CaptureDevice {
    /// Fills up to `buf.len()` samples and returns how many were written.
    /// Returning zero is allowed, for instance when a read times out.
    fn read(&mut self, buf: &mut [i16]) -> Result<usize, CaptureError>;

    /// Re-primes the device after an xrun, discarding buffered audio.
    fn recover(&mut self) -> Result<(), CaptureError>;
}
