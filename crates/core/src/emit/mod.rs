use tracing::warn;

use crate::{host::InputSink, DecodedFrame, Result};

/// Turns decoded frames into host input calls.
///
/// The pointer is warped on every frame that asks for it; the key is
/// edge-triggered, so a press or release is only sent when the decoded key
/// state differs from the latched one. A held key is released when the
/// emitter is finished or dropped, and releasing twice sends one key-up.
pub struct ActionEmitter<'a, S: InputSink> {
    sink: &'a mut S,
    key_code: u32,
    key_down: bool,
    warps: u64,
    transitions: u64,
}

impl<'a, S: InputSink> ActionEmitter<'a, S> {
    pub fn new(sink: &'a mut S, key_code: u32) -> Self {
        Self {
            sink,
            key_code,
            key_down: false,
            warps: 0,
            transitions: 0,
        }
    }

    /// Latched key state as last sent to the host.
    pub fn key_down(&self) -> bool {
        self.key_down
    }

    pub fn warps(&self) -> u64 {
        self.warps
    }

    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    pub fn emit(&mut self, frame: &DecodedFrame) -> Result<()> {
        let mut issued = false;

        if frame.move_pointer {
            self.sink.warp_pointer(frame.cursor.x, frame.cursor.y)?;
            self.warps += 1;
            issued = true;
        }

        if frame.cursor.key_down != self.key_down {
            self.sink.key_event(self.key_code, frame.cursor.key_down)?;
            self.key_down = frame.cursor.key_down;
            self.transitions += 1;
            issued = true;
        }

        if issued {
            self.sink.flush()?;
        }
        Ok(())
    }

    /// Releases a held key. Safe to call any number of times.
    pub fn release(&mut self) -> Result<()> {
        if !self.key_down {
            return Ok(());
        }

        self.sink.key_event(self.key_code, false)?;
        self.key_down = false;
        self.transitions += 1;
        self.sink.flush()
    }
}

impl<S: InputSink> Drop for ActionEmitter<'_, S> {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            warn!(%err, "failed to release key during cleanup");
        }
    }
}
