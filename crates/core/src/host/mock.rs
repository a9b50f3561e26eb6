//! In-memory host used by unit and integration tests.
//!
//! Every injected event is appended to [`MockHost::events`] in call order so
//! tests can assert exactly what a driver emitted. Input state for the encoder
//! can be scripted per read.

use std::collections::VecDeque;

use super::{InputSink, InputSource, ScreenInfo};
use crate::{normalize::ScreenSize, Result, ToneLinkError};

/// One call recorded by [`MockHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    Warp { x: i32, y: i32 },
    Key { code: u32, pressed: bool },
    Flush,
}

#[derive(Debug, Clone)]
pub struct MockHost {
    pub screen: ScreenSize,
    pub refresh_rate: Option<u32>,
    pub events: Vec<HostEvent>,
    /// Pointer position and key state returned by input reads. When the
    /// script runs dry the last entry keeps being returned.
    pub script: VecDeque<((i32, i32), bool)>,
    last_input: ((i32, i32), bool),
    /// When set, every sink call fails with a host error.
    pub should_fail: bool,
}

impl MockHost {
    pub fn new(width: u32, height: u32) -> Self {
        let screen = ScreenSize::new(width, height);
        Self {
            screen,
            refresh_rate: Some(60),
            events: Vec::new(),
            script: VecDeque::new(),
            last_input: (screen.center(), false),
            should_fail: false,
        }
    }

    /// Fixes the input state returned by every read.
    pub fn with_input(mut self, position: (i32, i32), key_down: bool) -> Self {
        self.script.clear();
        self.last_input = (position, key_down);
        self
    }

    pub fn warps(&self) -> Vec<(i32, i32)> {
        self.events
            .iter()
            .filter_map(|event| match event {
                HostEvent::Warp { x, y } => Some((*x, *y)),
                _ => None,
            })
            .collect()
    }

    pub fn key_events(&self) -> Vec<bool> {
        self.events
            .iter()
            .filter_map(|event| match event {
                HostEvent::Key { pressed, .. } => Some(*pressed),
                _ => None,
            })
            .collect()
    }

    fn current_input(&mut self) -> ((i32, i32), bool) {
        if let Some(next) = self.script.pop_front() {
            self.last_input = next;
        }
        self.last_input
    }

    fn record(&mut self, event: HostEvent) -> Result<()> {
        if self.should_fail {
            return Err(ToneLinkError::host("mock failure"));
        }
        self.events.push(event);
        Ok(())
    }
}

impl ScreenInfo for MockHost {
    fn screen_size(&self) -> Result<ScreenSize> {
        Ok(self.screen)
    }

    fn refresh_rate(&self) -> Option<u32> {
        self.refresh_rate
    }
}

impl InputSource for MockHost {
    fn pointer_position(&mut self) -> Result<(i32, i32)> {
        Ok(self.current_input().0)
    }

    /// Reads the key state recorded with the most recent pointer read, so one
    /// scripted entry covers one sample.
    fn any_key_down(&mut self) -> Result<bool> {
        Ok(self.last_input.1)
    }
}

impl InputSink for MockHost {
    fn warp_pointer(&mut self, x: i32, y: i32) -> Result<()> {
        self.record(HostEvent::Warp { x, y })
    }

    fn key_event(&mut self, key_code: u32, pressed: bool) -> Result<()> {
        self.record(HostEvent::Key {
            code: key_code,
            pressed,
        })
    }

    fn flush(&mut self) -> Result<()> {
        self.record(HostEvent::Flush)
    }
}
