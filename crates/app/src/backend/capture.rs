//! cpal input stream bridged into the blocking [`CaptureDevice`] interface.
//!
//! The stream callback appends samples to a bounded queue and wakes the
//! reader. When the reader falls a full second behind, the queue is dropped
//! and the next read reports an xrun.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    BufferSize, SampleRate, Stream, StreamConfig,
};
use parking_lot::{Condvar, Mutex};
use tonelink_core::{CaptureDevice, CaptureError, Result, ToneLinkError};
use tracing::{error, info};

/// Longest a read blocks before returning what it has.
const READ_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Default)]
struct Shared {
    queue: Mutex<VecDeque<i16>>,
    ready: Condvar,
    overrun: AtomicBool,
    failure: Mutex<Option<String>>,
}

pub struct CpalCapture {
    shared: Arc<Shared>,
    _stream: Stream,
}

impl CpalCapture {
    /// Opens `device` (or the host default) as a mono 16-bit stream at
    /// `sample_rate` and starts it.
    pub fn open(device: Option<&str>, sample_rate: u32) -> Result<Self> {
        let host = cpal::default_host();
        let device = match device {
            Some(name) => host
                .input_devices()
                .map_err(|err| ToneLinkError::setup(format!("cannot list input devices: {err}")))?
                .find(|device| device.name().is_ok_and(|device_name| device_name == name))
                .ok_or_else(|| ToneLinkError::setup(format!("no input device named {name}")))?,
            None => host
                .default_input_device()
                .ok_or_else(|| ToneLinkError::setup("no default input device"))?,
        };
        let name = device.name().unwrap_or_else(|_| "<unnamed>".to_string());

        let config = StreamConfig {
            channels: 1,
            sample_rate: SampleRate(sample_rate),
            buffer_size: BufferSize::Default,
        };
        let limit = sample_rate as usize;
        let shared = Arc::new(Shared::default());

        let data_shared = Arc::clone(&shared);
        let error_shared = Arc::clone(&shared);
        let stream = device
            .build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    let mut queue = data_shared.queue.lock();
                    if queue.len() + data.len() > limit {
                        queue.clear();
                        data_shared.overrun.store(true, Ordering::Release);
                    }
                    queue.extend(data.iter().copied());
                    drop(queue);
                    data_shared.ready.notify_one();
                },
                move |err| {
                    error!(%err, "capture stream error");
                    *error_shared.failure.lock() = Some(err.to_string());
                    error_shared.ready.notify_one();
                },
                None,
            )
            .map_err(|err| ToneLinkError::setup(format!("cannot open {name}: {err}")))?;
        stream
            .play()
            .map_err(|err| ToneLinkError::setup(format!("cannot start {name}: {err}")))?;

        info!(device = %name, sample_rate, "capture stream started");
        Ok(Self {
            shared,
            _stream: stream,
        })
    }
}

impl CaptureDevice for CpalCapture {
    fn read(&mut self, buf: &mut [i16]) -> std::result::Result<usize, CaptureError> {
        if let Some(failure) = self.shared.failure.lock().take() {
            return Err(CaptureError::Device(failure));
        }
        if self.shared.overrun.swap(false, Ordering::AcqRel) {
            return Err(CaptureError::Xrun);
        }

        let mut queue = self.shared.queue.lock();
        while queue.len() < buf.len() {
            if self.shared.ready.wait_for(&mut queue, READ_TIMEOUT).timed_out() {
                break;
            }
        }

        let len = queue.len().min(buf.len());
        for (slot, sample) in buf.iter_mut().zip(queue.drain(..len)) {
            *slot = sample;
        }
        Ok(len)
    }

    fn recover(&mut self) -> std::result::Result<(), CaptureError> {
        self.shared.queue.lock().clear();
        self.shared.overrun.store(false, Ordering::Release);
        Ok(())
    }
}
