//! Persisted signal files: mono 16-bit PCM WAV.
//!
//! The writer emits a 44-byte header with placeholder sizes and back-patches
//! the RIFF and data sizes once the sample count is known. That happens on
//! [`SignalWriter::finalize`] and, for early exits, when the writer is dropped.

use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Read, Seek, Write},
    path::Path,
};

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{Result, ToneLinkError};

/// Size of the canonical PCM WAV header preceding the sample data.
pub const HEADER_LEN: u64 = 44;
pub const BYTES_PER_SAMPLE: u64 = 2;

pub fn signal_spec(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

/// Streaming writer for encoded samples.
pub struct SignalWriter<W: Write + Seek> {
    inner: WavWriter<W>,
    samples: u64,
}

impl SignalWriter<BufWriter<File>> {
    pub fn create(path: &Path, sample_rate: u32) -> Result<Self> {
        let inner = WavWriter::create(path, signal_spec(sample_rate)).map_err(|err| {
            ToneLinkError::setup(format!("cannot create {}: {err}", path.display()))
        })?;
        Ok(Self { inner, samples: 0 })
    }
}

impl<W: Write + Seek> SignalWriter<W> {
    pub fn new(writer: W, sample_rate: u32) -> Result<Self> {
        let inner = WavWriter::new(writer, signal_spec(sample_rate))?;
        Ok(Self { inner, samples: 0 })
    }

    pub fn write(&mut self, sample: i16) -> Result<()> {
        self.inner.write_sample(sample)?;
        self.samples += 1;
        Ok(())
    }

    /// Back-patches the header sizes and closes the stream. Returns the
    /// number of samples written.
    pub fn finalize(self) -> Result<u64> {
        let samples = self.samples;
        self.inner.finalize()?;
        Ok(samples)
    }
}

/// Format summary of an opened signal file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalInfo {
    pub sample_rate: u32,
    /// Samples declared by the header.
    pub samples: u32,
}

/// Sample-at-a-time reader for signal files.
///
/// The header is parsed for the format only. Samples are read from the start
/// of the data chunk to the physical end of the stream, so a file whose size
/// fields were never back-patched still decodes in full.
pub struct SignalReader<R: Read> {
    info: SignalInfo,
    inner: R,
    read: u64,
    done: bool,
}

impl SignalReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self> {
        let reader = WavReader::open(path).map_err(|err| {
            ToneLinkError::setup(format!("cannot open {}: {err}", path.display()))
        })?;
        Self::from_wav(reader)
    }
}

impl<R: Read> SignalReader<R> {
    pub fn new(reader: R) -> Result<Self> {
        Self::from_wav(WavReader::new(reader)?)
    }

    fn from_wav(reader: WavReader<R>) -> Result<Self> {
        let spec = reader.spec();
        if spec.channels != 1 || spec.bits_per_sample != 16 || spec.sample_format != SampleFormat::Int
        {
            return Err(ToneLinkError::setup(format!(
                "expected mono 16-bit PCM, found {} channel(s) of {}-bit {:?}",
                spec.channels, spec.bits_per_sample, spec.sample_format
            )));
        }

        let info = SignalInfo {
            sample_rate: spec.sample_rate,
            samples: reader.len(),
        };
        Ok(Self {
            info,
            inner: reader.into_inner(),
            read: 0,
            done: false,
        })
    }

    pub fn info(&self) -> SignalInfo {
        self.info
    }

    /// Warns when the file was recorded at a different rate than expected.
    pub fn check_sample_rate(&self, expected: u32) {
        if self.info.sample_rate != expected {
            warn!(
                found = self.info.sample_rate,
                expected, "signal file sample rate differs from the carrier basis"
            );
        }
    }

    /// Next sample, or `None` at end of data. A truncated final sample counts
    /// as end of data.
    pub fn next_sample(&mut self) -> Result<Option<i16>> {
        if self.done {
            return Ok(None);
        }

        let mut frame = [0u8; BYTES_PER_SAMPLE as usize];
        match self.inner.read_exact(&mut frame) {
            Ok(()) => {
                self.read += 1;
                Ok(Some(i16::from_le_bytes(frame)))
            }
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
                self.done = true;
                if self.read != u64::from(self.info.samples) {
                    warn!(
                        declared = self.info.samples,
                        read = self.read,
                        "signal file length differs from its header"
                    );
                }
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }
}

impl<R: Read> Iterator for SignalReader<R> {
    type Item = Result<i16>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_sample().transpose()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn header_sizes_are_back_patched() {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut writer = SignalWriter::new(&mut buffer, 44_100).unwrap();
            for sample in [0, 1, -1, i16::MAX, i16::MIN] {
                writer.write(sample).unwrap();
            }
            assert_eq!(writer.finalize().unwrap(), 5);
        }

        let bytes = buffer.into_inner();
        assert_eq!(bytes.len() as u64, HEADER_LEN + 5 * BYTES_PER_SAMPLE);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), 36 + 10);
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(u32::from_le_bytes(bytes[40..44].try_into().unwrap()), 10);
    }

    #[test]
    fn dropped_writer_still_patches_header() {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut writer = SignalWriter::new(&mut buffer, 44_100).unwrap();
            writer.write(7).unwrap();
            writer.write(8).unwrap();
        }

        let bytes = buffer.into_inner();
        assert_eq!(u32::from_le_bytes(bytes[40..44].try_into().unwrap()), 4);
    }

    #[test]
    fn reads_back_what_was_written() {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut writer = SignalWriter::new(&mut buffer, 22_050).unwrap();
            for sample in [3, -4, 5] {
                writer.write(sample).unwrap();
            }
            writer.finalize().unwrap();
        }

        buffer.set_position(0);
        let reader = SignalReader::new(buffer).unwrap();
        assert_eq!(
            reader.info(),
            SignalInfo {
                sample_rate: 22_050,
                samples: 3
            }
        );
        let samples: Vec<i16> = reader.collect::<Result<_>>().unwrap();
        assert_eq!(samples, vec![3, -4, 5]);
    }

    fn encoded_bytes(samples: &[i16]) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut writer = SignalWriter::new(&mut buffer, 44_100).unwrap();
            for &sample in samples {
                writer.write(sample).unwrap();
            }
            writer.finalize().unwrap();
        }
        buffer.into_inner()
    }

    #[test]
    fn truncated_final_sample_ends_the_stream() {
        let mut bytes = encoded_bytes(&[10, 20, 30]);
        bytes.pop();

        let samples: Vec<i16> = SignalReader::new(Cursor::new(bytes))
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(samples, vec![10, 20]);
    }

    #[test]
    fn unpatched_header_reads_to_end_of_file() {
        let expected: Vec<i16> = (0..1101).map(|i| (i % 200) as i16 - 100).collect();
        let mut bytes = encoded_bytes(&expected);
        bytes[4..8].fill(0);
        bytes[40..44].fill(0);

        let reader = SignalReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.info().samples, 0);
        let samples: Vec<i16> = reader.collect::<Result<_>>().unwrap();
        assert_eq!(samples, expected);
    }

    #[test]
    fn end_of_data_is_sticky() {
        let mut reader = SignalReader::new(Cursor::new(encoded_bytes(&[1]))).unwrap();
        assert_eq!(reader.next_sample().unwrap(), Some(1));
        assert_eq!(reader.next_sample().unwrap(), None);
        assert_eq!(reader.next_sample().unwrap(), None);
    }

    #[test]
    fn rejects_stereo_files() {
        let mut buffer = Cursor::new(Vec::new());
        {
            let spec = WavSpec {
                channels: 2,
                ..signal_spec(44_100)
            };
            let mut writer = WavWriter::new(&mut buffer, spec).unwrap();
            writer.write_sample(0i16).unwrap();
            writer.write_sample(0i16).unwrap();
            writer.finalize().unwrap();
        }

        buffer.set_position(0);
        let err = SignalReader::new(buffer).err().unwrap();
        assert!(format!("{err}").contains("mono"));
    }

    #[test]
    fn missing_file_is_a_setup_error() {
        let err = SignalReader::open(Path::new("/nonexistent/signal.wav"))
            .err()
            .unwrap();
        assert!(matches!(err, ToneLinkError::Setup(_)));
    }
}
