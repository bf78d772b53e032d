//! Test helpers and fixtures for tightloop integration tests
//!
//! PCM generators work on `(left, right)` pairs and encode to L16
//! little-endian bytes. The reader wrappers model misbehaving sources:
//! short reads at odd byte counts, hard failures mid-stream, refused seeks.
//!
//! ## Tolerance Levels
//!
//! Use the appropriate tolerance from [`tolerances`] module:
//! - `TRUNCATION_STEP` (1.0): Exact-in-theory interpolation
//! - `SMOOTH_SIGNAL_EPSILON` (2.0): Resampled sines
//! - `INT16_EPSILON`: Normalized-scale comparisons

pub mod tolerances;

use std::f64::consts::PI;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use tightloop::prelude::*;
use tightloop::sample::{encode_i16, frames};

/// Encode sample pairs as an L16 stereo byte stream.
pub fn encode_pcm(samples: &[(i16, i16)]) -> Vec<u8> {
    let mut bytes = vec![0u8; samples.len() * SAMPLE_SIZE];
    for (chunk, &(left, right)) in bytes.chunks_exact_mut(SAMPLE_SIZE).zip(samples) {
        encode_i16(chunk, left, right);
    }
    bytes
}

/// Decode whole samples from an L16 stereo byte stream.
pub fn decode_pcm(bytes: &[u8]) -> Vec<(i16, i16)> {
    frames(bytes).collect()
}

pub fn pcm_cursor(samples: &[(i16, i16)]) -> Cursor<Vec<u8>> {
    Cursor::new(encode_pcm(samples))
}

/// Sample `i` is `(i * step, -i * step)`.
pub fn generate_ramp(num_samples: usize, step: i16) -> Vec<(i16, i16)> {
    (0..num_samples as i16)
        .map(|i| (i * step, -i * step))
        .collect()
}

/// Generate silence (zero samples).
pub fn generate_silence(num_samples: usize) -> Vec<(i16, i16)> {
    vec![(0, 0); num_samples]
}

/// Same sine on both channels, rounded to the nearest step.
pub fn generate_sine(period: f64, amplitude: f64, num_samples: usize) -> Vec<(i16, i16)> {
    (0..num_samples)
        .map(|i| {
            let value = (amplitude * (2.0 * PI * i as f64 / period).sin()).round() as i16;
            (value, value)
        })
        .collect()
}

/// `before` for the first `split` samples, then `after`.
pub fn generate_step(num_samples: usize, split: usize, before: i16, after: i16) -> Vec<(i16, i16)> {
    (0..num_samples)
        .map(|i| if i < split { (before, before) } else { (after, after) })
        .collect()
}

/// Read `total` bytes through `reader` in `chunk`-sized calls.
///
/// Panics if a read fails or the stream ends early.
pub fn read_in_chunks<R: Read>(mut reader: R, total: usize, chunk: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(total);
    let mut buf = vec![0u8; chunk];
    while out.len() < total {
        let want = chunk.min(total - out.len());
        let n = reader.read(&mut buf[..want]).expect("read failed");
        assert!(n > 0, "stream ended after {} bytes", out.len());
        out.extend_from_slice(&buf[..n]);
    }
    out
}

/// Route library logs to the test harness output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

/// Hands out at most `chunk` bytes per read, regardless of sample boundaries.
pub struct ChunkedReader<R> {
    inner: R,
    chunk: usize,
}

impl<R> ChunkedReader<R> {
    pub fn new(inner: R, chunk: usize) -> Self {
        assert!(chunk > 0);
        Self { inner, chunk }
    }
}

impl<R: Read> Read for ChunkedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let len = buf.len().min(self.chunk);
        self.inner.read(&mut buf[..len])
    }
}

impl<R: Seek> Seek for ChunkedReader<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

impl<R: StreamLength> StreamLength for ChunkedReader<R> {
    fn byte_len(&self) -> u64 {
        self.inner.byte_len()
    }
}

/// Serves `data`, then fails every read with `BrokenPipe`.
pub struct FailingReader {
    data: Cursor<Vec<u8>>,
}

impl FailingReader {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data: Cursor::new(data),
        }
    }
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.data.read(buf)? {
            0 if !buf.is_empty() => Err(io::Error::new(io::ErrorKind::BrokenPipe, "source gone")),
            n => Ok(n),
        }
    }
}

impl Seek for FailingReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.data.seek(pos)
    }
}

/// Reads normally but refuses every seek.
pub struct SeekFailingReader {
    data: Cursor<Vec<u8>>,
}

impl SeekFailingReader {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data: Cursor::new(data),
        }
    }
}

impl Read for SeekFailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.data.read(buf)
    }
}

impl Seek for SeekFailingReader {
    fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "seek refused"))
    }
}
