//! Real-time speed shifting by fractional resampling.
//!
//! Each output sample is the interpolator evaluated over the last
//! `window_size` input samples per channel, at `window_size / 2 - 1 + frac_pos`.
//! After every emitted sample `frac_pos` grows by the speed; each time it
//! reaches 1.0 one more input sample is pulled into the window.
//!
//! # Example
//!
//! ```ignore
//! use tightloop_stream::{Looper, SpeedShifter, ShifterConfig};
//!
//! let looper = Looper::whole(pcm)?;
//! let shifter = SpeedShifter::from_config(looper, ShifterConfig::new().speed(1.25))?;
//! player.play(&shifter);
//!
//! // From the UI thread
//! shifter.set_speed(0.8);
//! ```
//!
//! Seeking is supported but not seamless: the interpolation window is
//! rebuilt from silence at the new position.

mod config;

pub use config::ShifterConfig;

use parking_lot::Mutex;
use std::io::{self, Read, Seek, SeekFrom};
use tightloop_core::sample::{align_down, decode_i16, encode_f64, SAMPLE_SIZE};
use tightloop_core::{Error, InterpolationWindow, Interpolator, Result};
use tracing::{debug, trace, warn};

use crate::source::{read_full, read_once, ReadOutcome};
use config::is_valid_speed;

/// Most input samples fetched per requested output sample in one pass.
/// Matches [`ShifterConfig::MAX_SPEED`]; faster speeds take several passes.
const MAX_READ_PER_OUTPUT: usize = 16;

struct ShifterState<R> {
    source: R,
    speed: f64,
    interpolator: Interpolator,
    frac_pos: f64,
    /// Samples pushed past the bootstrap sample, up to `window_size / 2`.
    lookahead_samples: usize,
    /// Source bytes read but not yet pulled into the windows.
    leftover: Vec<u8>,
    left: InterpolationWindow,
    right: InterpolationWindow,
    /// Error held back by an `io::Read` call that had already delivered bytes.
    deferred_error: Option<Error>,
}

impl<R: Read> ShifterState<R> {
    fn new(source: R, speed: f64, interpolator: Interpolator) -> Self {
        let window_size = interpolator.window_size();
        let mut state = Self {
            source,
            speed,
            interpolator,
            frac_pos: 0.0,
            lookahead_samples: 0,
            leftover: Vec::new(),
            left: InterpolationWindow::new(window_size),
            right: InterpolationWindow::new(window_size),
            deferred_error: None,
        };
        if let Err(err) = state.reset() {
            warn!(%err, "speed shifter priming failed, starting from silence");
        }
        state
    }

    fn half_window(&self) -> usize {
        self.interpolator.window_size() / 2
    }

    /// Clear the windows and prime them with `half - 1` silent samples plus
    /// one sample read from the source.
    fn reset(&mut self) -> Result<()> {
        self.frac_pos = 0.0;
        self.lookahead_samples = 0;
        self.leftover.clear();
        self.left.clear();
        self.right.clear();

        for _ in 0..self.half_window() - 1 {
            self.push_sample(0, 0);
        }

        let mut sample = [0u8; SAMPLE_SIZE];
        let (left, right, status) = match read_full(&mut self.source, &mut sample).into_parts() {
            (_, Ok(())) => {
                let (left, right) = decode_i16(&sample);
                (left, right, Ok(()))
            }
            (_, Err(Error::EndOfStream)) => (0, 0, Ok(())),
            (_, Err(err)) => (0, 0, Err(err)),
        };
        self.push_sample(left, right);
        status
    }

    #[inline]
    fn push_sample(&mut self, left: i16, right: i16) {
        self.left.push(left as f64);
        self.right.push(right as f64);
    }

    /// Fill as much of `out` as possible; stop only on error or end of stream.
    fn read(&mut self, out: &mut [u8]) -> ReadOutcome {
        let mut served = 0;
        while served < out.len() {
            let pass = self.single_pass(&mut out[served..]);
            served += pass.bytes;
            if let Err(err) = pass.status {
                return ReadOutcome::stopped(served, err);
            }
        }
        ReadOutcome::complete(served)
    }

    /// One source read followed by as much resampling as its bytes allow.
    fn single_pass(&mut self, out: &mut [u8]) -> ReadOutcome {
        if out.is_empty() {
            return ReadOutcome::complete(0);
        }
        debug_assert_eq!(out.len() % SAMPLE_SIZE, 0);

        let half = self.half_window();
        assert!(
            self.lookahead_samples <= half,
            "lookahead overflow: {} > {}",
            self.lookahead_samples,
            half
        );

        let pending_lookahead = (half - self.lookahead_samples) * SAMPLE_SIZE;
        let out_samples = out.len() / SAMPLE_SIZE;
        // Float-to-int casts saturate; the cap bounds the buffer at any speed
        let samples_required = ((out_samples as f64 * self.speed).ceil() as usize)
            .min(out_samples.saturating_mul(MAX_READ_PER_OUTPUT));
        let wanted = samples_required
            .saturating_mul(SAMPLE_SIZE)
            .saturating_add(pending_lookahead);
        let bytes_to_read = wanted.saturating_sub(self.leftover.len());

        let mut status = Ok(());
        if bytes_to_read > 0 {
            let kept = self.leftover.len();
            self.leftover.resize(kept + bytes_to_read, 0);
            let outcome = read_once(&mut self.source, &mut self.leftover[kept..]);
            self.leftover.truncate(kept + outcome.bytes);
            status = outcome.status;
        }

        let mut cursor = 0;

        // Lookahead must be in place before anything can be emitted
        while self.lookahead_samples < half {
            if self.leftover.len() - cursor < SAMPLE_SIZE {
                self.leftover.drain(..cursor);
                return ReadOutcome { bytes: 0, status };
            }
            let (left, right) = decode_i16(&self.leftover[cursor..]);
            self.push_sample(left, right);
            self.lookahead_samples += 1;
            cursor += SAMPLE_SIZE;
        }

        let interpolator = self.interpolator;
        let base = (half - 1) as f64;
        let mut served = 0;
        while self.leftover.len() - cursor >= SAMPLE_SIZE && served < out.len() {
            if self.frac_pos < 1.0 {
                let x = base + self.frac_pos;
                let left = interpolator.interpolate(self.left.as_slice(), x);
                let right = interpolator.interpolate(self.right.as_slice(), x);
                encode_f64(&mut out[served..], left, right);
                served += SAMPLE_SIZE;
                self.frac_pos += self.speed;
            }

            while self.frac_pos >= 1.0 && self.leftover.len() - cursor >= SAMPLE_SIZE {
                let (left, right) = decode_i16(&self.leftover[cursor..]);
                self.push_sample(left, right);
                cursor += SAMPLE_SIZE;
                self.frac_pos -= 1.0;
            }
        }

        debug_assert!(self.frac_pos >= 0.0);
        self.leftover.drain(..cursor);
        trace!(
            requested = out.len(),
            read = bytes_to_read,
            served,
            leftover = self.leftover.len(),
            "speed shifter pass"
        );

        ReadOutcome {
            bytes: served,
            status,
        }
    }
}

/// Plays an L16 stereo stream at an adjustable speed by resampling it.
///
/// Thread-safe: reads from the playback thread and [`SpeedShifter::set_speed`]
/// from a control thread are serialized by one lock per instance, held for
/// the whole of each call.
///
/// Can wrap a [`Looper`](crate::Looper) (or a
/// [`LooperHandle`](crate::LooperHandle)). The shifter knows nothing about
/// the loop points, so wraps are resampled like any other discontinuity.
pub struct SpeedShifter<R> {
    state: Mutex<ShifterState<R>>,
}

impl<R: Read> SpeedShifter<R> {
    /// Unit speed, 6-point Hermite interpolation.
    pub fn with_defaults(source: R) -> Self {
        Self::new(source, 1.0, Interpolator::default())
    }

    /// Create a shifter and prime its interpolation window from `source`.
    ///
    /// # Panics
    ///
    /// Panics if `speed` is not finite and positive, or if the interpolator's
    /// window size is odd or smaller than 2. Use [`SpeedShifter::from_config`]
    /// to get an error instead.
    pub fn new(source: R, speed: f64, interpolator: Interpolator) -> Self {
        assert!(
            is_valid_speed(speed),
            "speed must be finite and positive, got {speed}"
        );
        assert!(
            interpolator.is_valid(),
            "interpolator window must be even and at least 2, got {}",
            interpolator.window_size()
        );
        Self {
            state: Mutex::new(ShifterState::new(source, speed, interpolator)),
        }
    }

    pub fn from_config(source: R, config: ShifterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(source, config.speed, config.interpolator))
    }

    /// Fill `buffer` (rounded down to whole samples) with resampled audio.
    ///
    /// Reads the source as many times as needed. On end of stream or a
    /// source error, returns what was produced so far together with the error.
    /// The byte count is always a multiple of 4.
    pub fn read_bytes(&self, buffer: &mut [u8]) -> ReadOutcome {
        let len = align_down(buffer.len());
        self.state.lock().read(&mut buffer[..len])
    }

    fn read_io(&self, buffer: &mut [u8]) -> io::Result<usize> {
        let len = align_down(buffer.len());
        let mut state = self.state.lock();
        if let Some(err) = state.deferred_error.take() {
            return Err(err.into());
        }
        let outcome = state.read(&mut buffer[..len]);
        outcome.into_io(&mut state.deferred_error)
    }
}

impl<R> SpeedShifter<R> {
    pub fn speed(&self) -> f64 {
        self.state.lock().speed
    }

    /// Change the playback speed. Takes effect on the next emitted sample.
    ///
    /// # Panics
    ///
    /// Panics if `speed` is not finite and positive.
    pub fn set_speed(&self, speed: f64) {
        assert!(
            is_valid_speed(speed),
            "speed must be finite and positive, got {speed}"
        );
        let mut state = self.state.lock();
        debug!(from = state.speed, to = speed, "speed changed");
        state.speed = speed;
    }

    pub fn interpolator(&self) -> Interpolator {
        self.state.lock().interpolator
    }

    pub fn window_size(&self) -> usize {
        self.state.lock().interpolator.window_size()
    }

    pub fn config(&self) -> ShifterConfig {
        let state = self.state.lock();
        ShifterConfig {
            speed: state.speed,
            interpolator: state.interpolator,
        }
    }

    pub fn into_inner(self) -> R {
        self.state.into_inner().source
    }
}

impl<R: Read + Seek> SpeedShifter<R> {
    /// Seek the underlying source and rebuild the interpolation window.
    ///
    /// Only absolute seeks (`Start`, `End`) are supported, plus `Current(0)`
    /// which just reports the underlying source position without resetting.
    /// That position is ahead of the sample being played, by the lookahead
    /// and any buffered input.
    /// Buffered input is discarded, so the next output starts from silence
    /// padding at the new position. If the source seek fails, nothing is
    /// reset and playback continues where it was.
    ///
    /// # Panics
    ///
    /// Panics on a relative seek with a non-zero offset: the shifter cannot
    /// know what the interpolation window should hold after it.
    pub fn seek_to(&self, pos: SeekFrom) -> Result<u64> {
        match pos {
            SeekFrom::Current(0) => return Ok(self.state.lock().source.stream_position()?),
            SeekFrom::Current(offset) => {
                panic!("relative seeks are not supported by SpeedShifter (offset {offset})")
            }
            SeekFrom::Start(_) | SeekFrom::End(_) => {}
        }

        let mut state = self.state.lock();
        let position = state.source.seek(pos)?;
        state.reset()?;
        debug!(position, "speed shifter seek, interpolation window reset");
        Ok(position)
    }
}

impl<R: Read> Read for SpeedShifter<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_io(buf)
    }
}

impl<R: Read> Read for &SpeedShifter<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_io(buf)
    }
}

impl<R: Read + Seek> Seek for SpeedShifter<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Ok(self.seek_to(pos)?)
    }
}

impl<R: Read + Seek> Seek for &SpeedShifter<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Ok(self.seek_to(pos)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tightloop_core::sample::{encode_i16, frames};

    fn pcm(samples: &[(i16, i16)]) -> Cursor<Vec<u8>> {
        let mut bytes = vec![0u8; samples.len() * SAMPLE_SIZE];
        for (chunk, &(l, r)) in bytes.chunks_exact_mut(SAMPLE_SIZE).zip(samples) {
            encode_i16(chunk, l, r);
        }
        Cursor::new(bytes)
    }

    fn ramp(len: usize) -> Vec<(i16, i16)> {
        (0..len as i16).map(|i| (i * 100, -i * 100)).collect()
    }

    // =========================================================================
    // Construction
    // =========================================================================

    #[test]
    fn test_defaults() {
        let shifter = SpeedShifter::with_defaults(pcm(&ramp(8)));
        assert_eq!(shifter.speed(), 1.0);
        assert_eq!(shifter.window_size(), 6);
        assert_eq!(shifter.interpolator().name(), "Hermite 6-point 3rd-order");
    }

    #[test]
    fn test_priming_reads_exactly_one_sample() {
        let shifter = SpeedShifter::with_defaults(pcm(&ramp(8)));
        assert_eq!(shifter.into_inner().position(), SAMPLE_SIZE as u64);
    }

    #[test]
    #[should_panic(expected = "interpolator window must be even")]
    fn test_odd_window_panics() {
        SpeedShifter::new(pcm(&ramp(8)), 1.0, Interpolator::LagrangeN(5));
    }

    #[test]
    #[should_panic(expected = "speed must be finite and positive")]
    fn test_zero_speed_panics() {
        SpeedShifter::new(pcm(&ramp(8)), 0.0, Interpolator::default());
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let config = ShifterConfig {
            speed: -2.0,
            ..Default::default()
        };
        assert!(SpeedShifter::from_config(pcm(&ramp(8)), config).is_err());
    }

    // =========================================================================
    // Resampling
    // =========================================================================

    #[test]
    fn test_unit_speed_reproduces_input() {
        let input = ramp(64);
        for interp in Interpolator::all_fixed() {
            let shifter = SpeedShifter::new(pcm(&input), 1.0, *interp);
            let mut out = vec![0u8; 40 * SAMPLE_SIZE];
            let outcome = shifter.read_bytes(&mut out);
            assert!(outcome.is_complete());
            let decoded: Vec<_> = frames(&out).collect();
            assert_eq!(decoded, input[..40].to_vec(), "{}", interp.name());
        }
    }

    #[test]
    fn test_half_speed_emits_two_samples_per_input() {
        let input = ramp(64);
        let shifter = SpeedShifter::new(pcm(&input), 0.5, Interpolator::Lagrange4Pt3Ord);
        let mut out = vec![0u8; 40 * SAMPLE_SIZE];
        assert!(shifter.read_bytes(&mut out).is_complete());

        // Past the silence padding a cubic reproduces the ramp exactly
        let decoded: Vec<_> = frames(&out).collect();
        assert_eq!(decoded[0], (0, 0));
        for (k, &(left, right)) in decoded.iter().enumerate().skip(2) {
            assert_eq!(left, (k as i16) * 50, "sample {k}");
            assert_eq!(right, -(k as i16) * 50, "sample {k}");
        }
    }

    #[test]
    fn test_double_speed_skips_every_other_input() {
        let input = ramp(128);
        let shifter = SpeedShifter::new(pcm(&input), 2.0, Interpolator::Hermite6Pt3Ord);
        let mut out = vec![0u8; 32 * SAMPLE_SIZE];
        assert!(shifter.read_bytes(&mut out).is_complete());

        let decoded: Vec<_> = frames(&out).collect();
        let expected: Vec<_> = input.iter().step_by(2).take(32).copied().collect();
        assert_eq!(decoded, expected);
    }

    #[test]
    fn test_unaligned_buffer_is_rounded_down() {
        let shifter = SpeedShifter::with_defaults(pcm(&ramp(64)));
        let mut out = vec![0xAAu8; 11];
        let outcome = shifter.read_bytes(&mut out);
        assert_eq!(outcome.bytes, 8);
        assert_eq!(&out[8..], &[0xAA, 0xAA, 0xAA]);
    }

    #[test]
    fn test_end_of_stream_reports_aligned_partial_count() {
        let shifter = SpeedShifter::with_defaults(pcm(&ramp(16)));
        let mut out = vec![0u8; 64 * SAMPLE_SIZE];
        let outcome = shifter.read_bytes(&mut out);
        assert!(outcome.is_end_of_stream());
        assert_eq!(outcome.bytes % SAMPLE_SIZE, 0);
        // Emitting sample k needs sample k + 4 pending, so the tail stays buffered
        assert_eq!(outcome.bytes, (16 - 4) * SAMPLE_SIZE);
    }

    #[test]
    fn test_tiny_reads_at_slow_speed_never_stall() {
        let input = ramp(64);
        let shifter = SpeedShifter::new(pcm(&input), 0.5, Interpolator::Lagrange4Pt3Ord);
        let mut collected = Vec::new();
        for _ in 0..40 {
            let mut out = [0u8; SAMPLE_SIZE];
            let outcome = shifter.read_bytes(&mut out);
            assert!(outcome.is_complete());
            collected.extend(frames(&out));
        }
        assert_eq!(collected.len(), 40);
        let expected: Vec<_> = (2..40).map(|k: i16| (k * 50, -k * 50)).collect();
        assert_eq!(collected[2..].to_vec(), expected);
    }

    #[test]
    fn test_set_speed_midstream() {
        let input = ramp(128);
        let shifter = SpeedShifter::new(pcm(&input), 1.0, Interpolator::Hermite4Pt3Ord);
        let mut out = vec![0u8; 8 * SAMPLE_SIZE];
        assert!(shifter.read_bytes(&mut out).is_complete());

        shifter.set_speed(2.0);
        assert_eq!(shifter.config().speed, 2.0);
        let mut out = vec![0u8; 8 * SAMPLE_SIZE];
        assert!(shifter.read_bytes(&mut out).is_complete());
        let decoded: Vec<_> = frames(&out).map(|(l, _)| l).collect();
        assert_eq!(decoded, vec![800, 1000, 1200, 1400, 1600, 1800, 2000, 2200]);
    }

    #[test]
    fn test_extreme_speeds_do_not_overflow() {
        for speed in [1e8, 1e17] {
            let shifter = SpeedShifter::with_defaults(pcm(&ramp(256)));
            shifter.set_speed(speed);
            let mut out = [0u8; 4096];
            let outcome = shifter.read_bytes(&mut out);
            assert!(outcome.is_end_of_stream(), "speed {speed}");
            // The first sample is emitted, then the whole input is skipped over
            assert_eq!(outcome.bytes, SAMPLE_SIZE, "speed {speed}");
            assert_eq!(frames(&out[..SAMPLE_SIZE]).next(), Some((0, 0)));
        }
    }

    /// Fails once when the read position reaches `fail_at`, then recovers.
    struct Hiccup {
        inner: Cursor<Vec<u8>>,
        fail_at: u64,
        failed: bool,
    }

    impl Read for Hiccup {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.failed {
                return self.inner.read(buf);
            }
            let pos = self.inner.position();
            if pos == self.fail_at {
                self.failed = true;
                return Err(io::ErrorKind::BrokenPipe.into());
            }
            let allowed = buf.len().min((self.fail_at - pos) as usize);
            self.inner.read(&mut buf[..allowed])
        }
    }

    #[test]
    fn test_io_read_returns_error_after_partial_data() {
        let source = Hiccup {
            inner: pcm(&ramp(64)),
            fail_at: 20 * SAMPLE_SIZE as u64,
            failed: false,
        };
        let mut shifter = SpeedShifter::new(source, 1.0, Interpolator::Hermite4Pt3Ord);
        let mut out = vec![0u8; 100 * SAMPLE_SIZE];

        // Samples 0..=16 come out; 17..=19 are held as lookahead
        assert_eq!(shifter.read(&mut out).unwrap(), 17 * SAMPLE_SIZE);
        let decoded: Vec<_> = frames(&out[..17 * SAMPLE_SIZE]).collect();
        assert_eq!(decoded, ramp(17));

        let err = shifter.read(&mut out).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);

        let mut out = [0u8; SAMPLE_SIZE];
        assert_eq!(shifter.read(&mut out).unwrap(), SAMPLE_SIZE);
        assert_eq!(frames(&out).next(), Some((1700, -1700)));
    }

    // =========================================================================
    // Seek
    // =========================================================================

    #[test]
    fn test_seek_resets_window() {
        let input = ramp(64);
        let shifter = SpeedShifter::new(pcm(&input), 1.0, Interpolator::Hermite6Pt3Ord);
        let mut out = vec![0u8; 10 * SAMPLE_SIZE];
        assert!(shifter.read_bytes(&mut out).is_complete());

        let position = shifter.seek_to(SeekFrom::Start(32 * SAMPLE_SIZE as u64)).unwrap();
        assert_eq!(position, 128);

        let mut out = vec![0u8; 4 * SAMPLE_SIZE];
        assert!(shifter.read_bytes(&mut out).is_complete());
        let decoded: Vec<_> = frames(&out).collect();
        assert_eq!(decoded, input[32..36].to_vec());
    }

    #[test]
    fn test_current_zero_reports_source_position() {
        let shifter = SpeedShifter::with_defaults(pcm(&ramp(64)));
        assert_eq!(shifter.seek_to(SeekFrom::Current(0)).unwrap(), SAMPLE_SIZE as u64);
    }

    #[test]
    #[should_panic(expected = "relative seeks are not supported")]
    fn test_relative_seek_panics() {
        let shifter = SpeedShifter::with_defaults(pcm(&ramp(64)));
        let _ = shifter.seek_to(SeekFrom::Current(8));
    }

    #[test]
    fn test_io_traits() {
        let mut shifter = SpeedShifter::with_defaults(pcm(&ramp(64)));
        let mut buf = [0u8; 8];
        shifter.read_exact(&mut buf).unwrap();
        assert_eq!(frames(&buf).collect::<Vec<_>>(), vec![(0, 0), (100, -100)]);
        assert_eq!(shifter.seek(SeekFrom::End(-16)).unwrap(), 240);
    }
}
