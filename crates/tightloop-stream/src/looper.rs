//! Tight looper: transparent loop playback over a seekable L16 stream.
//!
//! No blending happens at the loop point, so the source needs no padding
//! past the loop end. Loop points can be moved at any time, including while
//! a read is in flight on another thread.
//!
//! The looper keeps two loop ends: the configured one and the *active* one
//! honored by the pass currently being played. They only differ after the
//! loop end was moved behind the playback position; the current pass then
//! finishes at the old end, and the new loop takes over at the next wrap.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::io::{self, Read, Seek, SeekFrom};
use tightloop_core::sample::is_aligned;
use tightloop_core::{Error, Result};
use tracing::{debug, trace};

use crate::source::{read_full, ReadOutcome, StreamLength};

/// Loop window in bytes. `end` is excluded from the loop.
///
/// Both points are multiples of 4 and `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawLoopRange")]
pub struct LoopRange {
    start: u64,
    end: u64,
}

#[derive(Deserialize)]
struct RawLoopRange {
    start: u64,
    end: u64,
}

impl TryFrom<RawLoopRange> for LoopRange {
    type Error = Error;

    fn try_from(raw: RawLoopRange) -> Result<Self> {
        LoopRange::new(raw.start, raw.end)
    }
}

impl LoopRange {
    pub fn new(start: u64, end: u64) -> Result<Self> {
        if !is_aligned(start) || !is_aligned(end) || start >= end {
            return Err(Error::InvalidLoopRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Loop over a whole stream of `len` bytes (a trailing partial sample is left out).
    pub fn whole(len: u64) -> Result<Self> {
        let end = len & !0b11;
        Self::new(0, end)
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn contains(&self, position: u64) -> bool {
        position >= self.start && position < self.end
    }
}

struct LooperState<S> {
    source: S,
    position: u64,
    range: LoopRange,
    active_loop_end: u64,
    /// Error held back by an `io::Read` call that had already delivered bytes.
    deferred_error: Option<Error>,
}

impl<S: Read + Seek> LooperState<S> {
    fn read(&mut self, buffer: &mut [u8]) -> ReadOutcome {
        let mut filled = 0;
        while filled < buffer.len() {
            let remaining = buffer.len() - filled;
            let until_next_loop = self.active_loop_end.saturating_sub(self.position);

            // Not reaching the loop end during this read
            if remaining as u64 <= until_next_loop {
                let outcome = self.read_chunk(&mut buffer[filled..]);
                return ReadOutcome {
                    bytes: filled + outcome.bytes,
                    status: outcome.status,
                };
            }

            if until_next_loop > 0 {
                let end = filled + until_next_loop as usize;
                let outcome = self.read_chunk(&mut buffer[filled..end]);
                filled += outcome.bytes;
                if let Err(err) = outcome.status {
                    return ReadOutcome::stopped(filled, err);
                }
            }

            if let Err(err) = self.wrap() {
                return ReadOutcome::stopped(filled, err);
            }
        }
        ReadOutcome::complete(filled)
    }

    fn read_chunk(&mut self, buffer: &mut [u8]) -> ReadOutcome {
        let outcome = read_full(&mut self.source, buffer);
        self.position += outcome.bytes as u64;
        outcome
    }

    fn wrap(&mut self) -> Result<()> {
        self.active_loop_end = self.range.end;
        self.position = self.source.seek(SeekFrom::Start(self.range.start))?;
        trace!(
            loop_start = self.range.start,
            loop_end = self.range.end,
            "looper wrapped"
        );
        Ok(())
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let position = self.source.seek(pos)?;
        self.position = position;
        if position <= self.range.end {
            self.active_loop_end = self.range.end;
        }
        debug!(position, active_loop_end = self.active_loop_end, "looper seek");
        Ok(position)
    }
}

impl<S> LooperState<S> {
    fn set_range(&mut self, range: LoopRange) {
        self.range = range;
        if range.end >= self.position {
            self.active_loop_end = range.end;
        }
        debug!(
            loop_start = range.start,
            loop_end = range.end,
            position = self.position,
            active_loop_end = self.active_loop_end,
            "loop adjusted"
        );
    }
}

/// Thread-safe tight looper over an L16 little-endian stereo stream.
///
/// Every public operation holds the instance lock for its full duration,
/// so a read that crosses the loop end (read, seek to start, keep reading)
/// is atomic with respect to [`Looper::adjust_loop`] and [`Looper::seek_to`].
///
/// Playback starts at position 0 of the source, which is assumed to be
/// positioned there. Anything before the loop start plays once as an intro.
pub struct Looper<S> {
    state: Mutex<LooperState<S>>,
}

impl<S> Looper<S> {
    /// Create a looper over `[loop_start, loop_end)`, in bytes.
    ///
    /// To loop a whole stream use [`Looper::whole`].
    ///
    /// # Panics
    ///
    /// Panics if either point is not a multiple of 4 or if `loop_start >= loop_end`.
    pub fn new(source: S, loop_start: u64, loop_end: u64) -> Self {
        Self::with_range(source, checked_range(loop_start, loop_end))
    }

    pub fn with_range(source: S, range: LoopRange) -> Self {
        Self {
            state: Mutex::new(LooperState {
                source,
                position: 0,
                range,
                active_loop_end: range.end,
                deferred_error: None,
            }),
        }
    }

    /// Current playback position in bytes, always a multiple of 4.
    pub fn position(&self) -> u64 {
        self.state.lock().position
    }

    pub fn loop_start(&self) -> u64 {
        self.state.lock().range.start
    }

    pub fn loop_end(&self) -> u64 {
        self.state.lock().range.end
    }

    /// `(loop_start, loop_end)` read under a single lock.
    pub fn loop_points(&self) -> (u64, u64) {
        let range = self.state.lock().range;
        (range.start, range.end)
    }

    pub fn loop_range(&self) -> LoopRange {
        self.state.lock().range
    }

    /// Loop end honored by the pass currently playing.
    pub fn active_loop_end(&self) -> u64 {
        self.state.lock().active_loop_end
    }

    /// Move the loop points.
    ///
    /// If the new end is already behind the playback position, the current
    /// pass keeps playing until the previous end and the new loop applies
    /// from the next wrap. Otherwise it applies immediately.
    ///
    /// # Panics
    ///
    /// Panics if either point is not a multiple of 4 or if `loop_start >= loop_end`.
    pub fn adjust_loop(&self, loop_start: u64, loop_end: u64) {
        self.set_loop_range(checked_range(loop_start, loop_end));
    }

    /// Like [`Looper::adjust_loop`], for an already validated range.
    pub fn set_loop_range(&self, range: LoopRange) {
        self.state.lock().set_range(range);
    }

    pub fn into_inner(self) -> S {
        self.state.into_inner().source
    }
}

impl<S: Read + Seek> Looper<S> {
    /// Fill `buffer`, wrapping to the loop start as many times as needed.
    ///
    /// Stops early only when the source ends or fails; the outcome reports
    /// exactly how many bytes were written.
    pub fn read_bytes(&self, buffer: &mut [u8]) -> ReadOutcome {
        self.state.lock().read(buffer)
    }

    /// Seek the underlying source directly.
    ///
    /// Landing at or before the configured loop end resynchronizes the active
    /// loop end. Keeping the target inside the intended loop is up to the caller.
    pub fn seek_to(&self, pos: SeekFrom) -> Result<u64> {
        self.state.lock().seek(pos)
    }

    /// `io::Read` entry point: a source error that cut a read short is
    /// returned by the following call.
    pub(crate) fn read_io(&self, buffer: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state.lock();
        if let Some(err) = state.deferred_error.take() {
            return Err(err.into());
        }
        let outcome = state.read(buffer);
        outcome.into_io(&mut state.deferred_error)
    }
}

impl<S: StreamLength> Looper<S> {
    /// Loop an entire stream, using its length at construction time.
    pub fn whole(source: S) -> Result<Self> {
        let range = LoopRange::whole(source.byte_len())?;
        Ok(Self::with_range(source, range))
    }

    /// Length of the underlying stream in bytes.
    pub fn length(&self) -> u64 {
        self.state.lock().source.byte_len()
    }
}

impl<S: StreamLength> StreamLength for Looper<S> {
    fn byte_len(&self) -> u64 {
        self.length()
    }
}

impl<S: Read + Seek> Read for Looper<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_io(buf)
    }
}

impl<S: Read + Seek> Read for &Looper<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_io(buf)
    }
}

impl<S: Read + Seek> Seek for Looper<S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Ok(self.seek_to(pos)?)
    }
}

impl<S: Read + Seek> Seek for &Looper<S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Ok(self.seek_to(pos)?)
    }
}

fn checked_range(loop_start: u64, loop_end: u64) -> LoopRange {
    match LoopRange::new(loop_start, loop_end) {
        Ok(range) => range,
        Err(err) => panic!("{err} (points must be multiples of 4 with start < end)"),
    }
}
