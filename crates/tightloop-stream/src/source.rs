//! Byte-source capabilities consumed and produced by the stream components.
//!
//! Sources are plain [`std::io::Read`] (and [`std::io::Seek`]) implementors.
//! Knowing the total length is an explicit opt-in capability, [`StreamLength`].

use std::io::{self, Cursor, Read};
use tightloop_core::{Error, Result};

/// Sources that know their total length in bytes.
pub trait StreamLength {
    fn byte_len(&self) -> u64;
}

impl<T: AsRef<[u8]>> StreamLength for Cursor<T> {
    fn byte_len(&self) -> u64 {
        self.get_ref().as_ref().len() as u64
    }
}

impl<T: StreamLength + ?Sized> StreamLength for &mut T {
    fn byte_len(&self) -> u64 {
        (**self).byte_len()
    }
}

impl<T: StreamLength + ?Sized> StreamLength for Box<T> {
    fn byte_len(&self) -> u64 {
        (**self).byte_len()
    }
}

/// Bytes delivered by a read, plus the condition that cut it short (if any).
///
/// `bytes` is exact even when `status` is an error: everything counted was
/// written to the caller's buffer.
#[derive(Debug)]
#[must_use]
pub struct ReadOutcome {
    pub bytes: usize,
    pub status: Result<()>,
}

impl ReadOutcome {
    pub fn complete(bytes: usize) -> Self {
        Self {
            bytes,
            status: Ok(()),
        }
    }

    pub fn stopped(bytes: usize, err: Error) -> Self {
        Self {
            bytes,
            status: Err(err),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status.is_ok()
    }

    pub fn is_end_of_stream(&self) -> bool {
        matches!(self.status, Err(Error::EndOfStream))
    }

    pub fn into_parts(self) -> (usize, Result<()>) {
        (self.bytes, self.status)
    }

    /// Collapse into the `io::Read` convention.
    ///
    /// Delivered bytes win over an error. The error is then parked in
    /// `deferred` and must be returned by the caller's next `read`. End of
    /// stream is not parked (the source reports it again); with nothing
    /// delivered it becomes `Ok(0)`.
    pub fn into_io(self, deferred: &mut Option<Error>) -> io::Result<usize> {
        match self.status {
            Ok(()) => Ok(self.bytes),
            Err(Error::EndOfStream) => Ok(self.bytes),
            Err(err) if self.bytes > 0 => {
                *deferred = Some(err);
                Ok(self.bytes)
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Read until `buffer` is full, the source ends, or it fails.
///
/// Short reads are retried, as are `Interrupted` errors. Any other error is
/// returned as-is alongside the bytes already read.
pub(crate) fn read_full<R: Read + ?Sized>(source: &mut R, buffer: &mut [u8]) -> ReadOutcome {
    let mut filled = 0;
    while filled < buffer.len() {
        match source.read(&mut buffer[filled..]) {
            Ok(0) => return ReadOutcome::stopped(filled, Error::EndOfStream),
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return ReadOutcome::stopped(filled, Error::Io(err)),
        }
    }
    ReadOutcome::complete(filled)
}

/// Single read against the source, retrying only on `Interrupted`.
pub(crate) fn read_once<R: Read + ?Sized>(source: &mut R, buffer: &mut [u8]) -> ReadOutcome {
    loop {
        match source.read(buffer) {
            Ok(0) if !buffer.is_empty() => return ReadOutcome::stopped(0, Error::EndOfStream),
            Ok(n) => return ReadOutcome::complete(n),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return ReadOutcome::stopped(0, Error::Io(err)),
        }
    }
}
