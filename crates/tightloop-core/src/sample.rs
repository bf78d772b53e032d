//! L16 stereo sample codec.
//!
//! A sample is a `(left, right)` pair of signed 16-bit values stored as four
//! consecutive little-endian bytes. Every stream position, loop point and
//! buffer length handled by tightloop is a multiple of [`SAMPLE_SIZE`].
//!
//! Normalization is asymmetric, following the signed 16-bit range: positive
//! values are divided by 32767 and negative values by 32768, so both `1.0`
//! and `-1.0` map to exact endpoints.

/// Bytes per stereo L16 sample.
pub const SAMPLE_SIZE: usize = 4;

const POS_SCALE: f64 = 32767.0;
const NEG_SCALE: f64 = 32768.0;

/// Whether a byte offset falls on a sample boundary.
#[inline]
pub fn is_aligned(offset: u64) -> bool {
    offset & 0b11 == 0
}

/// Round a byte length down to a whole number of samples.
#[inline]
pub fn align_down(len: usize) -> usize {
    len & !0b11
}

/// Decode the first sample of `buffer` as `(left, right)` in `[-32768, 32767]`.
///
/// # Panics
///
/// Panics if `buffer` holds fewer than [`SAMPLE_SIZE`] bytes.
#[inline]
pub fn decode_i16(buffer: &[u8]) -> (i16, i16) {
    assert!(
        buffer.len() >= SAMPLE_SIZE,
        "decode_i16 needs {} bytes, got {}",
        SAMPLE_SIZE,
        buffer.len()
    );
    let left = i16::from_le_bytes([buffer[0], buffer[1]]);
    let right = i16::from_le_bytes([buffer[2], buffer[3]]);
    (left, right)
}

/// Decode the first sample of `buffer` as normalized `(left, right)` in `[-1, 1]`.
///
/// # Panics
///
/// Panics if `buffer` holds fewer than [`SAMPLE_SIZE`] bytes.
#[inline]
pub fn decode_f64(buffer: &[u8]) -> (f64, f64) {
    let (left, right) = decode_i16(buffer);
    (normalize(left as f64), normalize(right as f64))
}

/// Map a value from `[-32768, 32767]` to `[-1, 1]`, clipping outside the range.
#[inline]
pub fn normalize(value: f64) -> f64 {
    if value >= POS_SCALE {
        1.0
    } else if value >= 0.0 {
        value / POS_SCALE
    } else if value > -NEG_SCALE {
        value / NEG_SCALE
    } else {
        -1.0
    }
}

/// Map a normalized value back to 16 bits, clipping outside `[-1, 1]`.
///
/// Scales by 32767 for positive and 32768 for negative input, truncating
/// toward zero.
#[inline]
pub fn denormalize(value: f64) -> i16 {
    if value >= 1.0 {
        i16::MAX
    } else if value >= 0.0 {
        (value * POS_SCALE) as i16
    } else if value > -1.0 {
        (value * NEG_SCALE) as i16
    } else {
        i16::MIN
    }
}

/// Clip an unnormalized value to the 16-bit range, truncating toward zero.
#[inline]
pub fn clip_to_i16(value: f64) -> i16 {
    if value >= POS_SCALE {
        return i16::MAX;
    }
    if value <= -NEG_SCALE {
        return i16::MIN;
    }
    value as i16
}

/// Store `(left, right)` as the first sample of `buffer`.
///
/// # Panics
///
/// Panics if `buffer` holds fewer than [`SAMPLE_SIZE`] bytes.
#[inline]
pub fn encode_i16(buffer: &mut [u8], left: i16, right: i16) {
    assert!(
        buffer.len() >= SAMPLE_SIZE,
        "encode_i16 needs {} bytes, got {}",
        SAMPLE_SIZE,
        buffer.len()
    );
    buffer[0..2].copy_from_slice(&left.to_le_bytes());
    buffer[2..4].copy_from_slice(&right.to_le_bytes());
}

/// Store unnormalized `(left, right)` values, clipping to the 16-bit range.
///
/// # Panics
///
/// Panics if `buffer` holds fewer than [`SAMPLE_SIZE`] bytes.
#[inline]
pub fn encode_f64(buffer: &mut [u8], left: f64, right: f64) {
    encode_i16(buffer, clip_to_i16(left), clip_to_i16(right));
}

/// Store normalized `(left, right)` values, clipping to `[-1, 1]`.
///
/// # Panics
///
/// Panics if `buffer` holds fewer than [`SAMPLE_SIZE`] bytes.
#[inline]
pub fn encode_norm_f64(buffer: &mut [u8], left: f64, right: f64) {
    encode_i16(buffer, denormalize(left), denormalize(right));
}

/// Iterate over the whole samples in `bytes`. A trailing partial sample is ignored.
pub fn frames(bytes: &[u8]) -> impl Iterator<Item = (i16, i16)> + '_ {
    bytes.chunks_exact(SAMPLE_SIZE).map(decode_i16)
}
