//! # Byte Stream
//!
//! Cursor types the packet codecs read from and write to.
//!
//! ## Design
//!
//! - Every numeric read/write names its byte order explicitly
//! - Reads are bounds-checked and fail with [`ProtocolError::Truncated`]
//! - Writes grow the buffer; a writer can be cleared and reused between packets

use trench_core::{Vec3, VoxelCoord};

use crate::error::{ProtocolError, ProtocolResult};
use crate::text::TextEncoding;

/// Byte order of a multi-byte field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endian {
    /// Least significant byte first. The default for this protocol.
    Little,
    /// Most significant byte first.
    Big,
}

/// Packet writer - appends fields to a growable buffer.
#[derive(Clone, Debug, Default)]
pub struct ByteWriter {
    buffer: Vec<u8>,
}

impl ByteWriter {
    /// Creates an empty writer.
    #[must_use]
    pub const fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Creates a writer with room for `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Resets the writer for reuse.
    #[inline]
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Returns the number of bytes written.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if no bytes have been written.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Returns a slice of the written data.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Consumes the writer and returns the buffer.
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }

    /// Writes a single unsigned byte.
    #[inline]
    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    /// Writes a single signed byte.
    #[inline]
    #[allow(clippy::cast_sign_loss)]
    pub fn write_i8(&mut self, value: i8) {
        self.buffer.push(value as u8);
    }

    /// Writes a boolean as `0` or `1`.
    #[inline]
    pub fn write_bool(&mut self, value: bool) {
        self.buffer.push(u8::from(value));
    }

    /// Writes a u32.
    #[inline]
    pub fn write_u32(&mut self, value: u32, endian: Endian) {
        let bytes = match endian {
            Endian::Little => value.to_le_bytes(),
            Endian::Big => value.to_be_bytes(),
        };
        self.buffer.extend_from_slice(&bytes);
    }

    /// Writes an i32.
    #[inline]
    #[allow(clippy::cast_sign_loss)]
    pub fn write_i32(&mut self, value: i32, endian: Endian) {
        self.write_u32(value as u32, endian);
    }

    /// Writes an IEEE-754 f32.
    #[inline]
    pub fn write_f32(&mut self, value: f32, endian: Endian) {
        self.write_u32(value.to_bits(), endian);
    }

    /// Writes three little-endian f32s.
    pub fn write_vec3(&mut self, value: Vec3) {
        self.write_f32(value.x, Endian::Little);
        self.write_f32(value.y, Endian::Little);
        self.write_f32(value.z, Endian::Little);
    }

    /// Writes three little-endian i32s.
    pub fn write_coord(&mut self, value: VoxelCoord) {
        for axis in value {
            self.write_i32(axis, Endian::Little);
        }
    }

    /// Writes raw bytes.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Writes `count` zero bytes.
    #[inline]
    pub fn pad(&mut self, count: usize) {
        self.buffer.resize(self.buffer.len() + count, 0);
    }

    /// Writes a one-byte length prefix followed by the encoded text.
    ///
    /// # Errors
    ///
    /// Fails if the text cannot be encoded or encodes to more than 255 bytes.
    /// Nothing is written on failure.
    pub fn write_text(&mut self, text: &str, encoding: &dyn TextEncoding) -> ProtocolResult<()> {
        let bytes = encoding.encode(text)?;
        let len = u8::try_from(bytes.len()).map_err(|_| ProtocolError::TextTooLong(bytes.len()))?;
        self.write_u8(len);
        self.write_bytes(&bytes);
        Ok(())
    }
}

/// Packet reader - consumes fields from a borrowed buffer.
#[derive(Clone, Debug)]
pub struct ByteReader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> ByteReader<'a> {
    /// Creates a new reader over a buffer.
    #[must_use]
    pub const fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, position: 0 }
    }

    /// Returns the number of bytes remaining.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    /// Returns the number of bytes consumed so far.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    fn take(&mut self, count: usize) -> ProtocolResult<&'a [u8]> {
        if count > self.remaining() {
            return Err(ProtocolError::Truncated {
                needed: count,
                remaining: self.remaining(),
            });
        }
        let slice = &self.buffer[self.position..self.position + count];
        self.position += count;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> ProtocolResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Reads a single unsigned byte.
    #[inline]
    pub fn read_u8(&mut self) -> ProtocolResult<u8> {
        Ok(self.take_array::<1>()?[0])
    }

    /// Reads a single signed byte.
    #[inline]
    #[allow(clippy::cast_possible_wrap)]
    pub fn read_i8(&mut self) -> ProtocolResult<i8> {
        Ok(self.read_u8()? as i8)
    }

    /// Reads a boolean byte (any non-zero value is `true`).
    #[inline]
    pub fn read_bool(&mut self) -> ProtocolResult<bool> {
        Ok(self.read_u8()? != 0)
    }

    /// Reads a u32.
    #[inline]
    pub fn read_u32(&mut self, endian: Endian) -> ProtocolResult<u32> {
        let bytes = self.take_array::<4>()?;
        Ok(match endian {
            Endian::Little => u32::from_le_bytes(bytes),
            Endian::Big => u32::from_be_bytes(bytes),
        })
    }

    /// Reads an i32.
    #[inline]
    #[allow(clippy::cast_possible_wrap)]
    pub fn read_i32(&mut self, endian: Endian) -> ProtocolResult<i32> {
        Ok(self.read_u32(endian)? as i32)
    }

    /// Reads an IEEE-754 f32.
    #[inline]
    pub fn read_f32(&mut self, endian: Endian) -> ProtocolResult<f32> {
        self.read_u32(endian).map(f32::from_bits)
    }

    /// Reads three little-endian f32s.
    pub fn read_vec3(&mut self) -> ProtocolResult<Vec3> {
        let x = self.read_f32(Endian::Little)?;
        let y = self.read_f32(Endian::Little)?;
        let z = self.read_f32(Endian::Little)?;
        Ok(Vec3::new(x, y, z))
    }

    /// Reads three little-endian i32s.
    pub fn read_coord(&mut self) -> ProtocolResult<VoxelCoord> {
        let x = self.read_i32(Endian::Little)?;
        let y = self.read_i32(Endian::Little)?;
        let z = self.read_i32(Endian::Little)?;
        Ok([x, y, z])
    }

    /// Skips `count` bytes without looking at them.
    pub fn skip(&mut self, count: usize) -> ProtocolResult<()> {
        self.take(count).map(|_| ())
    }

    /// Reads a block of `count` raw bytes.
    pub fn read_bytes(&mut self, count: usize) -> ProtocolResult<&'a [u8]> {
        self.take(count)
    }

    /// Reads everything left in the buffer.
    pub fn read_rest(&mut self) -> &'a [u8] {
        let rest = &self.buffer[self.position.min(self.buffer.len())..];
        self.position = self.buffer.len();
        rest
    }

    /// Reads a one-byte length prefix followed by that much encoded text.
    pub fn read_text(&mut self, encoding: &dyn TextEncoding) -> ProtocolResult<String> {
        let len = self.read_u8()?;
        let bytes = self.take(usize::from(len))?;
        Ok(encoding.decode(bytes))
    }
}
