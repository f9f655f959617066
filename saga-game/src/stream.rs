//! Binary save-stream primitives.
//!
//! Values are written in a fixed order with no tags or versioning. Integers
//! take four bytes in the stream's byte order and sequences carry a `u32`
//! length prefix followed by their elements.

use std::io::{self, Cursor, Read, Write};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on decoded sequence lengths.
pub const MAX_SEQUENCE_LEN: u32 = 1 << 20;

/// Byte order used for every multi-byte value in a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    /// Most significant byte first. Save files use this order.
    #[default]
    Big,
    /// Least significant byte first.
    Little,
}

/// Errors raised while reading or writing a save stream.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("stream I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("sequence length {len} exceeds limit {max}")]
    SequenceTooLong { len: u64, max: u32 },
    #[error("invalid {field} value {value}")]
    InvalidValue { field: &'static str, value: i32 },
}

impl StreamError {
    /// Whether the stream ended before a value was complete.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::Io(err) if err.kind() == io::ErrorKind::UnexpectedEof)
    }
}

/// A value with a fixed binary layout.
pub trait Encode {
    /// Append this value to the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying writer fails or a sequence is too long.
    fn encode<W: Write>(&self, out: &mut StreamWriter<W>) -> Result<(), StreamError>;
}

/// A value that can be read back from its binary layout.
pub trait Decode: Sized {
    /// Read the next value from the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is truncated or holds an invalid value.
    fn decode<R: Read>(input: &mut StreamReader<R>) -> Result<Self, StreamError>;
}

/// Sequential writer over any [`Write`] sink.
#[derive(Debug)]
pub struct StreamWriter<W> {
    inner: W,
    order: ByteOrder,
}

impl<W: Write> StreamWriter<W> {
    pub const fn new(inner: W, order: ByteOrder) -> Self {
        Self { inner, order }
    }

    #[must_use]
    pub const fn order(&self) -> ByteOrder {
        self.order
    }

    /// Write a single value, returning the writer for chaining.
    ///
    /// # Errors
    ///
    /// Propagates the value's encoding error.
    pub fn write<T: Encode + ?Sized>(&mut self, value: &T) -> Result<&mut Self, StreamError> {
        value.encode(self)?;
        Ok(self)
    }

    /// # Errors
    ///
    /// Returns an error if the underlying writer fails.
    pub fn write_u32(&mut self, value: u32) -> Result<(), StreamError> {
        let bytes = match self.order {
            ByteOrder::Big => value.to_be_bytes(),
            ByteOrder::Little => value.to_le_bytes(),
        };
        self.inner.write_all(&bytes)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the underlying writer fails.
    pub fn write_i32(&mut self, value: i32) -> Result<(), StreamError> {
        let bytes = match self.order {
            ByteOrder::Big => value.to_be_bytes(),
            ByteOrder::Little => value.to_le_bytes(),
        };
        self.inner.write_all(&bytes)?;
        Ok(())
    }

    /// Flush and hand back the sink.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    pub fn finish(mut self) -> Result<W, StreamError> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// Sequential reader over any [`Read`] source.
#[derive(Debug)]
pub struct StreamReader<R> {
    inner: R,
    order: ByteOrder,
}

impl<R: Read> StreamReader<R> {
    pub const fn new(inner: R, order: ByteOrder) -> Self {
        Self { inner, order }
    }

    #[must_use]
    pub const fn order(&self) -> ByteOrder {
        self.order
    }

    /// Read the next value of type `T`.
    ///
    /// # Errors
    ///
    /// Propagates the value's decoding error.
    pub fn read<T: Decode>(&mut self) -> Result<T, StreamError> {
        T::decode(self)
    }

    fn read_word(&mut self) -> Result<[u8; 4], StreamError> {
        let mut buf = [0u8; 4];
        self.inner.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// # Errors
    ///
    /// Returns an error if fewer than four bytes remain.
    pub fn read_u32(&mut self) -> Result<u32, StreamError> {
        let buf = self.read_word()?;
        Ok(match self.order {
            ByteOrder::Big => u32::from_be_bytes(buf),
            ByteOrder::Little => u32::from_le_bytes(buf),
        })
    }

    /// # Errors
    ///
    /// Returns an error if fewer than four bytes remain.
    pub fn read_i32(&mut self) -> Result<i32, StreamError> {
        let buf = self.read_word()?;
        Ok(match self.order {
            ByteOrder::Big => i32::from_be_bytes(buf),
            ByteOrder::Little => i32::from_le_bytes(buf),
        })
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl Encode for i32 {
    fn encode<W: Write>(&self, out: &mut StreamWriter<W>) -> Result<(), StreamError> {
        out.write_i32(*self)
    }
}

impl Decode for i32 {
    fn decode<R: Read>(input: &mut StreamReader<R>) -> Result<Self, StreamError> {
        input.read_i32()
    }
}

impl Encode for u32 {
    fn encode<W: Write>(&self, out: &mut StreamWriter<W>) -> Result<(), StreamError> {
        out.write_u32(*self)
    }
}

impl Decode for u32 {
    fn decode<R: Read>(input: &mut StreamReader<R>) -> Result<Self, StreamError> {
        input.read_u32()
    }
}

impl<T: Encode> Encode for [T] {
    fn encode<W: Write>(&self, out: &mut StreamWriter<W>) -> Result<(), StreamError> {
        let len = u32::try_from(self.len())
            .ok()
            .filter(|len| *len <= MAX_SEQUENCE_LEN)
            .ok_or(StreamError::SequenceTooLong {
                len: self.len() as u64,
                max: MAX_SEQUENCE_LEN,
            })?;
        out.write_u32(len)?;
        for item in self {
            item.encode(out)?;
        }
        Ok(())
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode<W: Write>(&self, out: &mut StreamWriter<W>) -> Result<(), StreamError> {
        self.as_slice().encode(out)
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode<R: Read>(input: &mut StreamReader<R>) -> Result<Self, StreamError> {
        let len = input.read_u32()?;
        if len > MAX_SEQUENCE_LEN {
            return Err(StreamError::SequenceTooLong {
                len: u64::from(len),
                max: MAX_SEQUENCE_LEN,
            });
        }
        // The length prefix is untrusted; cap the up-front reservation.
        let mut items = Self::with_capacity(len.min(256) as usize);
        for _ in 0..len {
            items.push(T::decode(input)?);
        }
        Ok(items)
    }
}

/// Encode a value into a fresh byte buffer.
///
/// # Errors
///
/// Returns an error if the value cannot be encoded.
pub fn to_bytes<T: Encode + ?Sized>(value: &T, order: ByteOrder) -> Result<Vec<u8>, StreamError> {
    let mut writer = StreamWriter::new(Vec::new(), order);
    writer.write(value)?;
    writer.finish()
}

/// Decode a value from the front of `bytes`. Trailing bytes are ignored.
///
/// # Errors
///
/// Returns an error if `bytes` is truncated or holds an invalid value.
pub fn from_bytes<T: Decode>(bytes: &[u8], order: ByteOrder) -> Result<T, StreamError> {
    StreamReader::new(Cursor::new(bytes), order).read()
}
