//! Binary encoding of Avro primitives.
//!
//! Integers are zigzag varints, floats are little-endian IEEE 754, and bytes
//! and strings are a long length followed by the raw bytes.

use std::io::{self, Read, Write};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("varint does not fit in {width} bits")]
    VarintOverflow { width: u32 },

    #[error("invalid boolean byte {0:#04x}")]
    InvalidBoolean(u8),

    #[error("negative length {0}")]
    NegativeLength(i64),

    #[error("string is not valid UTF-8")]
    InvalidUtf8,

    #[error(transparent)]
    Io(io::Error),
}

impl From<io::Error> for DecodeError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => DecodeError::UnexpectedEof,
            _ => DecodeError::Io(err),
        }
    }
}

fn read_byte<R: Read + ?Sized>(r: &mut R) -> Result<u8, DecodeError> {
    let mut byte = [0u8; 1];
    r.read_exact(&mut byte)?;
    Ok(byte[0])
}

/// Read a base-128 varint of at most `max_bytes` bytes that must fit in `width` bits.
fn read_varint<R: Read + ?Sized>(r: &mut R, max_bytes: u32, width: u32) -> Result<u64, DecodeError> {
    let mut value = 0u64;
    for i in 0..max_bytes {
        let byte = read_byte(r)?;
        let bits = u64::from(byte & 0x7f);
        let shift = 7 * i;
        if (bits << shift) >> shift != bits {
            return Err(DecodeError::VarintOverflow { width });
        }
        value |= bits << shift;
        if byte & 0x80 == 0 {
            if width < 64 && value >> width != 0 {
                return Err(DecodeError::VarintOverflow { width });
            }
            return Ok(value);
        }
    }
    Err(DecodeError::VarintOverflow { width })
}

pub fn read_boolean<R: Read + ?Sized>(r: &mut R) -> Result<bool, DecodeError> {
    match read_byte(r)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(DecodeError::InvalidBoolean(other)),
    }
}

pub fn read_int<R: Read + ?Sized>(r: &mut R) -> Result<i32, DecodeError> {
    let n = read_varint(r, 5, 32)? as u32;
    Ok((n >> 1) as i32 ^ -((n & 1) as i32))
}

pub fn read_long<R: Read + ?Sized>(r: &mut R) -> Result<i64, DecodeError> {
    let n = read_varint(r, 10, 64)?;
    Ok((n >> 1) as i64 ^ -((n & 1) as i64))
}

pub fn read_float<R: Read + ?Sized>(r: &mut R) -> Result<f32, DecodeError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(f32::from_le_bytes(buf))
}

pub fn read_double<R: Read + ?Sized>(r: &mut R) -> Result<f64, DecodeError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(f64::from_le_bytes(buf))
}

/// Read exactly `len` bytes.
///
/// The buffer grows with the data actually read, so a corrupt length cannot
/// force a huge allocation up front.
pub fn read_fixed<R: Read + ?Sized>(r: &mut R, len: usize) -> Result<Vec<u8>, DecodeError> {
    let mut buf = Vec::new();
    r.take(len as u64).read_to_end(&mut buf)?;
    if buf.len() != len {
        return Err(DecodeError::UnexpectedEof);
    }
    Ok(buf)
}

pub fn read_bytes<R: Read + ?Sized>(r: &mut R) -> Result<Vec<u8>, DecodeError> {
    let len = read_long(r)?;
    let len = usize::try_from(len).map_err(|_| DecodeError::NegativeLength(len))?;
    read_fixed(r, len)
}

pub fn read_string<R: Read + ?Sized>(r: &mut R) -> Result<String, DecodeError> {
    String::from_utf8(read_bytes(r)?).map_err(|_| DecodeError::InvalidUtf8)
}

fn write_varint<W: Write + ?Sized>(w: &mut W, mut n: u64) -> io::Result<()> {
    let mut buf = [0u8; 10];
    let mut len = 0;
    loop {
        let byte = (n & 0x7f) as u8;
        n >>= 7;
        if n == 0 {
            buf[len] = byte;
            len += 1;
            break;
        }
        buf[len] = byte | 0x80;
        len += 1;
    }
    w.write_all(&buf[..len])
}

pub fn write_boolean<W: Write + ?Sized>(w: &mut W, value: bool) -> io::Result<()> {
    w.write_all(&[u8::from(value)])
}

pub fn write_int<W: Write + ?Sized>(w: &mut W, value: i32) -> io::Result<()> {
    write_varint(w, u64::from(((value << 1) ^ (value >> 31)) as u32))
}

pub fn write_long<W: Write + ?Sized>(w: &mut W, value: i64) -> io::Result<()> {
    write_varint(w, ((value << 1) ^ (value >> 63)) as u64)
}

pub fn write_float<W: Write + ?Sized>(w: &mut W, value: f32) -> io::Result<()> {
    w.write_all(&value.to_le_bytes())
}

pub fn write_double<W: Write + ?Sized>(w: &mut W, value: f64) -> io::Result<()> {
    w.write_all(&value.to_le_bytes())
}

pub fn write_bytes<W: Write + ?Sized>(w: &mut W, value: &[u8]) -> io::Result<()> {
    write_long(w, value.len() as i64)?;
    w.write_all(value)
}

pub fn write_string<W: Write + ?Sized>(w: &mut W, value: &str) -> io::Result<()> {
    write_bytes(w, value.as_bytes())
}

#[cfg(test)]
#[path = "codec_test.rs"]
mod codec_test;
