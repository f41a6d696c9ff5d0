//! Byte-order aware integer extraction from a raw buffer.
//!
//! Every multi-byte field in the decoder goes through [`decode_int`], which
//! bounds-checks the `(offset, width)` pair before touching the buffer.

use byteorder::{BigEndian, LittleEndian};

use crate::error::{DecodeError, DecodeResult};
use crate::ident::FileClass;

/// Byte order declared by the file's identification block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    /// Byte order of the machine running the decoder.
    pub const HOST: ByteOrder = if cfg!(target_endian = "little") {
        ByteOrder::Little
    } else {
        ByteOrder::Big
    };

    pub fn opposite(self) -> ByteOrder {
        match self {
            ByteOrder::Little => ByteOrder::Big,
            ByteOrder::Big => ByteOrder::Little,
        }
    }
}

/// Fixed-width unsigned integer that can be pulled out of a byte slice.
pub trait Word: Copy {
    const WIDTH: usize;

    /// `bytes` is exactly `WIDTH` long.
    fn read<E: byteorder::ByteOrder>(bytes: &[u8]) -> Self;
}

impl Word for u16 {
    const WIDTH: usize = 2;

    fn read<E: byteorder::ByteOrder>(bytes: &[u8]) -> Self {
        E::read_u16(bytes)
    }
}

impl Word for u32 {
    const WIDTH: usize = 4;

    fn read<E: byteorder::ByteOrder>(bytes: &[u8]) -> Self {
        E::read_u32(bytes)
    }
}

impl Word for u64 {
    const WIDTH: usize = 8;

    fn read<E: byteorder::ByteOrder>(bytes: &[u8]) -> Self {
        E::read_u64(bytes)
    }
}

/// Reads a `T` at `offset` in `buf`, interpreting it with `order`.
///
/// # Errors
///
/// Returns [`DecodeError::OutOfBounds`] if `offset + size_of::<T>()` runs past
/// the end of `buf`.
pub fn decode_int<T: Word>(buf: &[u8], offset: usize, order: ByteOrder) -> DecodeResult<T> {
    let end = offset
        .checked_add(T::WIDTH)
        .filter(|&end| end <= buf.len())
        .ok_or(DecodeError::OutOfBounds {
            offset: offset as u64,
            width: T::WIDTH as u64,
            len: buf.len(),
        })?;
    let bytes = &buf[offset..end];

    Ok(match order {
        ByteOrder::Little => T::read::<LittleEndian>(bytes),
        ByteOrder::Big => T::read::<BigEndian>(bytes),
    })
}

/// Field reader bound to one buffer and the identity's class and byte order.
///
/// Offsets passed to its methods are relative to `base`, which lets table
/// entries be decoded with the same per-field offsets whatever slot they sit in.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FieldReader<'a> {
    buf: &'a [u8],
    base: usize,
    class: FileClass,
    order: ByteOrder,
}

impl<'a> FieldReader<'a> {
    pub(crate) fn new(buf: &'a [u8], class: FileClass, order: ByteOrder) -> Self {
        Self {
            buf,
            base: 0,
            class,
            order,
        }
    }

    pub(crate) fn at(self, base: usize) -> Self {
        Self { base, ..self }
    }

    /// Absolute offset of a field. Overflow reports the entry base with a
    /// zero width, since no field of the entry can be addressed.
    fn offset(&self, rel: usize) -> DecodeResult<usize> {
        self.base
            .checked_add(rel)
            .ok_or(DecodeError::OutOfBounds {
                offset: self.base as u64,
                width: 0,
                len: self.buf.len(),
            })
    }

    pub(crate) fn u16(&self, rel: usize) -> DecodeResult<u16> {
        decode_int(self.buf, self.offset(rel)?, self.order)
    }

    pub(crate) fn u32(&self, rel: usize) -> DecodeResult<u32> {
        decode_int(self.buf, self.offset(rel)?, self.order)
    }

    pub(crate) fn u64(&self, rel: usize) -> DecodeResult<u64> {
        decode_int(self.buf, self.offset(rel)?, self.order)
    }

    /// Address/offset sized field: 4 bytes for `Bits32`, 8 for `Bits64`,
    /// always widened to `u64`.
    pub(crate) fn word(&self, rel: usize) -> DecodeResult<u64> {
        match self.class {
            FileClass::Bits32 => self.u32(rel).map(u64::from),
            FileClass::Bits64 => self.u64(rel),
        }
    }
}
