use thiserror::Error;

/// Failure produced by any stage of the decoding pipeline.
///
/// Structural violations (truncation, bad magic, out-of-bounds offsets) are
/// always returned. `UnknownFileType` and `UnknownMachine` only surface when
/// the caller asks for strict decoding; otherwise those values are kept as
/// `Unknown(raw)` in the decoded records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("buffer truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("bad ELF magic {0:02x?}")]
    BadMagic([u8; 4]),

    #[error("unknown file class {0}")]
    UnknownClass(u8),

    #[error("unknown byte order {0}")]
    UnknownByteOrder(u8),

    #[error("unknown OS/ABI {0:#04x}")]
    UnknownAbi(u8),

    #[error("read of {width} bytes at offset {offset:#x} exceeds buffer length {len:#x}")]
    OutOfBounds { offset: u64, width: u64, len: usize },

    #[error("unknown file type {0:#06x}")]
    UnknownFileType(u16),

    #[error("unknown machine {0:#06x}")]
    UnknownMachine(u16),
}

/// Category of a [`DecodeError`], without the diagnostic payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Truncated,
    BadMagic,
    UnknownClass,
    UnknownByteOrder,
    UnknownAbi,
    OutOfBounds,
    UnknownFileType,
    UnknownMachine,
}

impl DecodeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DecodeError::Truncated { .. } => ErrorKind::Truncated,
            DecodeError::BadMagic(_) => ErrorKind::BadMagic,
            DecodeError::UnknownClass(_) => ErrorKind::UnknownClass,
            DecodeError::UnknownByteOrder(_) => ErrorKind::UnknownByteOrder,
            DecodeError::UnknownAbi(_) => ErrorKind::UnknownAbi,
            DecodeError::OutOfBounds { .. } => ErrorKind::OutOfBounds,
            DecodeError::UnknownFileType(_) => ErrorKind::UnknownFileType,
            DecodeError::UnknownMachine(_) => ErrorKind::UnknownMachine,
        }
    }

    /// Fails with `Truncated` unless `buf` holds at least `needed` bytes.
    pub(crate) fn require_len(buf: &[u8], needed: usize) -> Result<(), DecodeError> {
        if buf.len() < needed {
            return Err(DecodeError::Truncated {
                needed,
                available: buf.len(),
            });
        }
        Ok(())
    }
}

pub type DecodeResult<T> = Result<T, DecodeError>;
