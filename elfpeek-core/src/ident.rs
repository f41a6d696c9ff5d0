//! Identification block (`e_ident`) validation.

use std::fmt;

use goblin::elf::header::{ELFCLASS32, ELFCLASS64, ELFDATA2LSB, ELFDATA2MSB, ELFMAG};

use crate::endian::ByteOrder;
use crate::error::{DecodeError, DecodeResult};
use crate::DecodeOptions;

/// Length of the identification block at the start of every ELF file.
pub const IDENT_SIZE: usize = 16;

const EI_CLASS: usize = 4;
const EI_DATA: usize = 5;
const EI_VERSION: usize = 6;
const EI_OSABI: usize = 7;

const ELFOSABI_SYSV: u8 = 0;

/// Width of addresses and offsets in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileClass {
    Bits32,
    Bits64,
}

impl FileClass {
    /// Size in bytes of an address-width field.
    pub fn word_size(self) -> usize {
        match self {
            FileClass::Bits32 => 4,
            FileClass::Bits64 => 8,
        }
    }
}

impl fmt::Display for FileClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileClass::Bits32 => write!(f, "ELF32"),
            FileClass::Bits64 => write!(f, "ELF64"),
        }
    }
}

/// OS/ABI byte of the identification block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsAbi {
    Sysv,
    /// Only produced when [`DecodeOptions::allow_foreign_abi`] is set.
    Other(u8),
}

impl OsAbi {
    pub fn raw(self) -> u8 {
        match self {
            OsAbi::Sysv => ELFOSABI_SYSV,
            OsAbi::Other(raw) => raw,
        }
    }
}

impl fmt::Display for OsAbi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsAbi::Sysv => write!(f, "UNIX - System V"),
            OsAbi::Other(raw) => write!(f, "<unknown: {raw:#x}>"),
        }
    }
}

/// Validated identification block. Every later stage takes its class and
/// byte order from here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElfIdentity {
    pub class: FileClass,
    pub order: ByteOrder,
    pub version: u8,
    pub os_abi: OsAbi,
}

/// Validates the identification block with default options.
pub fn validate_identity(buf: &[u8]) -> DecodeResult<ElfIdentity> {
    validate_identity_with(buf, &DecodeOptions::default())
}

/// Validates the identification block.
///
/// Checks run in a fixed order and stop at the first failure: length, magic,
/// class, byte order, OS/ABI. The version byte is recorded as-is.
pub fn validate_identity_with(buf: &[u8], options: &DecodeOptions) -> DecodeResult<ElfIdentity> {
    DecodeError::require_len(buf, IDENT_SIZE)?;

    let magic = [buf[0], buf[1], buf[2], buf[3]];
    if &magic != ELFMAG {
        return Err(DecodeError::BadMagic(magic));
    }

    let class = match buf[EI_CLASS] {
        ELFCLASS32 => FileClass::Bits32,
        ELFCLASS64 => FileClass::Bits64,
        other => return Err(DecodeError::UnknownClass(other)),
    };

    let order = match buf[EI_DATA] {
        ELFDATA2LSB => ByteOrder::Little,
        ELFDATA2MSB => ByteOrder::Big,
        other => return Err(DecodeError::UnknownByteOrder(other)),
    };

    let version = buf[EI_VERSION];

    let os_abi = match buf[EI_OSABI] {
        ELFOSABI_SYSV => OsAbi::Sysv,
        other if options.allow_foreign_abi => {
            log::warn!("accepting foreign OS/ABI {other:#x}");
            OsAbi::Other(other)
        }
        other => return Err(DecodeError::UnknownAbi(other)),
    };

    log::debug!("identity: {class} {order:?}-endian, version {version}, abi {os_abi}");

    Ok(ElfIdentity {
        class,
        order,
        version,
        os_abi,
    })
}
