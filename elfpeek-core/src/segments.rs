//! Program header table decoding.

use std::fmt;

use bitflags::bitflags;
use goblin::elf::program_header::{
    PF_R, PF_W, PF_X, PT_DYNAMIC, PT_GNU_EH_FRAME, PT_GNU_RELRO, PT_GNU_STACK, PT_INTERP, PT_LOAD,
    PT_NOTE, PT_NULL, PT_PHDR, PT_SHLIB, PT_TLS,
};

use crate::endian::FieldReader;
use crate::error::DecodeResult;
use crate::header::ElfHeader;
use crate::ident::FileClass;
use crate::table::{TableIter, TableSpec};

/// Size of an ELF32 program header entry.
pub const ELF32_PHDR_SIZE: usize = 32;

/// Size of an ELF64 program header entry.
pub const ELF64_PHDR_SIZE: usize = 56;

const PT_GNU_PROPERTY: u32 = 0x6474_e553;

/// Segment type (`p_type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentType {
    Null,
    Loadable,
    Dynamic,
    Interpreter,
    Note,
    Shlib,
    ProgramHeaders,
    Tls,
    GnuEhFrame,
    GnuStack,
    GnuRelro,
    GnuProperty,
    Unknown(u32),
}

impl SegmentType {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            PT_NULL => SegmentType::Null,
            PT_LOAD => SegmentType::Loadable,
            PT_DYNAMIC => SegmentType::Dynamic,
            PT_INTERP => SegmentType::Interpreter,
            PT_NOTE => SegmentType::Note,
            PT_SHLIB => SegmentType::Shlib,
            PT_PHDR => SegmentType::ProgramHeaders,
            PT_TLS => SegmentType::Tls,
            PT_GNU_EH_FRAME => SegmentType::GnuEhFrame,
            PT_GNU_STACK => SegmentType::GnuStack,
            PT_GNU_RELRO => SegmentType::GnuRelro,
            PT_GNU_PROPERTY => SegmentType::GnuProperty,
            other => SegmentType::Unknown(other),
        }
    }

    pub fn raw(self) -> u32 {
        match self {
            SegmentType::Null => PT_NULL,
            SegmentType::Loadable => PT_LOAD,
            SegmentType::Dynamic => PT_DYNAMIC,
            SegmentType::Interpreter => PT_INTERP,
            SegmentType::Note => PT_NOTE,
            SegmentType::Shlib => PT_SHLIB,
            SegmentType::ProgramHeaders => PT_PHDR,
            SegmentType::Tls => PT_TLS,
            SegmentType::GnuEhFrame => PT_GNU_EH_FRAME,
            SegmentType::GnuStack => PT_GNU_STACK,
            SegmentType::GnuRelro => PT_GNU_RELRO,
            SegmentType::GnuProperty => PT_GNU_PROPERTY,
            SegmentType::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for SegmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SegmentType::Null => "NULL",
            SegmentType::Loadable => "LOAD",
            SegmentType::Dynamic => "DYNAMIC",
            SegmentType::Interpreter => "INTERP",
            SegmentType::Note => "NOTE",
            SegmentType::Shlib => "SHLIB",
            SegmentType::ProgramHeaders => "PHDR",
            SegmentType::Tls => "TLS",
            SegmentType::GnuEhFrame => "GNU_EH_FRAME",
            SegmentType::GnuStack => "GNU_STACK",
            SegmentType::GnuRelro => "GNU_RELRO",
            SegmentType::GnuProperty => "GNU_PROPERTY",
            SegmentType::Unknown(raw) => return write!(f, "{raw:#x}"),
        };
        f.write_str(name)
    }
}

bitflags! {
    /// Segment permissions (`p_flags`). Bits outside the three known ones
    /// are kept.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SegmentFlags: u32 {
        const EXECUTE = PF_X;
        const WRITE = PF_W;
        const READ = PF_R;
    }
}

impl fmt::Display for SegmentFlags {
    /// `readelf`-style `RWE` column.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bit = |flag: SegmentFlags, c: char| if self.contains(flag) { c } else { ' ' };
        write!(
            f,
            "{}{}{}",
            bit(SegmentFlags::READ, 'R'),
            bit(SegmentFlags::WRITE, 'W'),
            bit(SegmentFlags::EXECUTE, 'E')
        )
    }
}

/// One program header table slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramHeaderEntry {
    pub entry_type: SegmentType,
    pub flags: SegmentFlags,
    pub file_offset: u64,
    pub virtual_address: u64,
    pub physical_address: u64,
    pub file_size: u64,
    pub memory_size: u64,
    pub alignment: u64,
}

impl ProgramHeaderEntry {
    fn decode_32(r: &FieldReader<'_>) -> DecodeResult<Self> {
        Ok(Self {
            entry_type: SegmentType::from_raw(r.u32(0)?),
            file_offset: r.word(4)?,
            virtual_address: r.word(8)?,
            physical_address: r.word(12)?,
            file_size: r.word(16)?,
            memory_size: r.word(20)?,
            flags: SegmentFlags::from_bits_retain(r.u32(24)?),
            alignment: r.word(28)?,
        })
    }

    fn decode_64(r: &FieldReader<'_>) -> DecodeResult<Self> {
        Ok(Self {
            entry_type: SegmentType::from_raw(r.u32(0)?),
            flags: SegmentFlags::from_bits_retain(r.u32(4)?),
            file_offset: r.word(8)?,
            virtual_address: r.word(16)?,
            physical_address: r.word(24)?,
            file_size: r.word(32)?,
            memory_size: r.word(40)?,
            alignment: r.word(48)?,
        })
    }
}

/// Lazily walks the program header table named by `header`.
///
/// A zero table offset means the file has no program headers and yields an
/// empty iterator regardless of the declared count.
pub fn program_headers<'a>(
    buf: &'a [u8],
    header: &ElfHeader,
) -> TableIter<'a, ProgramHeaderEntry> {
    let class = header.identity.class;
    let reader = FieldReader::new(buf, class, header.identity.order);
    let (entry_size, decode): (usize, fn(&FieldReader<'a>) -> DecodeResult<ProgramHeaderEntry>) =
        match class {
            FileClass::Bits32 => (ELF32_PHDR_SIZE, ProgramHeaderEntry::decode_32),
            FileClass::Bits64 => (ELF64_PHDR_SIZE, ProgramHeaderEntry::decode_64),
        };

    if header.program_header_offset == 0 {
        if header.program_header_count != 0 {
            log::debug!(
                "program header offset is 0; ignoring declared count {}",
                header.program_header_count
            );
        }
        return TableIter::empty(reader, decode);
    }

    let declared = usize::from(header.program_header_entry_size);
    if header.program_header_count != 0 && declared != entry_size {
        log::warn!(
            "declared program header size {declared} differs from {class} layout size {entry_size}"
        );
    }

    TableIter::new(
        reader,
        buf.len(),
        TableSpec {
            offset: header.program_header_offset,
            count: header.program_header_count,
            entry_size,
        },
        decode,
    )
}

/// Decodes every program header, in on-disk order.
///
/// `Null` entries are included; filtering is left to the caller.
///
/// # Errors
///
/// Returns [`DecodeError::OutOfBounds`](crate::DecodeError::OutOfBounds) if any
/// slot extends past the end of `buf`. No partial table is returned.
pub fn decode_program_table(
    buf: &[u8],
    header: &ElfHeader,
) -> DecodeResult<Vec<ProgramHeaderEntry>> {
    let entries = program_headers(buf, header).collect::<DecodeResult<Vec<_>>>()?;
    log::debug!("decoded {} program headers", entries.len());
    Ok(entries)
}
