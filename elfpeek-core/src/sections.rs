//! Section header table decoding.
//!
//! Names are not resolved: resolving them needs the section name string
//! table, which is outside what this crate decodes. `name_offset` is kept so
//! a caller with its own string table reader can look them up.

use std::fmt;

use bitflags::bitflags;
use goblin::elf::section_header::{
    SHF_ALLOC, SHF_EXECINSTR, SHF_INFO_LINK, SHF_MERGE, SHF_STRINGS, SHF_TLS, SHF_WRITE,
    SHT_DYNAMIC, SHT_DYNSYM, SHT_FINI_ARRAY, SHT_GROUP, SHT_HASH, SHT_INIT_ARRAY, SHT_NOBITS,
    SHT_NOTE, SHT_NULL, SHT_PREINIT_ARRAY, SHT_PROGBITS, SHT_REL, SHT_RELA, SHT_SHLIB,
    SHT_STRTAB, SHT_SYMTAB, SHT_SYMTAB_SHNDX,
};

use crate::endian::FieldReader;
use crate::error::DecodeResult;
use crate::header::ElfHeader;
use crate::ident::FileClass;
use crate::table::{TableIter, TableSpec};

/// Size of an ELF32 section header entry.
pub const ELF32_SHDR_SIZE: usize = 40;

/// Size of an ELF64 section header entry.
pub const ELF64_SHDR_SIZE: usize = 64;

/// Section type (`sh_type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionType {
    Null,
    ProgBits,
    SymTab,
    StrTab,
    Rela,
    Hash,
    Dynamic,
    Note,
    NoBits,
    Rel,
    Shlib,
    DynSym,
    InitArray,
    FiniArray,
    PreInitArray,
    Group,
    SymTabIndex,
    Unknown(u32),
}

impl SectionType {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            SHT_NULL => SectionType::Null,
            SHT_PROGBITS => SectionType::ProgBits,
            SHT_SYMTAB => SectionType::SymTab,
            SHT_STRTAB => SectionType::StrTab,
            SHT_RELA => SectionType::Rela,
            SHT_HASH => SectionType::Hash,
            SHT_DYNAMIC => SectionType::Dynamic,
            SHT_NOTE => SectionType::Note,
            SHT_NOBITS => SectionType::NoBits,
            SHT_REL => SectionType::Rel,
            SHT_SHLIB => SectionType::Shlib,
            SHT_DYNSYM => SectionType::DynSym,
            SHT_INIT_ARRAY => SectionType::InitArray,
            SHT_FINI_ARRAY => SectionType::FiniArray,
            SHT_PREINIT_ARRAY => SectionType::PreInitArray,
            SHT_GROUP => SectionType::Group,
            SHT_SYMTAB_SHNDX => SectionType::SymTabIndex,
            other => SectionType::Unknown(other),
        }
    }

    pub fn raw(self) -> u32 {
        match self {
            SectionType::Null => SHT_NULL,
            SectionType::ProgBits => SHT_PROGBITS,
            SectionType::SymTab => SHT_SYMTAB,
            SectionType::StrTab => SHT_STRTAB,
            SectionType::Rela => SHT_RELA,
            SectionType::Hash => SHT_HASH,
            SectionType::Dynamic => SHT_DYNAMIC,
            SectionType::Note => SHT_NOTE,
            SectionType::NoBits => SHT_NOBITS,
            SectionType::Rel => SHT_REL,
            SectionType::Shlib => SHT_SHLIB,
            SectionType::DynSym => SHT_DYNSYM,
            SectionType::InitArray => SHT_INIT_ARRAY,
            SectionType::FiniArray => SHT_FINI_ARRAY,
            SectionType::PreInitArray => SHT_PREINIT_ARRAY,
            SectionType::Group => SHT_GROUP,
            SectionType::SymTabIndex => SHT_SYMTAB_SHNDX,
            SectionType::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SectionType::Null => "NULL",
            SectionType::ProgBits => "PROGBITS",
            SectionType::SymTab => "SYMTAB",
            SectionType::StrTab => "STRTAB",
            SectionType::Rela => "RELA",
            SectionType::Hash => "HASH",
            SectionType::Dynamic => "DYNAMIC",
            SectionType::Note => "NOTE",
            SectionType::NoBits => "NOBITS",
            SectionType::Rel => "REL",
            SectionType::Shlib => "SHLIB",
            SectionType::DynSym => "DYNSYM",
            SectionType::InitArray => "INIT_ARRAY",
            SectionType::FiniArray => "FINI_ARRAY",
            SectionType::PreInitArray => "PREINIT_ARRAY",
            SectionType::Group => "GROUP",
            SectionType::SymTabIndex => "SYMTAB_SHNDX",
            SectionType::Unknown(raw) => return write!(f, "{raw:#x}"),
        };
        f.write_str(name)
    }
}

bitflags! {
    /// Section attributes (`sh_flags`). Unlisted bits are kept.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SectionFlags: u64 {
        const WRITE = SHF_WRITE as u64;
        const ALLOC = SHF_ALLOC as u64;
        const EXECINSTR = SHF_EXECINSTR as u64;
        const MERGE = SHF_MERGE as u64;
        const STRINGS = SHF_STRINGS as u64;
        const INFO_LINK = SHF_INFO_LINK as u64;
        const TLS = SHF_TLS as u64;
    }
}

impl fmt::Display for SectionFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const KEYS: [(SectionFlags, char); 7] = [
            (SectionFlags::WRITE, 'W'),
            (SectionFlags::ALLOC, 'A'),
            (SectionFlags::EXECINSTR, 'X'),
            (SectionFlags::MERGE, 'M'),
            (SectionFlags::STRINGS, 'S'),
            (SectionFlags::INFO_LINK, 'I'),
            (SectionFlags::TLS, 'T'),
        ];
        for (flag, key) in KEYS {
            if self.contains(flag) {
                write!(f, "{key}")?;
            }
        }
        if !(*self - SectionFlags::all()).is_empty() {
            write!(f, "x")?;
        }
        Ok(())
    }
}

/// One section header table slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionHeaderEntry {
    /// Offset of the name in the section name string table.
    pub name_offset: u32,
    pub kind: SectionType,
    pub flags: SectionFlags,
    pub address: u64,
    pub file_offset: u64,
    pub size: u64,
    pub link: u32,
    pub info: u32,
    pub alignment: u64,
    pub entry_size: u64,
}

impl SectionHeaderEntry {
    /// Both classes share the field order; only the address-width fields
    /// (flags, address, offset, size, alignment, entry size) grow.
    fn decode(r: &FieldReader<'_>, word: usize) -> DecodeResult<Self> {
        Ok(Self {
            name_offset: r.u32(0)?,
            kind: SectionType::from_raw(r.u32(4)?),
            flags: SectionFlags::from_bits_retain(r.word(8)?),
            address: r.word(8 + word)?,
            file_offset: r.word(8 + 2 * word)?,
            size: r.word(8 + 3 * word)?,
            link: r.u32(8 + 4 * word)?,
            info: r.u32(12 + 4 * word)?,
            alignment: r.word(16 + 4 * word)?,
            entry_size: r.word(16 + 5 * word)?,
        })
    }

    fn decode_32(r: &FieldReader<'_>) -> DecodeResult<Self> {
        Self::decode(r, 4)
    }

    fn decode_64(r: &FieldReader<'_>) -> DecodeResult<Self> {
        Self::decode(r, 8)
    }

    /// Whether the section occupies bytes in the file.
    pub fn has_file_data(&self) -> bool {
        !matches!(self.kind, SectionType::Null | SectionType::NoBits)
    }
}

/// Lazily walks the section header table named by `header`.
pub fn section_headers<'a>(
    buf: &'a [u8],
    header: &ElfHeader,
) -> TableIter<'a, SectionHeaderEntry> {
    let class = header.identity.class;
    let reader = FieldReader::new(buf, class, header.identity.order);
    let (entry_size, decode): (usize, fn(&FieldReader<'a>) -> DecodeResult<SectionHeaderEntry>) =
        match class {
            FileClass::Bits32 => (ELF32_SHDR_SIZE, SectionHeaderEntry::decode_32),
            FileClass::Bits64 => (ELF64_SHDR_SIZE, SectionHeaderEntry::decode_64),
        };

    if header.section_header_offset == 0 {
        return TableIter::empty(reader, decode);
    }

    let declared = usize::from(header.section_header_entry_size);
    if header.section_header_count != 0 && declared != entry_size {
        log::warn!(
            "declared section header size {declared} differs from {class} layout size {entry_size}"
        );
    }

    TableIter::new(
        reader,
        buf.len(),
        TableSpec {
            offset: header.section_header_offset,
            count: header.section_header_count,
            entry_size,
        },
        decode,
    )
}

/// Decodes every section header, in on-disk order, including the leading
/// `Null` entry.
pub fn decode_section_table(
    buf: &[u8],
    header: &ElfHeader,
) -> DecodeResult<Vec<SectionHeaderEntry>> {
    let entries = section_headers(buf, header).collect::<DecodeResult<Vec<_>>>()?;
    log::debug!("decoded {} section headers", entries.len());
    Ok(entries)
}
