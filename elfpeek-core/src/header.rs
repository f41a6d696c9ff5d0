//! Primary ELF header (`Elf32_Ehdr` / `Elf64_Ehdr`) decoding.

pub mod machine;

use std::fmt;

use goblin::elf::header::{ET_CORE, ET_DYN, ET_EXEC, ET_NONE, ET_REL};

use crate::endian::FieldReader;
use crate::error::{DecodeError, DecodeResult};
use crate::ident::{ElfIdentity, FileClass};
use crate::DecodeOptions;

pub use machine::Machine;

/// Size of the ELF32 file header.
pub const ELF32_HEADER_SIZE: usize = 52;

/// Size of the ELF64 file header.
pub const ELF64_HEADER_SIZE: usize = 64;

/// Field offsets for one file class. Only `e_entry`, `e_phoff` and `e_shoff`
/// change width between classes; everything after them shifts accordingly.
struct HeaderLayout {
    size: usize,
    entry: usize,
    phoff: usize,
    shoff: usize,
    flags: usize,
    ehsize: usize,
    phentsize: usize,
    phnum: usize,
    shentsize: usize,
    shnum: usize,
    shstrndx: usize,
}

const E_TYPE: usize = 16;
const E_MACHINE: usize = 18;
const E_VERSION: usize = 20;

const LAYOUT_32: HeaderLayout = HeaderLayout {
    size: ELF32_HEADER_SIZE,
    entry: 24,
    phoff: 28,
    shoff: 32,
    flags: 36,
    ehsize: 40,
    phentsize: 42,
    phnum: 44,
    shentsize: 46,
    shnum: 48,
    shstrndx: 50,
};

const LAYOUT_64: HeaderLayout = HeaderLayout {
    size: ELF64_HEADER_SIZE,
    entry: 24,
    phoff: 32,
    shoff: 40,
    flags: 48,
    ehsize: 52,
    phentsize: 54,
    phnum: 56,
    shentsize: 58,
    shnum: 60,
    shstrndx: 62,
};

impl HeaderLayout {
    fn for_class(class: FileClass) -> &'static HeaderLayout {
        match class {
            FileClass::Bits32 => &LAYOUT_32,
            FileClass::Bits64 => &LAYOUT_64,
        }
    }
}

/// Object file type (`e_type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    None,
    Relocatable,
    Executable,
    SharedObject,
    Core,
    Unknown(u16),
}

impl FileType {
    pub fn from_raw(raw: u16) -> Self {
        match raw {
            ET_NONE => FileType::None,
            ET_REL => FileType::Relocatable,
            ET_EXEC => FileType::Executable,
            ET_DYN => FileType::SharedObject,
            ET_CORE => FileType::Core,
            other => FileType::Unknown(other),
        }
    }

    pub fn raw(self) -> u16 {
        match self {
            FileType::None => ET_NONE,
            FileType::Relocatable => ET_REL,
            FileType::Executable => ET_EXEC,
            FileType::SharedObject => ET_DYN,
            FileType::Core => ET_CORE,
            FileType::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileType::None => write!(f, "NONE (No file type)"),
            FileType::Relocatable => write!(f, "REL (Relocatable file)"),
            FileType::Executable => write!(f, "EXEC (Executable file)"),
            FileType::SharedObject => write!(f, "DYN (Shared object file)"),
            FileType::Core => write!(f, "CORE (Core file)"),
            FileType::Unknown(raw) => write!(f, "<unknown: {raw:#x}>"),
        }
    }
}

/// Decoded primary header.
///
/// Offsets and counts are copied verbatim; whether they address bytes inside
/// the buffer is checked by the table decoders, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElfHeader {
    pub identity: ElfIdentity,
    pub file_type: FileType,
    pub machine: Machine,
    /// `e_version`.
    pub version: u32,
    /// Virtual address of the entry point, widened for ELF32.
    pub entry_point: u64,
    /// Offset of the program header table; 0 means there is none.
    pub program_header_offset: u64,
    /// Offset of the section header table; 0 means there is none.
    pub section_header_offset: u64,
    /// Processor-specific flags.
    pub flags: u32,
    pub header_size: u16,
    /// Program header entry size as declared by the file.
    pub program_header_entry_size: u16,
    pub program_header_count: u16,
    /// Section header entry size as declared by the file.
    pub section_header_entry_size: u16,
    pub section_header_count: u16,
    /// Index of the section holding section names.
    pub section_names_index: u16,
}

impl ElfHeader {
    pub fn is_64(&self) -> bool {
        self.identity.class == FileClass::Bits64
    }

    pub fn is_executable(&self) -> bool {
        self.file_type == FileType::Executable
    }

    pub fn has_program_headers(&self) -> bool {
        self.program_header_offset != 0 && self.program_header_count != 0
    }

    pub fn has_section_headers(&self) -> bool {
        self.section_header_offset != 0 && self.section_header_count != 0
    }
}

/// Decodes the primary header with default (lenient) options.
pub fn decode_header(buf: &[u8], identity: ElfIdentity) -> DecodeResult<ElfHeader> {
    decode_header_with(buf, identity, &DecodeOptions::default())
}

/// Decodes the primary header that follows a validated identification block.
///
/// Unrecognized file types and machines are kept as `Unknown(raw)` unless
/// `options.strict` is set, in which case they fail the decode.
pub fn decode_header_with(
    buf: &[u8],
    identity: ElfIdentity,
    options: &DecodeOptions,
) -> DecodeResult<ElfHeader> {
    let layout = HeaderLayout::for_class(identity.class);
    DecodeError::require_len(buf, layout.size)?;

    let r = FieldReader::new(buf, identity.class, identity.order);

    let raw_type = r.u16(E_TYPE)?;
    let file_type = FileType::from_raw(raw_type);
    if let FileType::Unknown(raw) = file_type {
        if options.strict {
            return Err(DecodeError::UnknownFileType(raw));
        }
        log::warn!("unknown file type {raw:#x}");
    }

    let machine = Machine::from_raw(r.u16(E_MACHINE)?);
    if let Machine::Unknown(raw) = machine {
        if options.strict {
            return Err(DecodeError::UnknownMachine(raw));
        }
        log::warn!("unknown machine {raw:#x}");
    }

    let header = ElfHeader {
        identity,
        file_type,
        machine,
        version: r.u32(E_VERSION)?,
        entry_point: r.word(layout.entry)?,
        program_header_offset: r.word(layout.phoff)?,
        section_header_offset: r.word(layout.shoff)?,
        flags: r.u32(layout.flags)?,
        header_size: r.u16(layout.ehsize)?,
        program_header_entry_size: r.u16(layout.phentsize)?,
        program_header_count: r.u16(layout.phnum)?,
        section_header_entry_size: r.u16(layout.shentsize)?,
        section_header_count: r.u16(layout.shnum)?,
        section_names_index: r.u16(layout.shstrndx)?,
    };

    log::debug!(
        "header: {} {}, entry {:#x}, {} program headers at {:#x}, {} sections at {:#x}",
        header.file_type,
        header.machine,
        header.entry_point,
        header.program_header_count,
        header.program_header_offset,
        header.section_header_count,
        header.section_header_offset
    );

    Ok(header)
}
