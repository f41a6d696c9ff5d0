use anyhow::Result;

use crate::error::DecodeResult;
use crate::header::{decode_header_with, ElfHeader};
use crate::ident::{validate_identity_with, ElfIdentity};
use crate::loader::read_file;
use crate::sections::{decode_section_table, SectionHeaderEntry};
use crate::segments::{decode_program_table, ProgramHeaderEntry};
use crate::DecodeOptions;

/// Header tables to walk after the primary header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tables {
    pub program: bool,
    pub section: bool,
}

impl Tables {
    pub const ALL: Tables = Tables {
        program: true,
        section: true,
    };
    pub const NONE: Tables = Tables {
        program: false,
        section: false,
    };
}

/// Everything decoded from one ELF image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binary {
    pub identity: ElfIdentity,
    pub header: ElfHeader,
    pub program_headers: Vec<ProgramHeaderEntry>,
    pub section_headers: Vec<SectionHeaderEntry>,
}

impl Binary {
    /// Loads `path` and decodes it. Decode failures are wrapped in the
    /// returned error and can be recovered with `downcast_ref::<DecodeError>()`.
    pub fn open<P: AsRef<std::path::Path>>(path: P, options: &DecodeOptions) -> Result<Self> {
        let buf = read_file(path)?;
        Ok(Self::decode(&buf, options)?)
    }

    /// Runs identity → header → program table → section table, stopping at
    /// the first stage that fails.
    pub fn decode(buf: &[u8], options: &DecodeOptions) -> DecodeResult<Self> {
        Self::decode_only(buf, options, Tables::ALL)
    }

    /// Like [`Binary::decode`], but walks only the tables in `tables`. A
    /// skipped table is left empty and its bytes are never read, so a broken
    /// section table cannot fail a caller that only wants segments.
    pub fn decode_only(buf: &[u8], options: &DecodeOptions, tables: Tables) -> DecodeResult<Self> {
        let identity = validate_identity_with(buf, options)?;
        let header = decode_header_with(buf, identity, options)?;

        let program_headers = if tables.program {
            decode_program_table(buf, &header)?
        } else {
            Vec::new()
        };
        let section_headers = if tables.section {
            decode_section_table(buf, &header)?
        } else {
            Vec::new()
        };

        if tables == Tables::ALL {
            if program_headers.is_empty() && section_headers.is_empty() {
                log::warn!("image has neither program nor section headers");
            } else if section_headers.is_empty() {
                log::info!("no section headers (stripped or loader-only image)");
            }
        }

        Ok(Self {
            identity,
            header,
            program_headers,
            section_headers,
        })
    }

    pub fn entry_point(&self) -> u64 {
        self.header.entry_point
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endian::ByteOrder;
    use crate::error::DecodeError;
    use crate::fixture::{ImageBuilder, SectionSpec, SegmentSpec};
    use crate::header::{FileType, Machine};
    use crate::ident::{FileClass, OsAbi};
    use crate::sections::SectionType;
    use crate::segments::{SegmentFlags, SegmentType};

    fn sample(class: FileClass, order: ByteOrder) -> ImageBuilder {
        ImageBuilder::new(class, order)
            .file_type(3)
            .machine(0xb7)
            .entry(0x5a0)
            .segment(SegmentSpec {
                kind: 6,
                flags: 0x4,
                offset: 0x40,
                vaddr: 0x40,
                paddr: 0x40,
                filesz: 0x1f8,
                memsz: 0x1f8,
                align: 8,
            })
            .segment(SegmentSpec {
                kind: 1,
                flags: 0x5,
                filesz: 0x8c4,
                memsz: 0x8c4,
                align: 0x10000,
                ..SegmentSpec::default()
            })
            .segment(SegmentSpec {
                kind: 1,
                flags: 0x6,
                offset: 0xfdc8,
                vaddr: 0x1fdc8,
                paddr: 0x1fdc8,
                filesz: 0x248,
                memsz: 0x250,
                align: 0x10000,
            })
            .section(SectionSpec::default())
            .section(SectionSpec {
                name: 0xb,
                kind: 1,
                flags: 0x6,
                addr: 0x5a0,
                offset: 0x5a0,
                size: 0x1c4,
                align: 16,
                ..SectionSpec::default()
            })
    }

    #[test]
    fn full_pipeline_round_trip() {
        let buf = sample(FileClass::Bits64, ByteOrder::Little).build();
        let bin = Binary::decode(&buf, &DecodeOptions::default()).unwrap();

        assert_eq!(bin.identity.class, FileClass::Bits64);
        assert_eq!(bin.identity.order, ByteOrder::Little);
        assert_eq!(bin.identity.os_abi, OsAbi::Sysv);
        assert_eq!(bin.header.file_type, FileType::SharedObject);
        assert_eq!(bin.header.machine, Machine::Aarch64);
        assert_eq!(bin.entry_point(), 0x5a0);
        assert_eq!(bin.header.program_header_offset, 64);
        assert_eq!(bin.header.program_header_count, 3);
        assert_eq!(bin.header.section_header_count, 2);

        let kinds: Vec<_> = bin.program_headers.iter().map(|p| p.entry_type).collect();
        assert_eq!(
            kinds,
            vec![
                SegmentType::ProgramHeaders,
                SegmentType::Loadable,
                SegmentType::Loadable
            ]
        );
        let data = &bin.program_headers[2];
        assert_eq!(data.flags, SegmentFlags::READ | SegmentFlags::WRITE);
        assert_eq!(data.file_offset, 0xfdc8);
        assert_eq!(data.virtual_address, 0x1fdc8);
        assert_eq!(data.file_size, 0x248);
        assert_eq!(data.memory_size, 0x250);
        assert_eq!(data.alignment, 0x10000);

        assert_eq!(bin.section_headers[1].kind, SectionType::ProgBits);
        assert_eq!(bin.section_headers[1].address, 0x5a0);
    }

    #[test]
    fn every_class_and_order_decodes_alike() {
        let reference = Binary::decode(
            &sample(FileClass::Bits64, ByteOrder::Little).build(),
            &DecodeOptions::default(),
        )
        .unwrap();

        for class in [FileClass::Bits32, FileClass::Bits64] {
            for order in [ByteOrder::Little, ByteOrder::Big] {
                let bin = Binary::decode(&sample(class, order).build(), &DecodeOptions::default())
                    .unwrap();
                assert_eq!(bin.identity.class, class);
                assert_eq!(bin.identity.order, order);
                assert_eq!(bin.header.machine, reference.header.machine);
                assert_eq!(bin.entry_point(), reference.entry_point());
                assert_eq!(bin.program_headers, reference.program_headers);
                assert_eq!(bin.section_headers, reference.section_headers);
            }
        }
    }

    #[test]
    fn stops_at_first_failing_stage() {
        let mut buf = sample(FileClass::Bits64, ByteOrder::Little).build();
        buf[7] = 9;
        assert_eq!(
            Binary::decode(&buf, &DecodeOptions::default()),
            Err(DecodeError::UnknownAbi(9))
        );

        let buf = sample(FileClass::Bits64, ByteOrder::Little).build();
        assert!(matches!(
            Binary::decode(&buf[..100], &DecodeOptions::default()),
            Err(DecodeError::OutOfBounds { .. })
        ));
        assert!(matches!(
            Binary::decode(&buf[..40], &DecodeOptions::default()),
            Err(DecodeError::Truncated { needed: 64, .. })
        ));
    }

    #[test]
    fn skipped_section_table_is_never_read() {
        let mut buf = ImageBuilder::new(FileClass::Bits64, ByteOrder::Little)
            .segment(SegmentSpec {
                kind: 1,
                flags: 0x5,
                filesz: 0x100,
                memsz: 0x100,
                align: 0x1000,
                ..SegmentSpec::default()
            })
            .build();
        buf[40..48].copy_from_slice(&0xffff_0000u64.to_le_bytes());
        buf[60..62].copy_from_slice(&4u16.to_le_bytes());
        let options = DecodeOptions::default();

        assert!(matches!(
            Binary::decode(&buf, &options),
            Err(DecodeError::OutOfBounds {
                offset: 0xffff_0000,
                ..
            })
        ));

        let segments_only = Tables {
            program: true,
            section: false,
        };
        let bin = Binary::decode_only(&buf, &options, segments_only).unwrap();
        assert_eq!(bin.program_headers.len(), 1);
        assert!(bin.section_headers.is_empty());

        let bin = Binary::decode_only(&buf, &options, Tables::NONE).unwrap();
        assert_eq!(bin.header.section_header_offset, 0xffff_0000);
        assert!(bin.program_headers.is_empty());
    }

    #[test]
    fn open_wraps_decode_errors() {
        let path = std::env::temp_dir().join(format!("elfpeek-open-{}", std::process::id()));
        std::fs::write(&path, b"#!/bin/sh\necho not an elf\n").unwrap();
        let err = Binary::open(&path, &DecodeOptions::default()).unwrap_err();
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(
            err.downcast_ref::<DecodeError>(),
            Some(DecodeError::BadMagic(_))
        ));
    }
}
