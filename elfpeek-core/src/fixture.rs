//! Synthetic ELF image builder for unit tests.

use crate::endian::ByteOrder;
use crate::header::{ELF32_HEADER_SIZE, ELF64_HEADER_SIZE};
use crate::ident::FileClass;
use crate::segments::{ELF32_PHDR_SIZE, ELF64_PHDR_SIZE};
use crate::sections::{ELF32_SHDR_SIZE, ELF64_SHDR_SIZE};

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SegmentSpec {
    pub kind: u32,
    pub flags: u32,
    pub offset: u64,
    pub vaddr: u64,
    pub paddr: u64,
    pub filesz: u64,
    pub memsz: u64,
    pub align: u64,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SectionSpec {
    pub name: u32,
    pub kind: u32,
    pub flags: u64,
    pub addr: u64,
    pub offset: u64,
    pub size: u64,
    pub link: u32,
    pub info: u32,
    pub align: u64,
    pub entsize: u64,
}

/// Lays out header, then program headers, then section headers, back to back.
#[derive(Debug, Clone)]
pub(crate) struct ImageBuilder {
    class: FileClass,
    order: ByteOrder,
    file_type: u16,
    machine: u16,
    entry: u64,
    flags: u32,
    segments: Vec<SegmentSpec>,
    sections: Vec<SectionSpec>,
}

struct Writer {
    buf: Vec<u8>,
    class: FileClass,
    order: ByteOrder,
}

impl Writer {
    fn put(&mut self, off: usize, bytes_le: &[u8]) {
        let dst = &mut self.buf[off..off + bytes_le.len()];
        dst.copy_from_slice(bytes_le);
        if self.order == ByteOrder::Big {
            dst.reverse();
        }
    }

    fn u16(&mut self, off: usize, v: u16) {
        self.put(off, &v.to_le_bytes());
    }

    fn u32(&mut self, off: usize, v: u32) {
        self.put(off, &v.to_le_bytes());
    }

    fn u64(&mut self, off: usize, v: u64) {
        self.put(off, &v.to_le_bytes());
    }

    fn word(&mut self, off: usize, v: u64) {
        match self.class {
            FileClass::Bits32 => self.u32(off, v as u32),
            FileClass::Bits64 => self.u64(off, v),
        }
    }
}

impl ImageBuilder {
    pub(crate) fn new(class: FileClass, order: ByteOrder) -> Self {
        Self {
            class,
            order,
            file_type: 2,
            machine: 62,
            entry: 0,
            flags: 0,
            segments: Vec::new(),
            sections: Vec::new(),
        }
    }

    pub(crate) fn file_type(mut self, raw: u16) -> Self {
        self.file_type = raw;
        self
    }

    pub(crate) fn machine(mut self, raw: u16) -> Self {
        self.machine = raw;
        self
    }

    pub(crate) fn entry(mut self, entry: u64) -> Self {
        self.entry = entry;
        self
    }

    pub(crate) fn flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    pub(crate) fn segment(mut self, spec: SegmentSpec) -> Self {
        self.segments.push(spec);
        self
    }

    pub(crate) fn section(mut self, spec: SectionSpec) -> Self {
        self.sections.push(spec);
        self
    }

    fn header_size(&self) -> usize {
        match self.class {
            FileClass::Bits32 => ELF32_HEADER_SIZE,
            FileClass::Bits64 => ELF64_HEADER_SIZE,
        }
    }

    fn phdr_size(&self) -> usize {
        match self.class {
            FileClass::Bits32 => ELF32_PHDR_SIZE,
            FileClass::Bits64 => ELF64_PHDR_SIZE,
        }
    }

    fn shdr_size(&self) -> usize {
        match self.class {
            FileClass::Bits32 => ELF32_SHDR_SIZE,
            FileClass::Bits64 => ELF64_SHDR_SIZE,
        }
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let ehsize = self.header_size();
        let phentsize = self.phdr_size();
        let shentsize = self.shdr_size();
        let phoff = if self.segments.is_empty() { 0 } else { ehsize };
        let ph_end = ehsize + phentsize * self.segments.len();
        let shoff = if self.sections.is_empty() { 0 } else { ph_end };
        let total = ph_end + shentsize * self.sections.len();

        let mut w = Writer {
            buf: vec![0u8; total],
            class: self.class,
            order: self.order,
        };

        w.buf[..4].copy_from_slice(b"\x7fELF");
        w.buf[4] = match self.class {
            FileClass::Bits32 => 1,
            FileClass::Bits64 => 2,
        };
        w.buf[5] = match self.order {
            ByteOrder::Little => 1,
            ByteOrder::Big => 2,
        };
        w.buf[6] = 1;

        w.u16(16, self.file_type);
        w.u16(18, self.machine);
        w.u32(20, 1);
        w.word(24, self.entry);

        let (phoff_at, tail) = match self.class {
            FileClass::Bits32 => (28, 36),
            FileClass::Bits64 => (32, 48),
        };
        let shoff_at = phoff_at + self.class.word_size();
        w.word(phoff_at, phoff as u64);
        w.word(shoff_at, shoff as u64);
        w.u32(tail, self.flags);
        w.u16(tail + 4, ehsize as u16);
        w.u16(tail + 6, phentsize as u16);
        w.u16(tail + 8, self.segments.len() as u16);
        w.u16(tail + 10, shentsize as u16);
        w.u16(tail + 12, self.sections.len() as u16);
        w.u16(tail + 14, 0);

        for (i, seg) in self.segments.iter().enumerate() {
            let at = phoff + i * phentsize;
            w.u32(at, seg.kind);
            match self.class {
                FileClass::Bits32 => {
                    w.u32(at + 4, seg.offset as u32);
                    w.u32(at + 8, seg.vaddr as u32);
                    w.u32(at + 12, seg.paddr as u32);
                    w.u32(at + 16, seg.filesz as u32);
                    w.u32(at + 20, seg.memsz as u32);
                    w.u32(at + 24, seg.flags);
                    w.u32(at + 28, seg.align as u32);
                }
                FileClass::Bits64 => {
                    w.u32(at + 4, seg.flags);
                    w.u64(at + 8, seg.offset);
                    w.u64(at + 16, seg.vaddr);
                    w.u64(at + 24, seg.paddr);
                    w.u64(at + 32, seg.filesz);
                    w.u64(at + 40, seg.memsz);
                    w.u64(at + 48, seg.align);
                }
            }
        }

        let ws = self.class.word_size();
        for (i, sec) in self.sections.iter().enumerate() {
            let at = shoff + i * shentsize;
            w.u32(at, sec.name);
            w.u32(at + 4, sec.kind);
            w.word(at + 8, sec.flags);
            w.word(at + 8 + ws, sec.addr);
            w.word(at + 8 + 2 * ws, sec.offset);
            w.word(at + 8 + 3 * ws, sec.size);
            w.u32(at + 8 + 4 * ws, sec.link);
            w.u32(at + 12 + 4 * ws, sec.info);
            w.word(at + 16 + 4 * ws, sec.align);
            w.word(at + 16 + 5 * ws, sec.entsize);
        }

        w.buf
    }
}
