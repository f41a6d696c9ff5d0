use colored::Colorize;
use elfpeek_core::{
    Binary, ByteOrder, ElfHeader, ElfIdentity, ProgramHeaderEntry, SectionHeaderEntry,
    SectionType, SegmentFlags, SegmentType,
};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Which parts of the image to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub header: bool,
    pub segments: bool,
    pub sections: bool,
    /// Include `NULL` table entries.
    pub show_null: bool,
}

#[derive(Tabled)]
struct SegmentRow {
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Flg")]
    flags: String,
    #[tabled(rename = "Offset")]
    offset: String,
    #[tabled(rename = "VirtAddr")]
    vaddr: String,
    #[tabled(rename = "PhysAddr")]
    paddr: String,
    #[tabled(rename = "FileSiz")]
    filesz: String,
    #[tabled(rename = "MemSiz")]
    memsz: String,
    #[tabled(rename = "Align")]
    align: String,
}

impl From<&ProgramHeaderEntry> for SegmentRow {
    fn from(p: &ProgramHeaderEntry) -> Self {
        SegmentRow {
            kind: p.entry_type.to_string(),
            flags: p.flags.to_string(),
            offset: format!("0x{:06x}", p.file_offset),
            vaddr: format!("0x{:016x}", p.virtual_address),
            paddr: format!("0x{:016x}", p.physical_address),
            filesz: format!("0x{:06x}", p.file_size),
            memsz: format!("0x{:06x}", p.memory_size),
            align: format!("{:#x}", p.alignment),
        }
    }
}

#[derive(Tabled)]
struct SectionRow {
    #[tabled(rename = "Nr")]
    index: usize,
    #[tabled(rename = "Name@")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Offset")]
    offset: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "ES")]
    entsize: String,
    #[tabled(rename = "Flg")]
    flags: String,
    #[tabled(rename = "Lk")]
    link: u32,
    #[tabled(rename = "Inf")]
    info: u32,
    #[tabled(rename = "Al")]
    align: u64,
}

impl SectionRow {
    fn new(index: usize, s: &SectionHeaderEntry) -> Self {
        SectionRow {
            index,
            name: format!("{:#x}", s.name_offset),
            kind: s.kind.to_string(),
            address: format!("{:016x}", s.address),
            offset: format!("{:06x}", s.file_offset),
            size: format!("{:06x}", s.size),
            entsize: format!("{:02x}", s.entry_size),
            flags: s.flags.to_string(),
            link: s.link,
            info: s.info,
            align: s.alignment,
        }
    }
}

fn order_name(order: ByteOrder) -> &'static str {
    match order {
        ByteOrder::Little => "little",
        ByteOrder::Big => "big",
    }
}

fn visible_segments(
    bin: &Binary,
    show_null: bool,
) -> impl Iterator<Item = &ProgramHeaderEntry> {
    bin.program_headers
        .iter()
        .filter(move |p| show_null || p.entry_type != SegmentType::Null)
}

fn visible_sections(
    bin: &Binary,
    show_null: bool,
) -> impl Iterator<Item = (usize, &SectionHeaderEntry)> {
    bin.section_headers
        .iter()
        .enumerate()
        .filter(move |(_, s)| show_null || s.kind != SectionType::Null)
}

/// Human-readable report, `readelf`-style.
pub fn render_text(bin: &Binary, sel: &Selection) -> String {
    let mut out = String::new();

    if sel.header {
        out.push_str(&format!("{}\n", "ELF Header:".bold()));
        let id = &bin.identity;
        let h = &bin.header;
        let lines: [(&str, String); 12] = [
            ("Class", id.class.to_string()),
            ("Data", format!("{}-endian", order_name(id.order))),
            ("Version", id.version.to_string()),
            ("OS/ABI", id.os_abi.to_string()),
            ("Type", h.file_type.to_string()),
            ("Machine", h.machine.to_string()),
            ("Entry point address", format!("{:#x}", h.entry_point)),
            (
                "Start of program headers",
                format!("{} (bytes into file)", h.program_header_offset),
            ),
            (
                "Start of section headers",
                format!("{} (bytes into file)", h.section_header_offset),
            ),
            ("Flags", format!("{:#x}", h.flags)),
            ("Number of program headers", h.program_header_count.to_string()),
            ("Number of section headers", h.section_header_count.to_string()),
        ];
        for (label, value) in lines {
            out.push_str(&format!("  {:<28} {}\n", format!("{label}:"), value));
        }
        if !h.machine.is_known() {
            out.push_str(&format!("  {}\n", "warning: unrecognized machine".yellow()));
        }
    }

    if sel.segments {
        let rows: Vec<SegmentRow> = visible_segments(bin, sel.show_null)
            .map(SegmentRow::from)
            .collect();
        out.push_str(&format!("\n{}\n", "Program Headers:".bold()));
        if rows.is_empty() {
            out.push_str("There are no program headers in this file.\n");
        } else {
            out.push_str(&Table::new(rows).with(Style::sharp()).to_string());
            out.push('\n');
        }
    }

    if sel.sections {
        let rows: Vec<SectionRow> = visible_sections(bin, sel.show_null)
            .map(|(i, s)| SectionRow::new(i, s))
            .collect();
        out.push_str(&format!("\n{}\n", "Section Headers:".bold()));
        if rows.is_empty() {
            out.push_str("There are no sections in this file.\n");
        } else {
            out.push_str(&Table::new(rows).with(Style::sharp()).to_string());
            out.push('\n');
        }
    }

    out
}

#[derive(Serialize)]
struct IdentityJson {
    class: String,
    byte_order: &'static str,
    version: u8,
    os_abi: u8,
}

impl From<&ElfIdentity> for IdentityJson {
    fn from(id: &ElfIdentity) -> Self {
        IdentityJson {
            class: id.class.to_string(),
            byte_order: order_name(id.order),
            version: id.version,
            os_abi: id.os_abi.raw(),
        }
    }
}

#[derive(Serialize)]
struct HeaderJson {
    file_type: String,
    file_type_raw: u16,
    machine: String,
    machine_raw: u16,
    version: u32,
    entry_point: u64,
    program_header_offset: u64,
    section_header_offset: u64,
    flags: u32,
    program_header_count: u16,
    section_header_count: u16,
    section_names_index: u16,
}

impl From<&ElfHeader> for HeaderJson {
    fn from(h: &ElfHeader) -> Self {
        HeaderJson {
            file_type: h.file_type.to_string(),
            file_type_raw: h.file_type.raw(),
            machine: h.machine.to_string(),
            machine_raw: h.machine.raw(),
            version: h.version,
            entry_point: h.entry_point,
            program_header_offset: h.program_header_offset,
            section_header_offset: h.section_header_offset,
            flags: h.flags,
            program_header_count: h.program_header_count,
            section_header_count: h.section_header_count,
            section_names_index: h.section_names_index,
        }
    }
}

#[derive(Serialize)]
struct SegmentJson {
    #[serde(rename = "type")]
    kind: String,
    type_raw: u32,
    readable: bool,
    writable: bool,
    executable: bool,
    flags_raw: u32,
    file_offset: u64,
    virtual_address: u64,
    physical_address: u64,
    file_size: u64,
    memory_size: u64,
    alignment: u64,
}

impl From<&ProgramHeaderEntry> for SegmentJson {
    fn from(p: &ProgramHeaderEntry) -> Self {
        SegmentJson {
            kind: p.entry_type.to_string(),
            type_raw: p.entry_type.raw(),
            readable: p.flags.contains(SegmentFlags::READ),
            writable: p.flags.contains(SegmentFlags::WRITE),
            executable: p.flags.contains(SegmentFlags::EXECUTE),
            flags_raw: p.flags.bits(),
            file_offset: p.file_offset,
            virtual_address: p.virtual_address,
            physical_address: p.physical_address,
            file_size: p.file_size,
            memory_size: p.memory_size,
            alignment: p.alignment,
        }
    }
}

#[derive(Serialize)]
struct SectionJson {
    index: usize,
    name_offset: u32,
    #[serde(rename = "type")]
    kind: String,
    flags: String,
    flags_raw: u64,
    address: u64,
    file_offset: u64,
    size: u64,
    link: u32,
    info: u32,
    alignment: u64,
    entry_size: u64,
}

impl SectionJson {
    fn new(index: usize, s: &SectionHeaderEntry) -> Self {
        SectionJson {
            index,
            name_offset: s.name_offset,
            kind: s.kind.to_string(),
            flags: s.flags.to_string(),
            flags_raw: s.flags.bits(),
            address: s.address,
            file_offset: s.file_offset,
            size: s.size,
            link: s.link,
            info: s.info,
            alignment: s.alignment,
            entry_size: s.entry_size,
        }
    }
}

#[derive(Serialize)]
struct JsonReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    identity: Option<IdentityJson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    header: Option<HeaderJson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    program_headers: Option<Vec<SegmentJson>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    section_headers: Option<Vec<SectionJson>>,
}

/// Structured report; numbers stay numeric.
pub fn render_json(bin: &Binary, sel: &Selection) -> serde_json::Result<String> {
    let report = JsonReport {
        identity: sel.header.then(|| IdentityJson::from(&bin.identity)),
        header: sel.header.then(|| HeaderJson::from(&bin.header)),
        program_headers: sel.segments.then(|| {
            visible_segments(bin, sel.show_null)
                .map(SegmentJson::from)
                .collect()
        }),
        section_headers: sel.sections.then(|| {
            visible_sections(bin, sel.show_null)
                .map(|(i, s)| SectionJson::new(i, s))
                .collect()
        }),
    };
    serde_json::to_string_pretty(&report)
}
