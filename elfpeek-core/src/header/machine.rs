use std::fmt;

use goblin::elf::header::{
    EM_386, EM_AARCH64, EM_ARM, EM_IA_64, EM_MIPS, EM_NONE, EM_PPC, EM_RISCV, EM_SH, EM_SPARC,
    EM_X86_64,
};

/// Instruction set named by `e_machine`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Machine {
    Unspecified,
    Sparc,
    Ia32,
    Mips,
    PowerPc,
    Arm,
    SuperH,
    Itanium,
    Amd64,
    Aarch64,
    RiscV,
    Unknown(u16),
}

impl Machine {
    pub fn from_raw(raw: u16) -> Self {
        match raw {
            EM_NONE => Machine::Unspecified,
            EM_SPARC => Machine::Sparc,
            EM_386 => Machine::Ia32,
            EM_MIPS => Machine::Mips,
            EM_PPC => Machine::PowerPc,
            EM_ARM => Machine::Arm,
            EM_SH => Machine::SuperH,
            EM_IA_64 => Machine::Itanium,
            EM_X86_64 => Machine::Amd64,
            EM_AARCH64 => Machine::Aarch64,
            EM_RISCV => Machine::RiscV,
            other => Machine::Unknown(other),
        }
    }

    pub fn raw(self) -> u16 {
        match self {
            Machine::Unspecified => EM_NONE,
            Machine::Sparc => EM_SPARC,
            Machine::Ia32 => EM_386,
            Machine::Mips => EM_MIPS,
            Machine::PowerPc => EM_PPC,
            Machine::Arm => EM_ARM,
            Machine::SuperH => EM_SH,
            Machine::Itanium => EM_IA_64,
            Machine::Amd64 => EM_X86_64,
            Machine::Aarch64 => EM_AARCH64,
            Machine::RiscV => EM_RISCV,
            Machine::Unknown(raw) => raw,
        }
    }

    pub fn is_known(self) -> bool {
        !matches!(self, Machine::Unknown(_))
    }
}

impl fmt::Display for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Machine::Unspecified => "None",
            Machine::Sparc => "SPARC",
            Machine::Ia32 => "Intel 80386",
            Machine::Mips => "MIPS",
            Machine::PowerPc => "PowerPC",
            Machine::Arm => "ARM",
            Machine::SuperH => "SuperH",
            Machine::Itanium => "Intel IA-64",
            Machine::Amd64 => "AMD x86-64",
            Machine::Aarch64 => "AArch64",
            Machine::RiscV => "RISC-V",
            Machine::Unknown(raw) => return write!(f, "<unknown: {raw:#x}>"),
        };
        f.write_str(name)
    }
}
