//! Read-only decoder for ELF identification blocks, file headers and
//! program/section header tables.
//!
//! Decoding is split into stages that each take the raw buffer plus the
//! output of the previous stage:
//!
//! ```no_run
//! use elfpeek_core::{decode_header, decode_program_table, validate_identity};
//!
//! let buf = std::fs::read("/bin/true").unwrap();
//! let identity = validate_identity(&buf).unwrap();
//! let header = decode_header(&buf, identity).unwrap();
//! for segment in decode_program_table(&buf, &header).unwrap() {
//!     println!("{} {}", segment.entry_type, segment.flags);
//! }
//! ```

pub mod binary;
pub mod endian;
pub mod error;
#[cfg(test)]
mod fixture;
pub mod header;
pub mod ident;
pub mod loader;
pub mod sections;
pub mod segments;
mod table;

pub use binary::*;
pub use endian::{decode_int, ByteOrder};
pub use error::*;
pub use header::*;
pub use ident::*;
pub use loader::read_file;
pub use sections::*;
pub use segments::*;
pub use table::TableIter;

/// Decoding policy shared by every stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Fail on unrecognized file types and machines instead of keeping them
    /// as `Unknown(raw)`.
    pub strict: bool,
    /// Accept OS/ABI values other than System V.
    pub allow_foreign_abi: bool,
}
