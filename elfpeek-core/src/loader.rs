use anyhow::{Context, Result};
use std::path::Path;

/// Reads a whole file into memory for decoding.
///
/// Failures here are I/O problems, never [`DecodeError`](crate::DecodeError)s.
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let buf = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    log::info!("read {} bytes from {}", buf.len(), path.display());
    Ok(buf)
}
