//! Bounds-checked walk over a fixed-stride header table.

use std::iter::FusedIterator;

use crate::endian::FieldReader;
use crate::error::{DecodeError, DecodeResult};

/// Location of a header table inside the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TableSpec {
    pub offset: u64,
    pub count: u16,
    pub entry_size: usize,
}

/// Iterator over the entries of a program or section header table.
///
/// Every slot is bounds-checked before any of its fields are read. The first
/// slot that does not fit in the buffer yields `OutOfBounds`, after which the
/// iterator is exhausted, so a bogus count costs at most one failed check.
pub struct TableIter<'a, T> {
    reader: FieldReader<'a>,
    buf_len: usize,
    spec: TableSpec,
    index: u16,
    done: bool,
    decode: fn(&FieldReader<'a>) -> DecodeResult<T>,
}

impl<'a, T> TableIter<'a, T> {
    pub(crate) fn new(
        reader: FieldReader<'a>,
        buf_len: usize,
        spec: TableSpec,
        decode: fn(&FieldReader<'a>) -> DecodeResult<T>,
    ) -> Self {
        Self {
            reader,
            buf_len,
            spec,
            index: 0,
            done: false,
            decode,
        }
    }

    /// An iterator that yields nothing.
    pub(crate) fn empty(
        reader: FieldReader<'a>,
        decode: fn(&FieldReader<'a>) -> DecodeResult<T>,
    ) -> Self {
        Self {
            reader,
            buf_len: 0,
            spec: TableSpec {
                offset: 0,
                count: 0,
                entry_size: 0,
            },
            index: 0,
            done: true,
            decode,
        }
    }

    fn slot_offset(&self) -> DecodeResult<usize> {
        let width = self.spec.entry_size as u64;
        let out_of_bounds = |offset: u64| DecodeError::OutOfBounds {
            offset,
            width,
            len: self.buf_len,
        };

        let start = u64::from(self.index)
            .checked_mul(width)
            .and_then(|rel| self.spec.offset.checked_add(rel))
            .ok_or(out_of_bounds(self.spec.offset))?;
        match start.checked_add(width) {
            Some(end) if end <= self.buf_len as u64 => Ok(start as usize),
            _ => Err(out_of_bounds(start)),
        }
    }
}

impl<T> Iterator for TableIter<'_, T> {
    type Item = DecodeResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.index >= self.spec.count {
            return None;
        }

        let item = self
            .slot_offset()
            .and_then(|offset| (self.decode)(&self.reader.at(offset)));
        match &item {
            Ok(_) => log::trace!("table entry {} decoded", self.index),
            Err(err) => {
                log::debug!("table entry {} rejected: {err}", self.index);
                self.done = true;
            }
        }
        self.index += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            return (0, Some(0));
        }
        let remaining = usize::from(self.spec.count - self.index);
        (0, Some(remaining))
    }
}

impl<T> FusedIterator for TableIter<'_, T> {}
