/*
This code is part of the WhiteboxTools geospatial analysis library.
Authors: WhiteboxTools developers
Created: 02/03/2024
Last Modified: 16/10/2026
License: MIT

Notes: The .shx index is the 100-byte header followed by one 8-byte entry per
record: the record's offset and content length, both big-endian 32-bit
integers counted in 16-bit words.
*/
use super::geometry::ShapeType;
use super::header::{ShapefileHeader, HEADER_LENGTH};
use crate::error::{Result, ShapefileError};
use crate::utils::{ByteOrderReader, ByteOrderWriter};
use byteorder::BigEndian;
use std::fs::File;
use std::io::prelude::*;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Length of one index entry, and of a record header in the .shp, in bytes.
pub const ENTRY_LENGTH: usize = 8;

/// Location of one record in the .shp file. Both values are in bytes; the
/// content length excludes the 8-byte record header.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct IndexEntry {
    pub offset: u32,
    pub content_length: u32,
}

impl IndexEntry {
    pub fn new(offset: u32, content_length: u32) -> IndexEntry {
        IndexEntry {
            offset: offset,
            content_length: content_length,
        }
    }
}

fn read_words<R: Read + Seek>(
    bor: &mut ByteOrderReader<R>,
    record: usize,
    field: &'static str,
) -> Result<u32> {
    let offset = bor.pos() as u64;
    let words = bor.read_i32::<BigEndian>()?;
    if words < 0 {
        return Err(ShapefileError::CorruptIndex {
            record: record,
            offset: offset,
            field: field,
            expected: 0,
            found: words as i64,
        });
    }
    Ok(words as u32 * 2)
}

/// Reads every entry of an index stream, from byte 100 to the end.
pub fn decode_all<R: Read + Seek>(bor: &mut ByteOrderReader<R>) -> Result<Vec<IndexEntry>> {
    if bor.len() < HEADER_LENGTH {
        return Err(ShapefileError::TruncatedStream {
            record: 0,
            offset: 0,
            expected: HEADER_LENGTH,
            available: bor.len(),
        });
    }
    let body = bor.len() - HEADER_LENGTH;
    let num_entries = body / ENTRY_LENGTH;
    if body % ENTRY_LENGTH != 0 {
        return Err(ShapefileError::CorruptIndex {
            record: num_entries + 1,
            offset: (HEADER_LENGTH + num_entries * ENTRY_LENGTH) as u64,
            field: "trailing index bytes",
            expected: 0,
            found: (body % ENTRY_LENGTH) as i64,
        });
    }

    bor.seek(HEADER_LENGTH)?;
    let mut entries = Vec::with_capacity(num_entries);
    for i in 0..num_entries {
        let offset = read_words(bor, i + 1, "record offset")?;
        let content_length = read_words(bor, i + 1, "content length")?;
        entries.push(IndexEntry::new(offset, content_length));
    }
    Ok(entries)
}

/// Writes one entry; both values are given in bytes.
pub fn append_entry<W: Write>(
    bow: &mut ByteOrderWriter<W>,
    offset: u32,
    content_length: u32,
) -> Result<()> {
    bow.write_i32::<BigEndian>((offset / 2) as i32)?;
    bow.write_i32::<BigEndian>((content_length / 2) as i32)?;
    Ok(())
}

/// Recovers the index of a .shp stream by walking its record headers.
pub fn rebuild_from_shp<R: Read + Seek>(bor: &mut ByteOrderReader<R>) -> Result<Vec<IndexEntry>> {
    let mut entries = vec![];
    bor.seek(HEADER_LENGTH)?;
    while bor.remaining() > 0 {
        let record = entries.len() + 1;
        let offset = bor.pos();
        if bor.remaining() < ENTRY_LENGTH {
            return Err(ShapefileError::TruncatedStream {
                record: record,
                offset: offset as u64,
                expected: ENTRY_LENGTH,
                available: bor.remaining(),
            });
        }
        let record_number = bor.read_i32::<BigEndian>()?;
        if record_number != record as i32 {
            return Err(ShapefileError::CorruptIndex {
                record: record,
                offset: offset as u64,
                field: "record number",
                expected: record as i64,
                found: record_number as i64,
            });
        }
        let content_length = read_words(bor, record, "content length")?;
        if (content_length as usize) > bor.remaining() {
            return Err(ShapefileError::TruncatedStream {
                record: record,
                offset: offset as u64,
                expected: content_length as usize,
                available: bor.remaining(),
            });
        }
        entries.push(IndexEntry::new(offset as u32, content_length));
        bor.inc_pos(content_length as usize)?;
    }
    debug!("Rebuilt index of {} records from record headers", entries.len());
    Ok(entries)
}

/// Reads a .shx file, checking that it describes the same shape type as the
/// .shp header it accompanies.
pub fn read_index_file(path: &Path, expected: ShapeType) -> Result<Vec<IndexEntry>> {
    let mut bor = ByteOrderReader::new(BufReader::new(File::open(path)?))?;
    if bor.len() < HEADER_LENGTH {
        return Err(ShapefileError::TruncatedStream {
            record: 0,
            offset: 0,
            expected: HEADER_LENGTH,
            available: bor.len(),
        });
    }
    let mut bytes = [0u8; HEADER_LENGTH];
    bor.read_exact(&mut bytes)?;
    let header = ShapefileHeader::decode(&bytes)?;
    if header.shape_type != expected {
        return Err(ShapefileError::CorruptIndex {
            record: 0,
            offset: 32,
            field: "index file shape type",
            expected: expected.to_int() as i64,
            found: header.shape_type.to_int() as i64,
        });
    }
    decode_all(&mut bor)
}
