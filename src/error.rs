/*
This code is part of the WhiteboxTools geospatial analysis library.
Authors: WhiteboxTools developers
Created: 16/10/2026
Last Modified: 16/10/2026
License: MIT
*/

//! Error types for shapefile reading and writing.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShapefileError {
    // Header errors
    #[error("Not a shapefile: file code is {found}, expected 9994")]
    InvalidMagic { found: i32 },

    #[error("Unsupported shape type {tag}{}", record_context(*record))]
    UnsupportedShapeType { tag: i32, record: Option<usize> },

    // Record/index structure errors
    #[error("Corrupt index at record {record} (byte offset {offset}): {field} is {found}, expected {expected}")]
    CorruptIndex {
        record: usize,
        offset: u64,
        field: &'static str,
        expected: i64,
        found: i64,
    },

    #[error("Truncated stream at record {record} (byte offset {offset}): {expected} bytes required, {available} available")]
    TruncatedStream {
        record: usize,
        offset: u64,
        expected: usize,
        available: usize,
    },

    #[error("Record {record} has shape type {found}, but the file holds {expected} records")]
    ShapeTypeMismatch {
        record: usize,
        expected: i32,
        found: i32,
    },

    #[error("Malformed record {record} (byte offset {offset}): {reason}")]
    MalformedRecord {
        record: usize,
        offset: u64,
        reason: String,
    },

    #[error("Malformed shape: {reason}")]
    MalformedShape { reason: String },

    // Access errors
    #[error("Record index {index} is out of range; the file has {count} records")]
    RecordOutOfRange { index: usize, count: usize },

    #[error("Record {index} was skipped while loading and is not available")]
    RecordUnavailable { index: usize },

    #[error("Operation not allowed while the shapefile is {state}: {operation}")]
    InvalidState {
        state: &'static str,
        operation: &'static str,
    },

    #[error("Output would exceed the 32-bit file length limit ({bytes} bytes)")]
    FileTooLarge { bytes: u64 },

    // Configuration errors
    #[error("Invalid configuration file {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ShapefileError {
    /// Errors local to a single record, which a `Skip` policy may pass over.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            ShapefileError::CorruptIndex { .. }
                | ShapefileError::MalformedRecord { .. }
                | ShapefileError::ShapeTypeMismatch { .. }
        )
    }
}

fn record_context(record: Option<usize>) -> String {
    match record {
        Some(r) => format!(" in record {}", r),
        None => " in file header".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, ShapefileError>;
