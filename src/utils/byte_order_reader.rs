/*
This code is part of the WhiteboxTools geospatial analysis library.
Authors: WhiteboxTools developers
Created: 02/03/2024
Last Modified: 16/10/2026
License: MIT
*/
use byteorder::{ByteOrder, ReadBytesExt};
use std::io::prelude::*;
use std::io::{Result, SeekFrom};

/// A position-tracking binary reader. There is no reader-wide byte order;
/// every read names the order of the field it decodes, e.g.
/// `bor.read_i32::<BigEndian>()`.
pub struct ByteOrderReader<R: Read + Seek> {
    reader: R,
    pos: usize,
    len: usize,
}

impl<R: Read + Seek> ByteOrderReader<R> {
    pub fn new(mut reader: R) -> Result<ByteOrderReader<R>> {
        let len = reader.seek(SeekFrom::End(0))? as usize;
        reader.seek(SeekFrom::Start(0))?;
        Ok(ByteOrderReader {
            reader: reader,
            pos: 0usize,
            len: len,
        })
    }

    pub fn seek(&mut self, position: usize) -> Result<()> {
        self.reader.seek(SeekFrom::Start(position as u64))?;
        self.pos = position;
        Ok(())
    }

    pub fn inc_pos(&mut self, skip: usize) -> Result<()> {
        self.seek(self.pos + skip)
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of bytes between the current position and the end of the source.
    pub fn remaining(&self) -> usize {
        self.len.saturating_sub(self.pos)
    }

    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.reader.read_exact(buf)?;
        self.pos += buf.len();
        Ok(())
    }

    pub fn read_bytes(&mut self, length: usize) -> Result<Vec<u8>> {
        let mut bytes = vec![0u8; length];
        self.read_exact(&mut bytes)?;
        Ok(bytes)
    }

    pub fn read_i32<B: ByteOrder>(&mut self) -> Result<i32> {
        let val = self.reader.read_i32::<B>()?;
        self.pos += 4;
        Ok(val)
    }

    pub fn read_f64<B: ByteOrder>(&mut self) -> Result<f64> {
        let val = self.reader.read_f64::<B>()?;
        self.pos += 8;
        Ok(val)
    }

    /// Reads `n` consecutive doubles.
    pub fn read_f64_vec<B: ByteOrder>(&mut self, n: usize) -> Result<Vec<f64>> {
        let mut ret = Vec::with_capacity(n);
        for _ in 0..n {
            ret.push(self.read_f64::<B>()?);
        }
        Ok(ret)
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}
