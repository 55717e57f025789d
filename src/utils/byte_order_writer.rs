/*
This code is part of the WhiteboxTools geospatial analysis library.
Authors: WhiteboxTools developers
Created: 02/03/2024
Last Modified: 16/10/2026
License: MIT
*/
use byteorder::{ByteOrder, WriteBytesExt};
use std::io::prelude::*;
use std::io::Error;

/// Counterpart of `ByteOrderReader`: each write names its byte order and the
/// writer keeps a running count of bytes written.
pub struct ByteOrderWriter<W: Write> {
    writer: W,
    num_bytes_written: usize,
}

impl<W: Write> ByteOrderWriter<W> {
    pub fn new(writer: W) -> ByteOrderWriter<W> {
        ByteOrderWriter::<W> {
            writer: writer,
            num_bytes_written: 0,
        }
    }

    pub fn get_num_bytes_written(&self) -> usize {
        self.num_bytes_written
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.writer.write_all(bytes)?;
        self.num_bytes_written += bytes.len();
        Ok(())
    }

    pub fn write_i32<B: ByteOrder>(&mut self, value: i32) -> Result<(), Error> {
        self.writer.write_i32::<B>(value)?;
        self.num_bytes_written += 4;
        Ok(())
    }

    pub fn write_f64<B: ByteOrder>(&mut self, value: f64) -> Result<(), Error> {
        self.writer.write_f64::<B>(value)?;
        self.num_bytes_written += 8;
        Ok(())
    }

    pub fn write_f64_slice<B: ByteOrder>(&mut self, values: &[f64]) -> Result<(), Error> {
        for v in values {
            self.write_f64::<B>(*v)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), Error> {
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod test {
    use super::ByteOrderWriter;
    use byteorder::{BigEndian, LittleEndian};

    #[test]
    fn test_mixed_byte_orders() {
        let mut bow = ByteOrderWriter::new(Vec::new());
        bow.write_i32::<BigEndian>(9994).unwrap();
        bow.write_i32::<LittleEndian>(1000).unwrap();
        bow.write_f64_slice::<LittleEndian>(&[1.0, -2.0]).unwrap();
        assert_eq!(bow.get_num_bytes_written(), 24);
        let bytes = bow.into_inner();
        assert_eq!(&bytes[0..4], &[0x00, 0x00, 0x27, 0x0a]);
        assert_eq!(&bytes[4..8], &[0xe8, 0x03, 0x00, 0x00]);
        assert_eq!(&bytes[16..24], &(-2.0f64).to_le_bytes());
    }
}
