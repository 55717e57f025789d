/*
This code is part of the WhiteboxTools geospatial analysis library.
Authors: WhiteboxTools developers
Created: 21/06/2017
Last Modified: 16/10/2026
License: MIT

Notes: Encoding and decoding of individual shape records. A record is an
8-byte big-endian header (record number, content length in 16-bit words)
followed by the little-endian content. The measure block of every geometry
kind is optional-by-length: it is read only when the declared content
length leaves room for it.
*/
use super::geometry::{
    CoordinateProfile, Extent, GeometryKind, PartRange, Shape, ShapeType,
};
use super::index::{IndexEntry, ENTRY_LENGTH};
use crate::error::{Result, ShapefileError};
use crate::structures::{BoundingBox, Point2D, ValueRange};
use crate::utils::{ByteOrderReader, ByteOrderWriter};
use byteorder::{BigEndian, LittleEndian};
use std::io::prelude::*;
use std::io::Cursor;

/// Length of the record header (record number and content length).
pub const RECORD_HEADER_LENGTH: usize = ENTRY_LENGTH;

/// Encoder/decoder for the records of one shapefile. The geometry kind picks
/// the layout of the record's middle section; the profile decides which Z
/// and M blocks follow it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RecordCodec {
    kind: GeometryKind,
    profile: CoordinateProfile,
}

impl RecordCodec {
    pub fn new(kind: GeometryKind, profile: CoordinateProfile) -> RecordCodec {
        RecordCodec {
            kind: kind,
            profile: profile,
        }
    }

    /// The codec for a file of the given type; `None` for Null.
    pub fn for_shape_type(shape_type: ShapeType) -> Option<RecordCodec> {
        shape_type
            .kind()
            .map(|kind| RecordCodec::new(kind, shape_type.profile()))
    }

    pub fn kind(&self) -> GeometryKind {
        self.kind
    }

    pub fn profile(&self) -> CoordinateProfile {
        self.profile
    }

    pub fn shape_type(&self) -> ShapeType {
        ShapeType::from_parts(self.kind, self.profile)
    }

    /// Whether the M block is written. Z records always carry one; it is
    /// filled with zeros when the shape has no measures.
    fn writes_m(&self, shape: &Shape) -> bool {
        self.profile.has_z() || (self.profile.has_m() && shape.measures().is_some())
    }

    /// The exact number of content bytes `encode_content` produces for the
    /// shape, excluding the 8-byte record header.
    pub fn content_length(&self, shape: &Shape) -> u32 {
        if shape.is_null() {
            return 4;
        }
        let n = shape.num_points() as u32;
        let p = shape.num_parts() as u32;
        let has_z = self.profile.has_z();
        let has_m = self.writes_m(shape);
        match self.kind {
            GeometryKind::Point => {
                let mut ret = 20;
                if has_z {
                    ret += 8;
                }
                if has_m {
                    ret += 8;
                }
                ret
            }
            GeometryKind::MultiPoint | GeometryKind::PolyLine | GeometryKind::Polygon => {
                let mut ret = if self.kind == GeometryKind::MultiPoint {
                    40 + 16 * n
                } else {
                    44 + 4 * p + 16 * n
                };
                if has_z {
                    ret += 16 + 8 * n;
                }
                if has_m {
                    ret += 16 + 8 * n;
                }
                ret
            }
        }
    }

    fn check_shape(&self, shape: &Shape) -> Result<()> {
        if shape.is_null() {
            return Ok(());
        }
        if shape.shape_type() != self.shape_type() {
            return Err(ShapefileError::MalformedShape {
                reason: format!(
                    "a {} shape cannot be written to a {} file",
                    shape.shape_type(),
                    self.shape_type()
                ),
            });
        }
        if self.profile.has_z() && shape.elevations().is_none() {
            return Err(ShapefileError::MalformedShape {
                reason: format!("a {} shape needs z values", self.shape_type()),
            });
        }
        if shape.num_points() > (i32::MAX as usize) / 32 {
            return Err(ShapefileError::MalformedShape {
                reason: format!("{} points do not fit in one record", shape.num_points()),
            });
        }
        Ok(())
    }

    /// Serializes the record content (shape type onwards). Bounding box, Z
    /// range and M range are recomputed from the shape's own values.
    pub fn encode_content(&self, shape: &Shape) -> Result<Vec<u8>> {
        self.check_shape(shape)?;
        let expected = self.content_length(shape) as usize;
        let mut bow = ByteOrderWriter::new(Vec::with_capacity(expected));
        self.write_content(&mut bow, shape)?;
        debug_assert_eq!(bow.get_num_bytes_written(), expected);
        Ok(bow.into_inner())
    }

    /// Serializes a full record: header followed by content.
    pub fn encode_record(&self, record_number: u32, shape: &Shape) -> Result<Vec<u8>> {
        let content = self.encode_content(shape)?;
        let mut bow = ByteOrderWriter::new(Vec::with_capacity(RECORD_HEADER_LENGTH + content.len()));
        bow.write_i32::<BigEndian>(record_number as i32)?;
        bow.write_i32::<BigEndian>((content.len() / 2) as i32)?;
        bow.write_bytes(&content)?;
        Ok(bow.into_inner())
    }

    fn write_content<W: Write>(&self, bow: &mut ByteOrderWriter<W>, shape: &Shape) -> Result<()> {
        bow.write_i32::<LittleEndian>(shape.shape_type().to_int())?;
        if shape.is_null() {
            return Ok(());
        }

        let points = shape.vertices();
        let no_measures: Vec<f64>;
        let measures = if !self.writes_m(shape) {
            None
        } else if let Some(m) = shape.measures() {
            Some(m)
        } else {
            no_measures = vec![0f64; points.len()];
            Some(&no_measures[..])
        };
        let elevations = if self.profile.has_z() {
            shape.elevations()
        } else {
            None
        };

        match self.kind {
            GeometryKind::Point => {
                bow.write_f64::<LittleEndian>(points[0].x)?;
                bow.write_f64::<LittleEndian>(points[0].y)?;
                if let Some(z) = elevations {
                    bow.write_f64::<LittleEndian>(z[0])?;
                }
                if let Some(m) = measures {
                    bow.write_f64::<LittleEndian>(m[0])?;
                }
                return Ok(());
            }
            GeometryKind::MultiPoint => {
                write_bounding_box(bow, &BoundingBox::from_points(points))?;
                bow.write_i32::<LittleEndian>(points.len() as i32)?;
            }
            GeometryKind::PolyLine | GeometryKind::Polygon => {
                write_bounding_box(bow, &BoundingBox::from_points(points))?;
                bow.write_i32::<LittleEndian>(shape.num_parts() as i32)?;
                bow.write_i32::<LittleEndian>(points.len() as i32)?;
                for part in shape.parts() {
                    bow.write_i32::<LittleEndian>(part.start as i32)?;
                }
            }
        }

        for pt in points {
            bow.write_f64::<LittleEndian>(pt.x)?;
            bow.write_f64::<LittleEndian>(pt.y)?;
        }
        if let Some(z) = elevations {
            write_value_block(bow, z)?;
        }
        if let Some(m) = measures {
            write_value_block(bow, m)?;
        }
        Ok(())
    }

    /// Decodes the record at the reader's position. `record_index` is the
    /// 0-based position of the record and `entry` its index entry; the
    /// record's own header must agree with both.
    pub fn decode<R: Read + Seek>(
        &self,
        bor: &mut ByteOrderReader<R>,
        record_index: usize,
        entry: &IndexEntry,
    ) -> Result<Shape> {
        let record = record_index + 1;
        let offset = bor.pos() as u64;
        if bor.remaining() < RECORD_HEADER_LENGTH {
            return Err(ShapefileError::TruncatedStream {
                record: record,
                offset: offset,
                expected: RECORD_HEADER_LENGTH,
                available: bor.remaining(),
            });
        }

        let record_number = bor.read_i32::<BigEndian>()?;
        if record_number as i64 != record as i64 {
            return Err(ShapefileError::CorruptIndex {
                record: record,
                offset: offset,
                field: "record number",
                expected: record as i64,
                found: record_number as i64,
            });
        }
        let content_length = bor.read_i32::<BigEndian>()? as i64 * 2;
        if content_length != entry.content_length as i64 {
            return Err(ShapefileError::CorruptIndex {
                record: record,
                offset: offset + 4,
                field: "content length",
                expected: entry.content_length as i64,
                found: content_length,
            });
        }
        let content_length = content_length as usize;
        if bor.remaining() < content_length {
            return Err(ShapefileError::TruncatedStream {
                record: record,
                offset: offset,
                expected: content_length,
                available: bor.remaining(),
            });
        }

        let content = bor.read_bytes(content_length)?;
        let shape = self.decode_content(&content, record, offset + RECORD_HEADER_LENGTH as u64)?;
        Ok(shape.with_record_number(record as u32))
    }

    /// Decodes record content. No read crosses the end of `content`, which
    /// holds exactly the declared content length. `record` (1-based) and
    /// `offset` are used for error context only.
    pub fn decode_content(&self, content: &[u8], record: usize, offset: u64) -> Result<Shape> {
        let mut rd = ContentReader {
            bor: ByteOrderReader::new(Cursor::new(content))?,
            record: record,
            offset: offset,
        };

        rd.need(4)?;
        let tag = rd.bor.read_i32::<LittleEndian>()?;
        let shape_type = match ShapeType::from_int(tag) {
            Some(st) => st,
            None => {
                return Err(ShapefileError::UnsupportedShapeType {
                    tag: tag,
                    record: Some(record),
                })
            }
        };
        if shape_type == ShapeType::Null {
            return Ok(Shape::null());
        }
        if shape_type != self.shape_type() {
            return Err(ShapefileError::ShapeTypeMismatch {
                record: record,
                expected: self.shape_type().to_int(),
                found: tag,
            });
        }

        match self.kind {
            GeometryKind::Point => self.decode_point(&mut rd, shape_type),
            GeometryKind::MultiPoint => self.decode_multipoint(&mut rd, shape_type),
            GeometryKind::PolyLine | GeometryKind::Polygon => self.decode_poly(&mut rd, shape_type),
        }
    }

    fn decode_point(&self, rd: &mut ContentReader, shape_type: ShapeType) -> Result<Shape> {
        let mut required = 16;
        if self.profile.has_z() {
            required += 8;
        }
        rd.need(required)?;
        let p = Point2D::new(
            rd.bor.read_f64::<LittleEndian>()?,
            rd.bor.read_f64::<LittleEndian>()?,
        );
        let z = if self.profile.has_z() {
            Some(rd.bor.read_f64::<LittleEndian>()?)
        } else {
            None
        };
        let m = if self.profile.has_m() && rd.optional_block(8)? {
            Some(rd.bor.read_f64::<LittleEndian>()?)
        } else {
            None
        };

        let extent = Extent {
            bounding_box: BoundingBox::from_points(&[p]),
            z_range: z.map(|v| ValueRange::new(v, v)),
            m_range: m.map(|v| ValueRange::new(v, v)),
        };
        Ok(Shape::from_parts(
            shape_type,
            extent,
            vec![p],
            m.map(|v| vec![v]),
            z.map(|v| vec![v]),
            vec![PartRange::new(0, 1)],
        ))
    }

    fn decode_multipoint(&self, rd: &mut ContentReader, shape_type: ShapeType) -> Result<Shape> {
        rd.need(36)?;
        let bounding_box = read_bounding_box(&mut rd.bor)?;
        let num_points = rd.read_count("point count")?;

        rd.need(16 * num_points)?;
        let points = read_points(&mut rd.bor, num_points)?;
        let (elevations, z_range) = self.read_z_block(rd, num_points)?;
        let (measures, m_range) = self.read_m_block(rd, num_points)?;

        let extent = vertex_extent(num_points, bounding_box, z_range, m_range);
        Ok(Shape::from_parts(
            shape_type,
            extent,
            points,
            measures,
            elevations,
            vec![PartRange::new(0, num_points)],
        ))
    }

    fn decode_poly(&self, rd: &mut ContentReader, shape_type: ShapeType) -> Result<Shape> {
        rd.need(40)?;
        let bounding_box = read_bounding_box(&mut rd.bor)?;
        let num_parts = rd.read_count("part count")?;
        let num_points = rd.read_count("point count")?;

        rd.need(4 * num_parts + 16 * num_points)?;
        let mut starts = Vec::with_capacity(num_parts);
        for _ in 0..num_parts {
            starts.push(rd.bor.read_i32::<LittleEndian>()?);
        }
        let parts = rd.derive_parts(&starts, num_points)?;
        let points = read_points(&mut rd.bor, num_points)?;
        let (elevations, z_range) = self.read_z_block(rd, num_points)?;
        let (measures, m_range) = self.read_m_block(rd, num_points)?;

        let extent = vertex_extent(num_points, bounding_box, z_range, m_range);
        Ok(Shape::from_parts(
            shape_type, extent, points, measures, elevations, parts,
        ))
    }

    fn read_z_block(
        &self,
        rd: &mut ContentReader,
        num_points: usize,
    ) -> Result<(Option<Vec<f64>>, Option<ValueRange>)> {
        if !self.profile.has_z() {
            return Ok((None, None));
        }
        rd.need(16 + 8 * num_points)?;
        let (values, range) = read_value_block(&mut rd.bor, num_points)?;
        Ok((Some(values), Some(range)))
    }

    fn read_m_block(
        &self,
        rd: &mut ContentReader,
        num_points: usize,
    ) -> Result<(Option<Vec<f64>>, Option<ValueRange>)> {
        if !self.profile.has_m() || !rd.optional_block(16 + 8 * num_points)? {
            return Ok((None, None));
        }
        let (values, range) = read_value_block(&mut rd.bor, num_points)?;
        Ok((Some(values), Some(range)))
    }
}

/// Reader over one record's content with the context needed for errors.
struct ContentReader<'a> {
    bor: ByteOrderReader<Cursor<&'a [u8]>>,
    record: usize,
    offset: u64,
}

impl<'a> ContentReader<'a> {
    fn need(&self, bytes: usize) -> Result<()> {
        if self.bor.remaining() < bytes {
            return Err(ShapefileError::TruncatedStream {
                record: self.record,
                offset: self.offset + self.bor.pos() as u64,
                expected: bytes,
                available: self.bor.remaining(),
            });
        }
        Ok(())
    }

    /// Whether an optional trailing block of `bytes` is present. No bytes
    /// left means absent; a partial block is malformed.
    fn optional_block(&self, bytes: usize) -> Result<bool> {
        let remaining = self.bor.remaining();
        if remaining == 0 {
            return Ok(false);
        }
        if remaining < bytes {
            return Err(ShapefileError::MalformedRecord {
                record: self.record,
                offset: self.offset + self.bor.pos() as u64,
                reason: format!(
                    "{} trailing bytes cannot hold a {}-byte measure block",
                    remaining, bytes
                ),
            });
        }
        Ok(true)
    }

    fn read_count(&mut self, what: &str) -> Result<usize> {
        let pos = self.bor.pos();
        let n = self.bor.read_i32::<LittleEndian>()?;
        if n < 0 {
            return Err(ShapefileError::MalformedRecord {
                record: self.record,
                offset: self.offset + pos as u64,
                reason: format!("negative {} {}", what, n),
            });
        }
        Ok(n as usize)
    }

    fn derive_parts(&self, starts: &[i32], num_points: usize) -> Result<Vec<PartRange>> {
        let malformed = |reason: String| ShapefileError::MalformedRecord {
            record: self.record,
            offset: self.offset,
            reason: reason,
        };
        if starts.is_empty() {
            if num_points > 0 {
                return Err(malformed(format!("{} points but no parts", num_points)));
            }
            return Ok(vec![]);
        }
        if starts[0] != 0 {
            return Err(malformed(format!("first part starts at {}", starts[0])));
        }
        let mut parts = Vec::with_capacity(starts.len());
        for i in 0..starts.len() {
            let start = starts[i] as i64;
            let end = if i + 1 < starts.len() {
                starts[i + 1] as i64
            } else {
                num_points as i64
            };
            if end < start || end > num_points as i64 {
                return Err(malformed(format!(
                    "part {} spans vertices {}..{} of {}",
                    i, start, end, num_points
                )));
            }
            parts.push(PartRange::new(start as usize, (end - start) as usize));
        }
        Ok(parts)
    }
}

/// The extent of a decoded record. A record without vertices has an empty
/// extent whatever its stored box and ranges say.
fn vertex_extent(
    num_points: usize,
    bounding_box: BoundingBox,
    z_range: Option<ValueRange>,
    m_range: Option<ValueRange>,
) -> Extent {
    if num_points == 0 {
        return Extent {
            bounding_box: BoundingBox::default(),
            z_range: z_range.map(|_| ValueRange::default()),
            m_range: m_range.map(|_| ValueRange::default()),
        };
    }
    Extent {
        bounding_box: bounding_box,
        z_range: z_range,
        m_range: m_range,
    }
}

fn read_bounding_box<R: Read + Seek>(bor: &mut ByteOrderReader<R>) -> Result<BoundingBox> {
    Ok(BoundingBox {
        min_x: bor.read_f64::<LittleEndian>()?,
        min_y: bor.read_f64::<LittleEndian>()?,
        max_x: bor.read_f64::<LittleEndian>()?,
        max_y: bor.read_f64::<LittleEndian>()?,
    })
}

fn read_points<R: Read + Seek>(bor: &mut ByteOrderReader<R>, n: usize) -> Result<Vec<Point2D>> {
    let mut points = Vec::with_capacity(n);
    for _ in 0..n {
        points.push(Point2D::new(
            bor.read_f64::<LittleEndian>()?,
            bor.read_f64::<LittleEndian>()?,
        ));
    }
    Ok(points)
}

fn read_value_block<R: Read + Seek>(
    bor: &mut ByteOrderReader<R>,
    n: usize,
) -> Result<(Vec<f64>, ValueRange)> {
    let min = bor.read_f64::<LittleEndian>()?;
    let max = bor.read_f64::<LittleEndian>()?;
    let values = bor.read_f64_vec::<LittleEndian>(n)?;
    Ok((values, ValueRange::new(min, max)))
}

fn write_bounding_box<W: Write>(bow: &mut ByteOrderWriter<W>, bb: &BoundingBox) -> Result<()> {
    let (min_x, min_y, max_x, max_y) = if bb.is_empty() {
        (0f64, 0f64, 0f64, 0f64)
    } else {
        (bb.min_x, bb.min_y, bb.max_x, bb.max_y)
    };
    bow.write_f64::<LittleEndian>(min_x)?;
    bow.write_f64::<LittleEndian>(min_y)?;
    bow.write_f64::<LittleEndian>(max_x)?;
    bow.write_f64::<LittleEndian>(max_y)?;
    Ok(())
}

/// Writes a Z or M block: range then per-vertex values.
fn write_value_block<W: Write>(bow: &mut ByteOrderWriter<W>, values: &[f64]) -> Result<()> {
    let range = ValueRange::from_values(values);
    if range.is_empty() {
        bow.write_f64::<LittleEndian>(0f64)?;
        bow.write_f64::<LittleEndian>(0f64)?;
    } else {
        bow.write_f64::<LittleEndian>(range.min)?;
        bow.write_f64::<LittleEndian>(range.max)?;
    }
    bow.write_f64_slice::<LittleEndian>(values)?;
    Ok(())
}
