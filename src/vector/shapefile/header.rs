/*
This code is part of the WhiteboxTools geospatial analysis library.
Authors: WhiteboxTools developers
Created: 21/06/2017
Last Modified: 16/10/2026
License: MIT

Notes: The 100-byte header shared by .shp and .shx files. The format uses
mixed endianness: the file code and file length are big-endian while the
version, shape type and bounding box are little-endian.
*/
use super::geometry::{CoordinateProfile, Extent, GeometryKind, ShapeType};
use crate::error::{Result, ShapefileError};
use crate::utils::{ByteOrderReader, ByteOrderWriter};
use byteorder::{BigEndian, LittleEndian};
use std::f64;
use std::fmt;
use std::io::Cursor;
use tracing::warn;

/// Value of the file-code field of every .shp and .shx file.
pub const FILE_CODE: i32 = 9994;
/// Value of the version field.
pub const VERSION: i32 = 1000;
/// Length of the header in bytes.
pub const HEADER_LENGTH: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct ShapefileHeader {
    file_code: i32,            // BigEndian; value is 9994
    pub file_length: i32,      // BigEndian; in 16-bit words
    pub version: i32,          // LittleEndian
    pub shape_type: ShapeType, // LittleEndian
    pub x_min: f64,            // LittleEndian
    pub y_min: f64,            // LittleEndian
    pub x_max: f64,            // LittleEndian
    pub y_max: f64,            // LittleEndian
    pub z_min: f64,            // LittleEndian; f64::MAX when the file has no z data
    pub z_max: f64,            // LittleEndian; f64::MIN when the file has no z data
    pub m_min: f64,            // LittleEndian; f64::MAX when the file has no measures
    pub m_max: f64,            // LittleEndian; f64::MIN when the file has no measures
}

impl ShapefileHeader {
    /// A header for an empty file of the given type.
    pub fn new(shape_type: ShapeType) -> ShapefileHeader {
        let mut header = ShapefileHeader {
            file_code: FILE_CODE,
            file_length: (HEADER_LENGTH / 2) as i32,
            version: VERSION,
            shape_type: shape_type,
            x_min: 0f64,
            y_min: 0f64,
            x_max: 0f64,
            y_max: 0f64,
            z_min: 0f64,
            z_max: 0f64,
            m_min: 0f64,
            m_max: 0f64,
        };
        header.set_extent(&Extent::default());
        header
    }

    pub fn decode(bytes: &[u8; HEADER_LENGTH]) -> Result<ShapefileHeader> {
        let mut bor = ByteOrderReader::new(Cursor::new(&bytes[..]))?;

        let file_code = bor.read_i32::<BigEndian>()?;
        if file_code != FILE_CODE {
            return Err(ShapefileError::InvalidMagic { found: file_code });
        }
        bor.seek(24)?; // five unused big-endian fields
        let file_length = bor.read_i32::<BigEndian>()?;

        let version = bor.read_i32::<LittleEndian>()?;
        if version != VERSION {
            warn!("Unexpected shapefile version {} (expected {})", version, VERSION);
        }
        let tag = bor.read_i32::<LittleEndian>()?;
        let shape_type = match ShapeType::from_int(tag) {
            Some(st) if st != ShapeType::Null => st,
            _ => {
                return Err(ShapefileError::UnsupportedShapeType {
                    tag: tag,
                    record: None,
                })
            }
        };

        Ok(ShapefileHeader {
            file_code: file_code,
            file_length: file_length,
            version: version,
            shape_type: shape_type,
            x_min: bor.read_f64::<LittleEndian>()?,
            y_min: bor.read_f64::<LittleEndian>()?,
            x_max: bor.read_f64::<LittleEndian>()?,
            y_max: bor.read_f64::<LittleEndian>()?,
            z_min: bor.read_f64::<LittleEndian>()?,
            z_max: bor.read_f64::<LittleEndian>()?,
            m_min: bor.read_f64::<LittleEndian>()?,
            m_max: bor.read_f64::<LittleEndian>()?,
        })
    }

    /// Serializes the header. Z and M ranges the shape type does not carry
    /// are written as the empty-range sentinel `(f64::MAX, f64::MIN)`.
    pub fn encode(&self) -> Result<[u8; HEADER_LENGTH]> {
        let profile = self.shape_type.profile();
        let (z_min, z_max) = if profile.has_z() {
            (self.z_min, self.z_max)
        } else {
            (f64::MAX, f64::MIN)
        };
        let (m_min, m_max) = if profile.has_m() {
            (self.m_min, self.m_max)
        } else {
            (f64::MAX, f64::MIN)
        };

        let mut out = [0u8; HEADER_LENGTH];
        let mut bow = ByteOrderWriter::new(Cursor::new(&mut out[..]));
        bow.write_i32::<BigEndian>(FILE_CODE)?;
        for _ in 0..5 {
            bow.write_i32::<BigEndian>(0i32)?;
        }
        bow.write_i32::<BigEndian>(self.file_length)?;
        bow.write_i32::<LittleEndian>(VERSION)?;
        bow.write_i32::<LittleEndian>(self.shape_type.to_int())?;
        bow.write_f64::<LittleEndian>(self.x_min)?;
        bow.write_f64::<LittleEndian>(self.y_min)?;
        bow.write_f64::<LittleEndian>(self.x_max)?;
        bow.write_f64::<LittleEndian>(self.y_max)?;
        bow.write_f64::<LittleEndian>(z_min)?;
        bow.write_f64::<LittleEndian>(z_max)?;
        bow.write_f64::<LittleEndian>(m_min)?;
        bow.write_f64::<LittleEndian>(m_max)?;
        debug_assert_eq!(bow.get_num_bytes_written(), HEADER_LENGTH);
        Ok(out)
    }

    pub fn geometry_kind(&self) -> Option<GeometryKind> {
        self.shape_type.kind()
    }

    pub fn coordinate_profile(&self) -> CoordinateProfile {
        self.shape_type.profile()
    }

    /// The declared file length in bytes.
    pub fn file_length_bytes(&self) -> u64 {
        self.file_length as u64 * 2
    }

    /// Copies an aggregate extent into the bounding-box fields. An empty XY
    /// box is stored as zeros; an absent or empty Z or M range becomes the
    /// `(f64::MAX, f64::MIN)` sentinel.
    pub fn set_extent(&mut self, extent: &Extent) {
        let bb = &extent.bounding_box;
        if bb.is_empty() {
            self.x_min = 0f64;
            self.y_min = 0f64;
            self.x_max = 0f64;
            self.y_max = 0f64;
        } else {
            self.x_min = bb.min_x;
            self.y_min = bb.min_y;
            self.x_max = bb.max_x;
            self.y_max = bb.max_y;
        }
        match extent.z_range {
            Some(r) if !r.is_empty() => {
                self.z_min = r.min;
                self.z_max = r.max;
            }
            _ => {
                self.z_min = f64::MAX;
                self.z_max = f64::MIN;
            }
        }
        match extent.m_range {
            Some(r) if !r.is_empty() => {
                self.m_min = r.min;
                self.m_max = r.max;
            }
            _ => {
                self.m_min = f64::MAX;
                self.m_max = f64::MIN;
            }
        }
    }
}

impl fmt::Display for ShapefileHeader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "file_code: {}
file_length: {}
version: {}
shape_type: {}
x_min: {}
x_max: {}
y_min: {}
y_max: {}
z_min: {}
z_max: {}
m_min: {}
m_max: {}",
            self.file_code,
            self.file_length,
            self.version,
            self.shape_type,
            self.x_min,
            self.x_max,
            self.y_min,
            self.y_max,
            self.z_min,
            self.z_max,
            self.m_min,
            self.m_max
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::structures::{BoundingBox, ValueRange};

    #[test]
    fn test_header_layout() {
        let mut header = ShapefileHeader::new(ShapeType::PolyLineZ);
        header.file_length = 1234;
        header.set_extent(&Extent {
            bounding_box: BoundingBox::new(-1.0, 2.0, -3.0, 4.0),
            z_range: Some(ValueRange::new(5.0, 6.0)),
            m_range: Some(ValueRange::new(7.0, 8.0)),
        });
        let bytes = header.encode().unwrap();
        assert_eq!(&bytes[0..4], &9994i32.to_be_bytes());
        assert_eq!(&bytes[4..24], &[0u8; 20]);
        assert_eq!(&bytes[24..28], &1234i32.to_be_bytes());
        assert_eq!(&bytes[28..32], &1000i32.to_le_bytes());
        assert_eq!(&bytes[32..36], &13i32.to_le_bytes());
        assert_eq!(&bytes[36..44], &(-1.0f64).to_le_bytes()); // x_min
        assert_eq!(&bytes[44..52], &(-3.0f64).to_le_bytes()); // y_min
        assert_eq!(&bytes[52..60], &2.0f64.to_le_bytes()); // x_max
        assert_eq!(&bytes[60..68], &4.0f64.to_le_bytes()); // y_max
        assert_eq!(&bytes[68..76], &5.0f64.to_le_bytes()); // z_min
        assert_eq!(&bytes[92..100], &8.0f64.to_le_bytes()); // m_max

        let decoded = ShapefileHeader::decode(&bytes).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(decoded.file_length_bytes(), 2468);
        assert_eq!(decoded.geometry_kind(), Some(GeometryKind::PolyLine));
        assert_eq!(decoded.coordinate_profile(), CoordinateProfile::PlanarZ);
    }

    #[test]
    fn test_unused_ranges_use_sentinel() {
        let mut header = ShapefileHeader::new(ShapeType::PointM);
        // values a planar-M file does not carry are overridden on encode
        header.z_min = 1.0;
        header.z_max = 2.0;
        header.m_min = 3.0;
        header.m_max = 4.0;
        let decoded = ShapefileHeader::decode(&header.encode().unwrap()).unwrap();
        assert_eq!(decoded.z_min, f64::MAX);
        assert_eq!(decoded.z_max, f64::MIN);
        assert_eq!(decoded.m_min, 3.0);
        assert_eq!(decoded.m_max, 4.0);
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = ShapefileHeader::new(ShapeType::Point).encode().unwrap();
        bytes[3] = 0;
        match ShapefileHeader::decode(&bytes) {
            Err(ShapefileError::InvalidMagic { found }) => assert_eq!(found, 9984),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_shape_types() {
        let mut bytes = ShapefileHeader::new(ShapeType::Point).encode().unwrap();
        bytes[32..36].copy_from_slice(&31i32.to_le_bytes()); // MultiPatch
        assert!(matches!(
            ShapefileHeader::decode(&bytes),
            Err(ShapefileError::UnsupportedShapeType { tag: 31, record: None })
        ));
        bytes[32..36].copy_from_slice(&0i32.to_le_bytes()); // Null
        assert!(matches!(
            ShapefileHeader::decode(&bytes),
            Err(ShapefileError::UnsupportedShapeType { tag: 0, .. })
        ));
    }
}
