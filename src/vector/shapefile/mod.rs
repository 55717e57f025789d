/*
This code is part of the WhiteboxTools geospatial analysis library.
Authors: WhiteboxTools developers
Created: 21/06/2017
Last Modified: 16/10/2026
License: MIT

Notes: The logic behind working with the ESRI Shapefile format. Only the
geometry (.shp), index (.shx) and projection (.prj) members are handled here.
*/

pub mod geometry;
pub mod header;
pub mod index;
pub mod record;

use self::geometry::*;
use self::header::{ShapefileHeader, HEADER_LENGTH};
use self::index::{append_entry, read_index_file, rebuild_from_shp, IndexEntry, ENTRY_LENGTH};
use self::record::{RecordCodec, RECORD_HEADER_LENGTH};
use crate::configs::{Configs, CorruptRecordPolicy, ReadMode};
use crate::error::{Result, ShapefileError};
use crate::structures::{BoundingBox, ValueRange};
use crate::utils::{ByteOrderReader, ByteOrderWriter};
use std::borrow::Cow;
use std::fs;
use std::fs::File;
use std::io::prelude::*;
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Receives percentage-complete notifications during a full load.
pub trait ProgressObserver {
    fn progress(&mut self, percent: usize);
}

impl<F: FnMut(usize)> ProgressObserver for F {
    fn progress(&mut self, percent: usize) {
        self(percent)
    }
}

/// Lifecycle of a `Shapefile`. `Unopened`, `HeaderRead` and `IndexReady`
/// exist only inside `open`, which reports them in its debug log before
/// settling in `IndexMode` or `FullyLoaded`; `state()` never returns them. A
/// failed open produces no handle, which is the `Error` state.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CodecState {
    Unopened,
    HeaderRead,
    IndexReady,
    IndexMode,
    FullyLoaded,
    Closed,
    Error,
}

impl CodecState {
    pub fn name(&self) -> &'static str {
        match self {
            CodecState::Unopened => "unopened",
            CodecState::HeaderRead => "header-read",
            CodecState::IndexReady => "index-ready",
            CodecState::IndexMode => "in index mode",
            CodecState::FullyLoaded => "fully loaded",
            CodecState::Closed => "closed",
            CodecState::Error => "in error",
        }
    }
}

/// An ESRI Shapefile of a single geometry kind and coordinate profile.
///
/// In index mode only the header and the .shx index live in memory and
/// every `get_shape` call opens the .shp, decodes one record and closes the
/// file again. In loaded mode all records are decoded up front.
///
/// Examples:
///
/// ```no_run
/// use whitebox_shapefile::vector::{CoordinateProfile, GeometryKind, Shape, Shapefile};
/// use whitebox_shapefile::structures::Point2D;
///
/// // Read a shape on demand.
/// let input = Shapefile::open("rivers.shp")?;
/// let first = input.get_shape(0)?;
/// println!("{}", first);
///
/// // Create a new Point file.
/// let mut output = Shapefile::new(GeometryKind::Point, CoordinateProfile::Planar);
/// let mut b = Shape::builder(GeometryKind::Point, CoordinateProfile::Planar);
/// b.add_point(Point2D::new(10.0, 20.0));
/// output.add_shape(b.build()?)?;
/// output.save("wells.shp")?;
/// # Ok::<(), whitebox_shapefile::error::ShapefileError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Shapefile {
    file_name: Option<PathBuf>,
    state: CodecState,
    header: ShapefileHeader,
    codec: RecordCodec,
    index: Vec<IndexEntry>,
    records: Vec<Option<Shape>>,
    projection: String,
    configs: Configs,
}

impl Shapefile {
    /// An empty, writable shapefile held in memory.
    pub fn new(kind: GeometryKind, profile: CoordinateProfile) -> Shapefile {
        Shapefile {
            file_name: None,
            state: CodecState::FullyLoaded,
            header: ShapefileHeader::new(ShapeType::from_parts(kind, profile)),
            codec: RecordCodec::new(kind, profile),
            index: vec![],
            records: vec![],
            projection: String::new(),
            configs: Configs::default(),
        }
    }

    /// Opens a shapefile using the default settings (index mode).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Shapefile> {
        Shapefile::open_with(path, &Configs::default())
    }

    pub fn open_with<P: AsRef<Path>>(path: P, configs: &Configs) -> Result<Shapefile> {
        let file_name = shp_path(path.as_ref());
        let mut state = CodecState::Unopened;
        debug!("Opening {} ({:?})", file_name.display(), state);

        let (header, file_size) = read_header(&file_name)?;
        state = CodecState::HeaderRead;
        if header.file_length_bytes() != file_size {
            warn!(
                "{} declares {} bytes but is {} bytes long",
                file_name.display(),
                header.file_length_bytes(),
                file_size
            );
        }
        let codec = match RecordCodec::for_shape_type(header.shape_type) {
            Some(c) => c,
            None => {
                return Err(ShapefileError::UnsupportedShapeType {
                    tag: header.shape_type.to_int(),
                    record: None,
                })
            }
        };
        debug!("{}: {} ({:?})", file_name.display(), header.shape_type, state);

        let index_file = file_name.with_extension("shx");
        let index = if index_file.exists() {
            read_index_file(&index_file, header.shape_type)?
        } else if configs.rebuild_missing_index {
            warn!(
                "Index file {} not found; rebuilding it from record headers",
                index_file.display()
            );
            let mut bor = ByteOrderReader::new(BufReader::new(File::open(&file_name)?))?;
            rebuild_from_shp(&mut bor)?
        } else {
            return Err(ShapefileError::Io(std::io::Error::new(
                ErrorKind::NotFound,
                format!("index file {} not found", index_file.display()),
            )));
        };
        state = CodecState::IndexReady;
        debug!("{}: {} records ({:?})", file_name.display(), index.len(), state);

        let projection = read_projection(&file_name)?;

        let mut sf = Shapefile {
            file_name: Some(file_name),
            state: CodecState::IndexMode,
            header: header,
            codec: codec,
            index: index,
            records: vec![],
            projection: projection,
            configs: configs.clone(),
        };
        if configs.read_mode == ReadMode::Loaded {
            sf.load()?;
        }
        Ok(sf)
    }

    pub fn state(&self) -> CodecState {
        self.state
    }

    pub fn file_name(&self) -> Option<&Path> {
        self.file_name.as_deref()
    }

    pub fn header(&self) -> &ShapefileHeader {
        &self.header
    }

    /// The index of the file on disk, as read at open or written by the
    /// last save.
    pub fn index(&self) -> &[IndexEntry] {
        &self.index
    }

    pub fn geometry_kind(&self) -> GeometryKind {
        self.codec.kind()
    }

    pub fn coordinate_profile(&self) -> CoordinateProfile {
        self.codec.profile()
    }

    pub fn shape_type(&self) -> ShapeType {
        self.header.shape_type
    }

    pub fn projection(&self) -> &str {
        &self.projection
    }

    pub fn set_projection(&mut self, projection: &str) {
        self.projection = projection.to_string();
    }

    /// The extent recorded in the header. It reflects the file as opened or
    /// last saved; Z and M ranges are `None` when the profile lacks them or
    /// the header holds the empty-range sentinel.
    pub fn extent(&self) -> Extent {
        let h = &self.header;
        let profile = self.coordinate_profile();
        let range = |min: f64, max: f64, present: bool| {
            if present && min <= max {
                Some(ValueRange::new(min, max))
            } else {
                None
            }
        };
        Extent {
            bounding_box: BoundingBox {
                min_x: h.x_min,
                min_y: h.y_min,
                max_x: h.x_max,
                max_y: h.y_max,
            },
            z_range: range(h.z_min, h.z_max, profile.has_z()),
            m_range: range(h.m_min, h.m_max, profile.has_m()),
        }
    }

    pub fn shape_count(&self) -> usize {
        match self.state {
            CodecState::FullyLoaded => self.records.len(),
            _ => self.index.len(),
        }
    }

    fn check_usable(&self, operation: &'static str) -> Result<()> {
        match self.state {
            CodecState::IndexMode | CodecState::FullyLoaded => Ok(()),
            s => Err(ShapefileError::InvalidState {
                state: s.name(),
                operation: operation,
            }),
        }
    }

    fn source(&self) -> Result<ByteOrderReader<BufReader<File>>> {
        let path = match &self.file_name {
            Some(p) => p,
            None => {
                return Err(ShapefileError::InvalidState {
                    state: self.state.name(),
                    operation: "read records without a source file",
                })
            }
        };
        Ok(ByteOrderReader::new(BufReader::new(File::open(path)?))?)
    }

    fn read_record<R: Read + Seek>(&self, bor: &mut ByteOrderReader<R>, index: usize) -> Result<Shape> {
        let entry = &self.index[index];
        bor.seek(entry.offset as usize)?;
        self.codec.decode(bor, index, entry)
    }

    /// Returns the shape at a 0-based record position.
    pub fn get_shape(&self, index: usize) -> Result<Cow<'_, Shape>> {
        self.check_usable("get_shape")?;
        let count = self.shape_count();
        if index >= count {
            return Err(ShapefileError::RecordOutOfRange {
                index: index,
                count: count,
            });
        }
        if self.state == CodecState::FullyLoaded {
            return match &self.records[index] {
                Some(shape) => Ok(Cow::Borrowed(shape)),
                None => Err(ShapefileError::RecordUnavailable { index: index }),
            };
        }
        let mut bor = self.source()?;
        Ok(Cow::Owned(self.read_record(&mut bor, index)?))
    }

    /// Decodes every record into memory, switching to loaded mode.
    pub fn load(&mut self) -> Result<()> {
        self.load_with_progress(|_: usize| {})
    }

    /// As `load`, reporting integer percentages as records are decoded.
    pub fn load_with_progress<P: ProgressObserver>(&mut self, mut observer: P) -> Result<()> {
        match self.state {
            CodecState::FullyLoaded => return Ok(()),
            CodecState::IndexMode => {}
            s => {
                return Err(ShapefileError::InvalidState {
                    state: s.name(),
                    operation: "load",
                })
            }
        }

        let num_records = self.index.len();
        let mut records = Vec::with_capacity(num_records);
        let mut bor = self.source()?;
        let mut progress: usize;
        let mut old_progress: usize = 1;
        for i in 0..num_records {
            match self.read_record(&mut bor, i) {
                Ok(shape) => records.push(Some(shape)),
                Err(e)
                    if e.is_skippable()
                        && self.configs.corrupt_record_policy == CorruptRecordPolicy::Skip =>
                {
                    warn!("Skipping record {}: {}", i + 1, e);
                    records.push(None);
                }
                Err(e) => return Err(e),
            }
            progress = (100.0_f64 * (i + 1) as f64 / num_records as f64) as usize;
            if progress != old_progress {
                observer.progress(progress);
                old_progress = progress;
            }
        }

        self.records = records;
        self.state = CodecState::FullyLoaded;
        Ok(())
    }

    /// Appends a shape; requires loaded mode. The shape must be Null or of the
    /// file's shape type.
    pub fn add_shape(&mut self, shape: Shape) -> Result<()> {
        if self.state != CodecState::FullyLoaded {
            return Err(ShapefileError::InvalidState {
                state: self.state.name(),
                operation: "add_shape",
            });
        }
        if !shape.is_null() && shape.shape_type() != self.shape_type() {
            return Err(ShapefileError::MalformedShape {
                reason: format!(
                    "attempt to add a {} record to a {} shapefile",
                    shape.shape_type(),
                    self.shape_type()
                ),
            });
        }
        let record_number = self.records.len() as u32 + 1;
        self.records.push(Some(shape.with_record_number(record_number)));
        Ok(())
    }

    /// Visits every in-scope shape in record order. Records skipped during
    /// loading are visited as Null shapes. In index mode the source file is
    /// opened once for the whole pass.
    fn for_each_shape<F>(&self, mut f: F) -> Result<()>
    where
        F: FnMut(usize, &Shape) -> Result<()>,
    {
        if self.state == CodecState::FullyLoaded {
            let null = Shape::null();
            for (i, rec) in self.records.iter().enumerate() {
                f(i, rec.as_ref().unwrap_or(&null))?;
            }
            return Ok(());
        }
        let mut bor = self.source()?;
        for i in 0..self.index.len() {
            let shape = self.read_record(&mut bor, i)?;
            f(i, &shape)?;
        }
        Ok(())
    }

    /// Writes the .shp/.shx pair (and .prj when a projection is set).
    ///
    /// The first pass sizes every record and aggregates the extent; the
    /// second writes the header, then records and index entries in lockstep.
    /// Output goes to `.incomplete` files which are renamed into place only
    /// after the second pass succeeds.
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.check_usable("save")?;
        let file_name = shp_path(path.as_ref());
        let index_file = file_name.with_extension("shx");
        let profile = self.coordinate_profile();

        // pass 1: content lengths and extent
        let mut lengths: Vec<u32> = Vec::with_capacity(self.shape_count());
        let mut bounding_box = BoundingBox::default();
        let mut z_range = ValueRange::default();
        let mut m_range = ValueRange::default();
        self.for_each_shape(|_, shape| {
            lengths.push(self.codec.content_length(shape));
            for p in shape.vertices() {
                bounding_box.expand_to_point(p);
            }
            if profile.has_z() {
                for z in shape.elevations().unwrap_or(&[]) {
                    z_range.expand_to_value(*z);
                }
            }
            if profile.has_m() {
                for m in shape.measures().unwrap_or(&[]) {
                    m_range.expand_to_value(*m);
                }
            }
            Ok(())
        })?;

        let total: u64 = HEADER_LENGTH as u64
            + lengths
                .iter()
                .map(|len| (RECORD_HEADER_LENGTH as u64) + *len as u64)
                .sum::<u64>();
        // the header stores the length as a signed 32-bit count of words
        if total / 2 > i32::MAX as u64 {
            return Err(ShapefileError::FileTooLarge { bytes: total });
        }

        let mut header = self.header.clone();
        header.file_length = (total / 2) as i32;
        header.set_extent(&Extent {
            bounding_box: bounding_box,
            z_range: if profile.has_z() { Some(z_range) } else { None },
            m_range: if profile.has_m() { Some(m_range) } else { None },
        });
        let mut index_header = header.clone();
        index_header.file_length = ((HEADER_LENGTH + ENTRY_LENGTH * lengths.len()) / 2) as i32;

        // pass 2: header, records and index entries
        let tmp_shp = file_name.with_extension("shp.incomplete");
        let tmp_shx = file_name.with_extension("shx.incomplete");
        let index = match self.write_files(&tmp_shp, &tmp_shx, &header, &index_header, &lengths) {
            Ok(index) => index,
            Err(e) => {
                warn!(
                    "Saving {} failed; partial output left in {} and {}",
                    file_name.display(),
                    tmp_shp.display(),
                    tmp_shx.display()
                );
                return Err(e);
            }
        };
        // The index goes into place first. If the .shp cannot follow, the new
        // index is removed so no mismatched pair is left behind; a surviving
        // old .shp has its index rebuilt on open.
        fs::rename(&tmp_shx, &index_file)?;
        if let Err(e) = fs::rename(&tmp_shp, &file_name) {
            warn!(
                "Could not move {} into place; removing {}",
                tmp_shp.display(),
                index_file.display()
            );
            if let Err(e) = fs::remove_file(&index_file) {
                warn!("Could not remove {}: {}", index_file.display(), e);
            }
            return Err(e.into());
        }

        if !self.projection.is_empty() {
            fs::write(file_name.with_extension("prj"), self.projection.as_bytes())?;
        }
        debug!(
            "Saved {} records to {} ({} bytes)",
            index.len(),
            file_name.display(),
            total
        );

        self.header = header;
        self.index = index;
        self.file_name = Some(file_name);
        Ok(())
    }

    fn write_files(
        &self,
        shp: &Path,
        shx: &Path,
        header: &ShapefileHeader,
        index_header: &ShapefileHeader,
        lengths: &[u32],
    ) -> Result<Vec<IndexEntry>> {
        let mut shp_writer = ByteOrderWriter::new(BufWriter::new(File::create(shp)?));
        let mut shx_writer = ByteOrderWriter::new(BufWriter::new(File::create(shx)?));
        shp_writer.write_bytes(&header.encode()?)?;
        shx_writer.write_bytes(&index_header.encode()?)?;

        let mut index = Vec::with_capacity(lengths.len());
        let mut pos = HEADER_LENGTH as u32;
        self.for_each_shape(|i, shape| {
            let record = self.codec.encode_record(i as u32 + 1, shape)?;
            let content_length = (record.len() - RECORD_HEADER_LENGTH) as u32;
            if lengths.get(i) != Some(&content_length) {
                return Err(ShapefileError::MalformedShape {
                    reason: format!("record {} changed size between save passes", i + 1),
                });
            }
            shp_writer.write_bytes(&record)?;
            append_entry(&mut shx_writer, pos, content_length)?;
            index.push(IndexEntry::new(pos, content_length));
            pos += RECORD_HEADER_LENGTH as u32 + content_length;
            Ok(())
        })?;
        if index.len() != lengths.len() {
            return Err(ShapefileError::MalformedShape {
                reason: "record count changed between save passes".to_string(),
            });
        }

        shp_writer.flush()?;
        shx_writer.flush()?;
        Ok(index)
    }

    /// Releases the in-memory records and index.
    pub fn close(&mut self) {
        self.records = vec![];
        self.index = vec![];
        self.state = CodecState::Closed;
    }
}

/// Adds the .shp extension when none was given.
fn shp_path(path: &Path) -> PathBuf {
    if path.extension().is_none() {
        path.with_extension("shp")
    } else {
        path.to_path_buf()
    }
}

fn read_header(file_name: &Path) -> Result<(ShapefileHeader, u64)> {
    let mut bor = ByteOrderReader::new(BufReader::new(File::open(file_name)?))?;
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
    Ok((ShapefileHeader::decode(&bytes)?, bor.len() as u64))
}

fn read_projection(file_name: &Path) -> Result<String> {
    let prj_file = file_name.with_extension("prj");
    match fs::read_to_string(&prj_file) {
        Ok(s) => Ok(s),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("Projection file {} not located", prj_file.display());
            Ok(String::new())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::structures::Point2D;
    use tempfile::TempDir;

    fn polyline(parts: &[&[(f64, f64)]]) -> Shape {
        let mut b = Shape::builder(GeometryKind::PolyLine, CoordinateProfile::Planar);
        for part in parts {
            let pts: Vec<Point2D> = part.iter().map(|(x, y)| Point2D::new(*x, *y)).collect();
            b.add_part(&pts);
        }
        b.build().unwrap()
    }

    fn polyline_file() -> Shapefile {
        let mut sf = Shapefile::new(GeometryKind::PolyLine, CoordinateProfile::Planar);
        sf.add_shape(polyline(&[&[(0.0, 0.0), (1.0, 1.0), (2.0, 0.5)], &[(5.0, 5.0), (6.0, 4.0)]]))
            .unwrap();
        sf.add_shape(Shape::null()).unwrap();
        sf.add_shape(polyline(&[&[(-3.0, 7.0), (-2.0, 8.0)]])).unwrap();
        sf
    }

    fn saved_polylines(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("lines.shp");
        polyline_file().save(&path).unwrap();
        path
    }

    fn be_i32(bytes: &[u8], at: usize) -> i32 {
        i32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
    }

    #[test]
    fn test_save_and_open_in_index_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = saved_polylines(&dir);

        let sf = Shapefile::open(&path).unwrap();
        assert_eq!(sf.state(), CodecState::IndexMode);
        assert_eq!(sf.geometry_kind(), GeometryKind::PolyLine);
        assert_eq!(sf.coordinate_profile(), CoordinateProfile::Planar);
        assert_eq!(sf.shape_count(), 3);

        let first = sf.get_shape(0).unwrap();
        assert!(matches!(first, Cow::Owned(_)));
        assert_eq!(first.record_number(), 1);
        assert_eq!(first.parts(), &[PartRange::new(0, 3), PartRange::new(3, 2)]);
        assert!(sf.get_shape(1).unwrap().is_null());
        assert_eq!(sf.get_shape(2).unwrap().vertices()[1], Point2D::new(-2.0, 8.0));
        assert!(matches!(
            sf.get_shape(3),
            Err(ShapefileError::RecordOutOfRange { index: 3, count: 3 })
        ));
    }

    #[test]
    fn test_index_consistency() {
        let dir = tempfile::tempdir().unwrap();
        let path = saved_polylines(&dir);
        let shp = fs::read(&path).unwrap();
        let shx = fs::read(path.with_extension("shx")).unwrap();

        assert_eq!(be_i32(&shp, 24) as usize * 2, shp.len());
        assert_eq!(be_i32(&shx, 24) as usize * 2, shx.len());
        assert_eq!(shx.len(), 100 + 3 * 8);
        assert_eq!(&shp[32..100], &shx[32..100]);

        let sf = Shapefile::open(&path).unwrap();
        let mut expected_offset = 100u32;
        for (i, entry) in sf.index().iter().enumerate() {
            assert_eq!(entry.offset, expected_offset);
            let at = entry.offset as usize;
            assert_eq!(be_i32(&shp, at), i as i32 + 1);
            assert_eq!(be_i32(&shp, at + 4) as u32 * 2, entry.content_length);
            expected_offset += 8 + entry.content_length;
        }
        assert_eq!(expected_offset as usize, shp.len());
        // the null record is 4 bytes of content
        assert_eq!(sf.index()[1].content_length, 4);
    }

    #[test]
    fn test_extent_aggregation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zlines.shp");
        let mut sf = Shapefile::new(GeometryKind::PolyLine, CoordinateProfile::PlanarZ);
        let mut b = Shape::builder(GeometryKind::PolyLine, CoordinateProfile::PlanarZ);
        b.add_part_z(
            &[Point2D::new(1.0, 2.0), Point2D::new(3.0, -4.0)],
            &[0.0, 10.0],
            &[100.0, 50.0],
        );
        sf.add_shape(b.build().unwrap()).unwrap();
        let mut b = Shape::builder(GeometryKind::PolyLine, CoordinateProfile::PlanarZ);
        b.add_part_z(
            &[Point2D::new(-5.0, 0.0), Point2D::new(0.0, 9.0)],
            &[-1.0, 2.0],
            &[75.0, 25.0],
        );
        sf.add_shape(b.build().unwrap()).unwrap();
        sf.add_shape(Shape::null()).unwrap();
        sf.save(&path).unwrap();

        let h = Shapefile::open(&path).unwrap().header().clone();
        assert_eq!((h.x_min, h.x_max, h.y_min, h.y_max), (-5.0, 3.0, -4.0, 9.0));
        assert_eq!((h.z_min, h.z_max), (25.0, 100.0));
        assert_eq!((h.m_min, h.m_max), (-1.0, 10.0));
        assert_eq!(sf.extent().z_range, Some(ValueRange::new(25.0, 100.0)));
    }

    #[test]
    fn test_empty_file_uses_sentinels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.shp");
        let mut sf = Shapefile::new(GeometryKind::MultiPoint, CoordinateProfile::PlanarZ);
        sf.save(&path).unwrap();

        let sf = Shapefile::open(&path).unwrap();
        assert_eq!(sf.shape_count(), 0);
        let h = sf.header();
        assert_eq!(h.file_length, 50);
        assert_eq!((h.z_min, h.z_max), (f64::MAX, f64::MIN));
        assert_eq!((h.m_min, h.m_max), (f64::MAX, f64::MIN));
        assert_eq!(sf.extent().z_range, None);
        assert_eq!(fs::metadata(path.with_extension("shx")).unwrap().len(), 100);
    }

    #[test]
    fn test_loaded_mode_matches_index_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = saved_polylines(&dir);
        let indexed = Shapefile::open(&path).unwrap();
        let configs = Configs {
            read_mode: ReadMode::Loaded,
            ..Default::default()
        };
        let loaded = Shapefile::open_with(&path, &configs).unwrap();
        assert_eq!(loaded.state(), CodecState::FullyLoaded);
        for i in 0..3 {
            let a = indexed.get_shape(i).unwrap();
            let b = loaded.get_shape(i).unwrap();
            assert!(matches!(b, Cow::Borrowed(_)));
            assert_eq!(*a, *b);
        }
    }

    #[test]
    fn test_progress_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = saved_polylines(&dir);
        let mut sf = Shapefile::open(&path).unwrap();
        let mut seen = vec![];
        sf.load_with_progress(|p: usize| seen.push(p)).unwrap();
        assert_eq!(seen, vec![33, 66, 100]);
        assert_eq!(sf.state(), CodecState::FullyLoaded);
    }

    fn corrupt_second_record(path: &Path) {
        let sf = Shapefile::open(path).unwrap();
        let at = sf.index()[1].offset as usize;
        let mut shp = fs::read(path).unwrap();
        shp[at..at + 4].copy_from_slice(&9i32.to_be_bytes());
        fs::write(path, shp).unwrap();
    }

    #[test]
    fn test_corrupt_record_abort() {
        let dir = tempfile::tempdir().unwrap();
        let path = saved_polylines(&dir);
        corrupt_second_record(&path);

        let mut sf = Shapefile::open(&path).unwrap();
        assert!(matches!(
            sf.get_shape(1),
            Err(ShapefileError::CorruptIndex { record: 2, found: 9, .. })
        ));
        assert!(sf.load().is_err());
        // a failed load leaves the handle usable in index mode
        assert_eq!(sf.state(), CodecState::IndexMode);
        assert_eq!(sf.index().len(), 3);
        assert_eq!(sf.get_shape(2).unwrap().record_number(), 3);
    }

    #[test]
    fn test_corrupt_record_skip() {
        let dir = tempfile::tempdir().unwrap();
        let path = saved_polylines(&dir);
        corrupt_second_record(&path);

        let configs = Configs {
            read_mode: ReadMode::Loaded,
            corrupt_record_policy: CorruptRecordPolicy::Skip,
            ..Default::default()
        };
        let mut sf = Shapefile::open_with(&path, &configs).unwrap();
        assert_eq!(sf.shape_count(), 3);
        assert!(matches!(
            sf.get_shape(1),
            Err(ShapefileError::RecordUnavailable { index: 1 })
        ));

        // the gap is written back as a null record
        let repaired = dir.path().join("repaired.shp");
        sf.save(&repaired).unwrap();
        let sf = Shapefile::open(&repaired).unwrap();
        assert!(sf.get_shape(1).unwrap().is_null());
        assert_eq!(sf.get_shape(2).unwrap().num_points(), 2);
    }

    #[test]
    fn test_index_mode_save_rewrites_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = saved_polylines(&dir);
        let before = fs::read(&path).unwrap();
        let mut sf = Shapefile::open(&path).unwrap();
        sf.save(&path).unwrap();
        assert_eq!(fs::read(&path).unwrap(), before);
        assert!(!path.with_extension("shp.incomplete").exists());
        assert_eq!(sf.state(), CodecState::IndexMode);
    }

    #[test]
    fn test_missing_index_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = saved_polylines(&dir);
        let expected = Shapefile::open(&path).unwrap().index().to_vec();
        fs::remove_file(path.with_extension("shx")).unwrap();

        let sf = Shapefile::open(&path).unwrap();
        assert_eq!(sf.index(), &expected[..]);

        let configs = Configs {
            rebuild_missing_index: false,
            ..Default::default()
        };
        assert!(matches!(
            Shapefile::open_with(&path, &configs),
            Err(ShapefileError::Io(_))
        ));
    }

    #[test]
    fn test_not_a_shapefile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.shp");
        fs::write(&path, vec![0u8; 100]).unwrap();
        assert!(matches!(
            Shapefile::open(&path),
            Err(ShapefileError::InvalidMagic { found: 0 })
        ));

        let mut header = ShapefileHeader::new(ShapeType::Point).encode().unwrap();
        header[32..36].copy_from_slice(&31i32.to_le_bytes());
        fs::write(&path, header).unwrap();
        assert!(matches!(
            Shapefile::open(&path),
            Err(ShapefileError::UnsupportedShapeType { tag: 31, .. })
        ));

        fs::write(&path, vec![0u8; 40]).unwrap();
        assert!(matches!(
            Shapefile::open(&path),
            Err(ShapefileError::TruncatedStream { expected: 100, available: 40, .. })
        ));
    }

    #[test]
    fn test_truncated_last_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = saved_polylines(&dir);
        let shp = fs::read(&path).unwrap();
        fs::write(&path, &shp[..shp.len() - 10]).unwrap();
        let sf = Shapefile::open(&path).unwrap();
        assert!(sf.get_shape(0).is_ok());
        assert!(matches!(
            sf.get_shape(2),
            Err(ShapefileError::TruncatedStream { record: 3, .. })
        ));
    }

    #[test]
    fn test_projection_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points");
        let mut sf = Shapefile::new(GeometryKind::Point, CoordinateProfile::PlanarM);
        let mut b = Shape::builder(GeometryKind::Point, CoordinateProfile::PlanarM);
        b.add_point_m(Point2D::new(1.0, 1.0), 4.0);
        sf.add_shape(b.build().unwrap()).unwrap();
        sf.set_projection("GEOGCS[\"WGS 84\"]");
        sf.save(&path).unwrap();

        assert!(dir.path().join("points.shp").exists());
        let sf = Shapefile::open(dir.path().join("points.shp")).unwrap();
        assert_eq!(sf.projection(), "GEOGCS[\"WGS 84\"]");
        assert_eq!(sf.get_shape(0).unwrap().measures(), Some(&[4.0][..]));
    }

    #[test]
    fn test_state_rules() {
        let dir = tempfile::tempdir().unwrap();
        let path = saved_polylines(&dir);
        let mut sf = Shapefile::open(&path).unwrap();
        assert!(matches!(
            sf.add_shape(Shape::null()),
            Err(ShapefileError::InvalidState { operation: "add_shape", .. })
        ));

        sf.load().unwrap();
        let mut b = Shape::builder(GeometryKind::Polygon, CoordinateProfile::Planar);
        b.add_part(&[Point2D::new(0.0, 0.0), Point2D::new(1.0, 0.0), Point2D::new(0.0, 0.0)]);
        assert!(matches!(
            sf.add_shape(b.build().unwrap()),
            Err(ShapefileError::MalformedShape { .. })
        ));

        sf.close();
        assert_eq!(sf.state(), CodecState::Closed);
        assert!(matches!(
            sf.get_shape(0),
            Err(ShapefileError::InvalidState { state: "closed", .. })
        ));
        assert!(sf.save(dir.path().join("other.shp")).is_err());
    }

    #[test]
    fn test_failed_move_leaves_no_mismatched_index() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("blocked.shp");
        // a directory in the way of the .shp makes the final move fail
        fs::create_dir(&target).unwrap();
        let mut sf = polyline_file();
        assert!(matches!(sf.save(&target), Err(ShapefileError::Io(_))));
        assert!(!dir.path().join("blocked.shx").exists());
        assert!(dir.path().join("blocked.shp.incomplete").exists());
        assert!(sf.file_name().is_none());
    }

    #[test]
    fn test_z_records_keep_measure_block_on_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wells.shp");
        // a PointZ record holding only x, y and z
        let mut content = 11i32.to_le_bytes().to_vec();
        for v in [1.0f64, 2.0, 3.0] {
            content.extend_from_slice(&v.to_le_bytes());
        }
        let mut header = ShapefileHeader::new(ShapeType::PointZ);
        header.file_length = (100 + 8 + 28) / 2;
        let mut shp = header.encode().unwrap().to_vec();
        shp.extend_from_slice(&1i32.to_be_bytes());
        shp.extend_from_slice(&14i32.to_be_bytes());
        shp.extend_from_slice(&content);
        fs::write(&path, &shp).unwrap();
        fs::remove_file(path.with_extension("shx")).ok();

        let mut sf = Shapefile::open(&path).unwrap();
        assert!(sf.get_shape(0).unwrap().measures().is_none());
        let out = dir.path().join("out.shp");
        sf.save(&out).unwrap();

        assert_eq!(fs::metadata(&out).unwrap().len(), 100 + 8 + 36);
        let sf = Shapefile::open(&out).unwrap();
        assert_eq!(sf.index()[0].content_length, 36);
        let shape = sf.get_shape(0).unwrap();
        assert_eq!(shape.elevations(), Some(&[3.0][..]));
        assert_eq!(shape.measures(), Some(&[0.0][..]));
    }

    #[test]
    fn test_failed_save_leaves_handle_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut sf = polyline_file();
        let target = dir.path().join("missing").join("lines.shp");
        assert!(matches!(sf.save(&target), Err(ShapefileError::Io(_))));
        assert!(sf.file_name().is_none());
        assert_eq!(sf.header().file_length, 50);
        assert_eq!(sf.shape_count(), 3);
    }
}
