/*
This file is part of the WhiteboxTools geospatial analysis library.
Authors: WhiteboxTools developers
Created: 10/04/2018
Last Modified: 16/10/2026
License: MIT
*/
use crate::error::{Result, ShapefileError};
use crate::structures::{BoundingBox, Point2D, ValueRange};
use std::f64;
use std::fmt;

/// The four geometry variants a shapefile can hold.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Point,
    MultiPoint,
    PolyLine,
    Polygon,
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let printable = match *self {
            GeometryKind::Point => "Point",
            GeometryKind::MultiPoint => "MultiPoint",
            GeometryKind::PolyLine => "PolyLine",
            GeometryKind::Polygon => "Polygon",
        };
        write!(f, "{}", printable)
    }
}

/// Which optional per-vertex ordinates a shape carries. `PlanarZ` always
/// implies measures as well.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum CoordinateProfile {
    #[default]
    Planar,
    PlanarM,
    PlanarZ,
}

impl CoordinateProfile {
    pub fn has_m(&self) -> bool {
        *self != CoordinateProfile::Planar
    }

    pub fn has_z(&self) -> bool {
        *self == CoordinateProfile::PlanarZ
    }
}

impl fmt::Display for CoordinateProfile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let printable = match *self {
            CoordinateProfile::Planar => "XY",
            CoordinateProfile::PlanarM => "XYM",
            CoordinateProfile::PlanarZ => "XYZM",
        };
        write!(f, "{}", printable)
    }
}

/// The wire-level shape type tag.
#[repr(i32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum ShapeType {
    #[default]
    Null = 0,
    Point = 1,
    PolyLine = 3,
    Polygon = 5,
    MultiPoint = 8,
    PointZ = 11,
    PolyLineZ = 13,
    PolygonZ = 15,
    MultiPointZ = 18,
    PointM = 21,
    PolyLineM = 23,
    PolygonM = 25,
    MultiPointM = 28,
}

impl ShapeType {
    /// Maps a wire tag onto a ShapeType. MultiPatch (31) and unknown values
    /// are not supported.
    pub fn from_int(value: i32) -> Option<ShapeType> {
        match value {
            0 => Some(ShapeType::Null),
            1 => Some(ShapeType::Point),
            3 => Some(ShapeType::PolyLine),
            5 => Some(ShapeType::Polygon),
            8 => Some(ShapeType::MultiPoint),
            11 => Some(ShapeType::PointZ),
            13 => Some(ShapeType::PolyLineZ),
            15 => Some(ShapeType::PolygonZ),
            18 => Some(ShapeType::MultiPointZ),
            21 => Some(ShapeType::PointM),
            23 => Some(ShapeType::PolyLineM),
            25 => Some(ShapeType::PolygonM),
            28 => Some(ShapeType::MultiPointM),
            _ => None,
        }
    }

    pub fn to_int(&self) -> i32 {
        *self as i32
    }

    pub fn from_parts(kind: GeometryKind, profile: CoordinateProfile) -> ShapeType {
        use CoordinateProfile::*;
        match (kind, profile) {
            (GeometryKind::Point, Planar) => ShapeType::Point,
            (GeometryKind::Point, PlanarM) => ShapeType::PointM,
            (GeometryKind::Point, PlanarZ) => ShapeType::PointZ,
            (GeometryKind::MultiPoint, Planar) => ShapeType::MultiPoint,
            (GeometryKind::MultiPoint, PlanarM) => ShapeType::MultiPointM,
            (GeometryKind::MultiPoint, PlanarZ) => ShapeType::MultiPointZ,
            (GeometryKind::PolyLine, Planar) => ShapeType::PolyLine,
            (GeometryKind::PolyLine, PlanarM) => ShapeType::PolyLineM,
            (GeometryKind::PolyLine, PlanarZ) => ShapeType::PolyLineZ,
            (GeometryKind::Polygon, Planar) => ShapeType::Polygon,
            (GeometryKind::Polygon, PlanarM) => ShapeType::PolygonM,
            (GeometryKind::Polygon, PlanarZ) => ShapeType::PolygonZ,
        }
    }

    /// The geometry kind; `None` for the Null sentinel.
    pub fn kind(&self) -> Option<GeometryKind> {
        match self {
            ShapeType::Null => None,
            ShapeType::Point | ShapeType::PointZ | ShapeType::PointM => Some(GeometryKind::Point),
            ShapeType::PolyLine | ShapeType::PolyLineZ | ShapeType::PolyLineM => {
                Some(GeometryKind::PolyLine)
            }
            ShapeType::Polygon | ShapeType::PolygonZ | ShapeType::PolygonM => {
                Some(GeometryKind::Polygon)
            }
            ShapeType::MultiPoint | ShapeType::MultiPointZ | ShapeType::MultiPointM => {
                Some(GeometryKind::MultiPoint)
            }
        }
    }

    pub fn profile(&self) -> CoordinateProfile {
        match self {
            ShapeType::Null
            | ShapeType::MultiPoint
            | ShapeType::Point
            | ShapeType::Polygon
            | ShapeType::PolyLine => CoordinateProfile::Planar,
            ShapeType::MultiPointM
            | ShapeType::PointM
            | ShapeType::PolygonM
            | ShapeType::PolyLineM => CoordinateProfile::PlanarM,
            ShapeType::MultiPointZ
            | ShapeType::PointZ
            | ShapeType::PolygonZ
            | ShapeType::PolyLineZ => CoordinateProfile::PlanarZ,
        }
    }
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let printable = match *self {
            ShapeType::Null => "Null",
            ShapeType::Point => "Point",
            ShapeType::PolyLine => "PolyLine",
            ShapeType::Polygon => "Polygon",
            ShapeType::MultiPoint => "MultiPoint",
            ShapeType::PointZ => "PointZ",
            ShapeType::PolyLineZ => "PolyLineZ",
            ShapeType::PolygonZ => "PolygonZ",
            ShapeType::MultiPointZ => "MultiPointZ",
            ShapeType::PointM => "PointM",
            ShapeType::PolyLineM => "PolyLineM",
            ShapeType::PolygonM => "PolygonM",
            ShapeType::MultiPointM => "MultiPointM",
        };
        write!(f, "{}", printable)
    }
}

/// A part (ring or line) as a range into the shape's shared vertex buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PartRange {
    pub start: usize,
    pub count: usize,
}

impl PartRange {
    pub fn new(start: usize, count: usize) -> PartRange {
        PartRange {
            start: start,
            count: count,
        }
    }

    pub fn end(&self) -> usize {
        self.start + self.count
    }
}

/// The extent of a shape: XY box plus the Z and M ranges it carries.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct Extent {
    pub bounding_box: BoundingBox,
    pub z_range: Option<ValueRange>,
    pub m_range: Option<ValueRange>,
}

impl Extent {
    pub fn is_empty(&self) -> bool {
        self.bounding_box.is_empty()
    }
}

/// One decoded or newly built shapefile record. Shapes are immutable; build
/// new ones with `ShapeBuilder`.
#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    record_number: u32,
    shape_type: ShapeType,
    extent: Extent,
    vertices: Vec<Point2D>,
    measures: Option<Vec<f64>>,
    elevations: Option<Vec<f64>>,
    parts: Vec<PartRange>,
}

impl Shape {
    /// A Null record: no geometry, empty extent, no parts.
    pub fn null() -> Shape {
        Shape {
            record_number: 0,
            shape_type: ShapeType::Null,
            extent: Extent::default(),
            vertices: vec![],
            measures: None,
            elevations: None,
            parts: vec![],
        }
    }

    pub fn builder(kind: GeometryKind, profile: CoordinateProfile) -> ShapeBuilder {
        ShapeBuilder::new(kind, profile)
    }

    /// Assembles a shape from already-validated pieces. Used by the record
    /// decoder, which checks part and array lengths against the wire counts.
    pub(crate) fn from_parts(
        shape_type: ShapeType,
        extent: Extent,
        vertices: Vec<Point2D>,
        measures: Option<Vec<f64>>,
        elevations: Option<Vec<f64>>,
        parts: Vec<PartRange>,
    ) -> Shape {
        debug_assert_eq!(parts.iter().map(|p| p.count).sum::<usize>(), vertices.len());
        Shape {
            record_number: 0,
            shape_type: shape_type,
            extent: extent,
            vertices: vertices,
            measures: measures,
            elevations: elevations,
            parts: parts,
        }
    }

    pub(crate) fn with_record_number(mut self, record_number: u32) -> Shape {
        self.record_number = record_number;
        self
    }

    /// 1-based record number; 0 for a shape not yet placed in a file.
    pub fn record_number(&self) -> u32 {
        self.record_number
    }

    pub fn shape_type(&self) -> ShapeType {
        self.shape_type
    }

    pub fn is_null(&self) -> bool {
        self.shape_type == ShapeType::Null
    }

    pub fn extent(&self) -> &Extent {
        &self.extent
    }

    pub fn vertices(&self) -> &[Point2D] {
        &self.vertices
    }

    pub fn measures(&self) -> Option<&[f64]> {
        self.measures.as_deref()
    }

    pub fn elevations(&self) -> Option<&[f64]> {
        self.elevations.as_deref()
    }

    pub fn parts(&self) -> &[PartRange] {
        &self.parts
    }

    pub fn num_points(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_parts(&self) -> usize {
        self.parts.len()
    }

    /// The vertices of one part, as a view into the shared buffer.
    pub fn part_vertices(&self, part: usize) -> &[Point2D] {
        let p = self.parts[part];
        &self.vertices[p.start..p.end()]
    }

    pub fn part_measures(&self, part: usize) -> Option<&[f64]> {
        let p = self.parts[part];
        self.measures.as_ref().map(|m| &m[p.start..p.end()])
    }

    pub fn part_elevations(&self, part: usize) -> Option<&[f64]> {
        let p = self.parts[part];
        self.elevations.as_ref().map(|z| &z[p.start..p.end()])
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_null() {
            return write!(f, "record {}: Null", self.record_number);
        }
        let bb = &self.extent.bounding_box;
        write!(
            f,
            "record {}: {} parts={} points={} x=[{}, {}] y=[{}, {}]",
            self.record_number,
            self.shape_type,
            self.parts.len(),
            self.vertices.len(),
            bb.min_x,
            bb.max_x,
            bb.min_y,
            bb.max_y
        )?;
        if let Some(z) = self.extent.z_range {
            write!(f, " z=[{}, {}]", z.min, z.max)?;
        }
        if let Some(m) = self.extent.m_range {
            write!(f, " m=[{}, {}]", m.min, m.max)?;
        }
        Ok(())
    }
}

/// Accumulates vertices for a new Shape of a fixed kind and profile.
///
/// Point and MultiPoint shapes take vertices through the `add_point*`
/// methods; PolyLine and Polygon shapes take whole parts through the
/// `add_part*` methods. Misuse is reported by `build`.
#[derive(Clone, Debug)]
pub struct ShapeBuilder {
    kind: GeometryKind,
    profile: CoordinateProfile,
    vertices: Vec<Point2D>,
    measures: Vec<f64>,
    elevations: Vec<f64>,
    parts: Vec<PartRange>,
    problem: Option<String>,
}

impl ShapeBuilder {
    pub fn new(kind: GeometryKind, profile: CoordinateProfile) -> ShapeBuilder {
        ShapeBuilder {
            kind: kind,
            profile: profile,
            vertices: vec![],
            measures: vec![],
            elevations: vec![],
            parts: vec![],
            problem: None,
        }
    }

    fn flag(&mut self, reason: String) {
        if self.problem.is_none() {
            self.problem = Some(reason);
        }
    }

    fn check_point_kind(&mut self, method: &str) -> bool {
        match self.kind {
            GeometryKind::Point | GeometryKind::MultiPoint => true,
            _ => {
                self.flag(format!("{} used on a {} shape; use add_part", method, self.kind));
                false
            }
        }
    }

    fn check_part_kind(&mut self, method: &str) -> bool {
        match self.kind {
            GeometryKind::PolyLine | GeometryKind::Polygon => true,
            _ => {
                self.flag(format!("{} used on a {} shape; use add_point", method, self.kind));
                false
            }
        }
    }

    fn check_profile(&mut self, method: &str, expected: CoordinateProfile) -> bool {
        if self.profile != expected {
            self.flag(format!("{} used on a {} shape", method, self.profile));
            return false;
        }
        true
    }

    /// Adds a single XY vertex.
    pub fn add_point(&mut self, p: Point2D) {
        if self.check_point_kind("add_point")
            && self.check_profile("add_point", CoordinateProfile::Planar)
        {
            self.vertices.push(p);
        }
    }

    /// Adds a single vertex and measure.
    pub fn add_point_m(&mut self, p: Point2D, m: f64) {
        if self.check_point_kind("add_point_m")
            && self.check_profile("add_point_m", CoordinateProfile::PlanarM)
        {
            self.vertices.push(p);
            self.measures.push(m);
        }
    }

    /// Adds a single vertex, measure, and z-value.
    pub fn add_point_z(&mut self, p: Point2D, m: f64, z: f64) {
        if self.check_point_kind("add_point_z")
            && self.check_profile("add_point_z", CoordinateProfile::PlanarZ)
        {
            self.vertices.push(p);
            self.measures.push(m);
            self.elevations.push(z);
        }
    }

    fn push_part(&mut self, points: &[Point2D]) {
        self.parts.push(PartRange::new(self.vertices.len(), points.len()));
        self.vertices.extend_from_slice(points);
    }

    /// Adds a part of XY vertices.
    pub fn add_part(&mut self, points: &[Point2D]) {
        if self.check_part_kind("add_part")
            && self.check_profile("add_part", CoordinateProfile::Planar)
        {
            self.push_part(points);
        }
    }

    /// Adds a part of vertices and measures.
    pub fn add_part_m(&mut self, points: &[Point2D], measures: &[f64]) {
        if !self.check_part_kind("add_part_m")
            || !self.check_profile("add_part_m", CoordinateProfile::PlanarM)
        {
            return;
        }
        if points.len() != measures.len() {
            self.flag("points and measures arrays must be equal length".to_string());
            return;
        }
        self.push_part(points);
        self.measures.extend_from_slice(measures);
    }

    /// Adds a part of vertices, measures, and z-values.
    pub fn add_part_z(&mut self, points: &[Point2D], measures: &[f64], z_values: &[f64]) {
        if !self.check_part_kind("add_part_z")
            || !self.check_profile("add_part_z", CoordinateProfile::PlanarZ)
        {
            return;
        }
        if points.len() != measures.len() {
            self.flag("points and measures arrays must be equal length".to_string());
            return;
        }
        if points.len() != z_values.len() {
            self.flag("points and z arrays must be equal length".to_string());
            return;
        }
        self.push_part(points);
        self.measures.extend_from_slice(measures);
        self.elevations.extend_from_slice(z_values);
    }

    pub fn build(self) -> Result<Shape> {
        if let Some(reason) = self.problem {
            return Err(ShapefileError::MalformedShape { reason: reason });
        }
        let parts = match self.kind {
            GeometryKind::Point => {
                if self.vertices.len() != 1 {
                    return Err(ShapefileError::MalformedShape {
                        reason: format!(
                            "a Point shape holds exactly one vertex, found {}",
                            self.vertices.len()
                        ),
                    });
                }
                vec![PartRange::new(0, 1)]
            }
            GeometryKind::MultiPoint => vec![PartRange::new(0, self.vertices.len())],
            GeometryKind::PolyLine | GeometryKind::Polygon => {
                if self.parts.is_empty() {
                    return Err(ShapefileError::MalformedShape {
                        reason: format!("a {} shape needs at least one part", self.kind),
                    });
                }
                if let Some(i) = self.parts.iter().position(|p| p.count == 0) {
                    return Err(ShapefileError::MalformedShape {
                        reason: format!("part {} has no vertices", i),
                    });
                }
                self.parts
            }
        };

        let bounding_box = BoundingBox::from_points(&self.vertices);
        let (measures, m_range) = if self.profile.has_m() {
            let r = ValueRange::from_values(&self.measures);
            (Some(self.measures), Some(r))
        } else {
            (None, None)
        };
        let (elevations, z_range) = if self.profile.has_z() {
            let r = ValueRange::from_values(&self.elevations);
            (Some(self.elevations), Some(r))
        } else {
            (None, None)
        };

        Ok(Shape {
            record_number: 0,
            shape_type: ShapeType::from_parts(self.kind, self.profile),
            extent: Extent {
                bounding_box: bounding_box,
                z_range: z_range,
                m_range: m_range,
            },
            vertices: self.vertices,
            measures: measures,
            elevations: elevations,
            parts: parts,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_shape_type_tags() {
        for tag in [0, 1, 3, 5, 8, 11, 13, 15, 18, 21, 23, 25, 28] {
            let st = ShapeType::from_int(tag).unwrap();
            assert_eq!(st.to_int(), tag);
            if let Some(kind) = st.kind() {
                assert_eq!(ShapeType::from_parts(kind, st.profile()), st);
            }
        }
        assert_eq!(ShapeType::from_int(31), None);
        assert_eq!(ShapeType::from_int(2), None);
        assert_eq!(ShapeType::PolygonM.kind(), Some(GeometryKind::Polygon));
        assert_eq!(ShapeType::MultiPointZ.profile(), CoordinateProfile::PlanarZ);
        assert!(CoordinateProfile::PlanarZ.has_m());
    }

    #[test]
    fn test_polyline_parts_are_views() {
        let mut b = Shape::builder(GeometryKind::PolyLine, CoordinateProfile::Planar);
        b.add_part(&[
            Point2D::new(0.0, 0.0),
            Point2D::new(1.0, 1.0),
            Point2D::new(2.0, 0.0),
        ]);
        b.add_part(&[Point2D::new(5.0, 5.0), Point2D::new(6.0, -1.0)]);
        let shape = b.build().unwrap();
        assert_eq!(shape.shape_type(), ShapeType::PolyLine);
        assert_eq!(shape.parts(), &[PartRange::new(0, 3), PartRange::new(3, 2)]);
        assert_eq!(shape.part_vertices(1), &[Point2D::new(5.0, 5.0), Point2D::new(6.0, -1.0)]);
        assert_eq!(shape.extent().bounding_box, BoundingBox::new(0.0, 6.0, -1.0, 5.0));
        assert!(shape.measures().is_none());
        assert!(shape.part_measures(0).is_none());
        assert!(shape.part_elevations(1).is_none());
        assert!(shape.extent().m_range.is_none());
    }

    #[test]
    fn test_part_measures_and_elevations() {
        let mut b = Shape::builder(GeometryKind::Polygon, CoordinateProfile::PlanarZ);
        let ring = [
            Point2D::new(0.0, 0.0),
            Point2D::new(0.0, 1.0),
            Point2D::new(1.0, 0.0),
            Point2D::new(0.0, 0.0),
        ];
        b.add_part_z(&ring, &[1.0, 2.0, 3.0, 4.0], &[10.0, 20.0, 30.0, 40.0]);
        b.add_part_z(&ring[..3], &[5.0, 6.0, 7.0], &[50.0, 60.0, 70.0]);
        let shape = b.build().unwrap();
        assert_eq!(shape.part_measures(0), Some(&[1.0, 2.0, 3.0, 4.0][..]));
        assert_eq!(shape.part_measures(1), Some(&[5.0, 6.0, 7.0][..]));
        assert_eq!(shape.part_elevations(1), Some(&[50.0, 60.0, 70.0][..]));
        assert_eq!(shape.part_elevations(0).map(|z| z.len()), Some(4));
    }

    #[test]
    fn test_z_profile_carries_measures() {
        let mut b = Shape::builder(GeometryKind::MultiPoint, CoordinateProfile::PlanarZ);
        b.add_point_z(Point2D::new(1.0, 2.0), 0.5, 10.0);
        b.add_point_z(Point2D::new(3.0, 4.0), 1.5, -2.0);
        let shape = b.build().unwrap();
        assert_eq!(shape.shape_type(), ShapeType::MultiPointZ);
        assert_eq!(shape.measures(), Some(&[0.5, 1.5][..]));
        assert_eq!(shape.elevations(), Some(&[10.0, -2.0][..]));
        assert_eq!(shape.extent().z_range, Some(ValueRange::new(-2.0, 10.0)));
        assert_eq!(shape.parts(), &[PartRange::new(0, 2)]);
    }

    #[test]
    fn test_builder_rejects_misuse() {
        let mut b = Shape::builder(GeometryKind::Point, CoordinateProfile::Planar);
        b.add_point(Point2D::new(1.0, 1.0));
        b.add_point(Point2D::new(2.0, 2.0));
        assert!(b.build().is_err());

        let mut b = Shape::builder(GeometryKind::Polygon, CoordinateProfile::PlanarM);
        b.add_part(&[Point2D::new(1.0, 1.0)]);
        assert!(b.build().is_err());

        let mut b = Shape::builder(GeometryKind::PolyLine, CoordinateProfile::PlanarM);
        b.add_part_m(&[Point2D::new(1.0, 1.0), Point2D::new(2.0, 1.0)], &[1.0]);
        assert!(b.build().is_err());

        let b = Shape::builder(GeometryKind::PolyLine, CoordinateProfile::Planar);
        assert!(b.build().is_err());
    }

    #[test]
    fn test_null_shape() {
        let shape = Shape::null();
        assert!(shape.is_null());
        assert_eq!(shape.num_points(), 0);
        assert_eq!(shape.num_parts(), 0);
        assert!(shape.extent().is_empty());
    }
}
