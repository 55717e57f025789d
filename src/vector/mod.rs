/*
This code is part of the WhiteboxTools geospatial analysis library.
Authors: Dr. John Lindsay
Created: June 21, 2017
Last Modified: 16/10/2026
License: MIT
*/

// private sub-module defined in other files
pub mod shapefile;

// exports identifiers from private sub-modules in the current module namespace
pub use crate::structures::Point2D;
pub use crate::vector::shapefile::geometry::*;
pub use crate::vector::shapefile::header::ShapefileHeader;
pub use crate::vector::shapefile::index::IndexEntry;
pub use crate::vector::shapefile::record::RecordCodec;
pub use crate::vector::shapefile::{CodecState, ProgressObserver, Shapefile};
