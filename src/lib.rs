/*
This code is part of the WhiteboxTools geospatial analysis library.
Authors: WhiteboxTools developers
Created: 16/10/2026
Last Modified: 16/10/2026
License: MIT
*/

//! Reading and writing of ESRI Shapefile geometry (.shp) and index (.shx)
//! files.

pub mod configs;
pub mod error;
pub mod structures;
pub mod utils;
pub mod vector;

pub use crate::error::{Result, ShapefileError};
pub use crate::vector::Shapefile;
