/*
This code is part of the WhiteboxTools geospatial analysis library.
Authors: WhiteboxTools developers
Created: 12/04/2018
Last Modified: 16/10/2026
License: MIT
*/
use super::Point2D;
use std::f64;

/// An XY bounding box. The default box is empty (`min > max`) and grows as
/// points are added to it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Default for BoundingBox {
    fn default() -> BoundingBox {
        BoundingBox {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }
}

impl BoundingBox {
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> BoundingBox {
        let (x1, x2) = if min_x < max_x {
            (min_x, max_x)
        } else {
            (max_x, min_x)
        };
        let (y1, y2) = if min_y < max_y {
            (min_y, max_y)
        } else {
            (max_y, min_y)
        };
        BoundingBox {
            min_x: x1,
            min_y: y1,
            max_x: x2,
            max_y: y2,
        }
    }

    /// Smallest box holding every point of the slice; empty for an empty slice.
    pub fn from_points(points: &[Point2D]) -> BoundingBox {
        let mut bb = BoundingBox::default();
        for p in points {
            bb.expand_to_point(p);
        }
        bb
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    pub fn is_point_in_box(&self, x: f64, y: f64) -> bool {
        !(self.max_y < y || self.max_x < x || self.min_y > y || self.min_x > x)
    }

    pub fn expand_to_point(&mut self, p: &Point2D) {
        if p.x < self.min_x {
            self.min_x = p.x;
        }
        if p.x > self.max_x {
            self.max_x = p.x;
        }
        if p.y < self.min_y {
            self.min_y = p.y;
        }
        if p.y > self.max_y {
            self.max_y = p.y;
        }
    }

    pub fn expand_to(&mut self, other: BoundingBox) {
        if other.is_empty() {
            return;
        }
        self.max_y = if self.max_y >= other.max_y { self.max_y } else { other.max_y };
        self.max_x = if self.max_x >= other.max_x { self.max_x } else { other.max_x };
        self.min_y = if self.min_y <= other.min_y { self.min_y } else { other.min_y };
        self.min_x = if self.min_x <= other.min_x { self.min_x } else { other.min_x };
    }
}

/// A closed `[min, max]` interval over one ordinate (Z or M).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl Default for ValueRange {
    fn default() -> ValueRange {
        ValueRange {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl ValueRange {
    pub fn new(min: f64, max: f64) -> ValueRange {
        ValueRange { min: min, max: max }
    }

    pub fn from_values(values: &[f64]) -> ValueRange {
        let mut r = ValueRange::default();
        for v in values {
            r.expand_to_value(*v);
        }
        r
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    pub fn expand_to_value(&mut self, v: f64) {
        if v < self.min {
            self.min = v;
        }
        if v > self.max {
            self.max = v;
        }
    }

    pub fn expand_to(&mut self, other: ValueRange) {
        if other.is_empty() {
            return;
        }
        self.expand_to_value(other.min);
        self.expand_to_value(other.max);
    }
}

#[cfg(test)]
mod test {
    use super::{BoundingBox, ValueRange};
    use crate::structures::Point2D;

    #[test]
    fn test_bounding_box_from_points() {
        let bb = BoundingBox::from_points(&[
            Point2D::new(1.0, 5.0),
            Point2D::new(-2.0, 3.0),
            Point2D::new(4.0, -1.0),
        ]);
        assert_eq!(bb, BoundingBox::new(-2.0, 4.0, -1.0, 5.0));
        assert!(bb.is_point_in_box(0.0, 0.0));
        assert!(!bb.is_point_in_box(5.0, 0.0));
        assert!(BoundingBox::from_points(&[]).is_empty());
    }

    #[test]
    fn test_empty_boxes_do_not_expand() {
        let mut bb = BoundingBox::new(0.0, 1.0, 0.0, 1.0);
        bb.expand_to(BoundingBox::default());
        assert_eq!(bb, BoundingBox::new(0.0, 1.0, 0.0, 1.0));

        let mut r = ValueRange::from_values(&[3.0, -1.0]);
        r.expand_to(ValueRange::default());
        assert_eq!(r, ValueRange::new(-1.0, 3.0));
    }
}
