// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Planar polygon types used for footprints, tiles and fragments

use crate::error::{Error, Result};
use nalgebra::Point2;

/// Axis-aligned bounding box in the XY plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds2D {
    pub min: Point2<f64>,
    pub max: Point2<f64>,
}

impl Bounds2D {
    /// Check if two bounding boxes overlap (touching counts as overlap)
    #[inline]
    pub fn overlaps(&self, other: &Bounds2D) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Grow this box to cover another one
    #[inline]
    pub fn expand(&mut self, other: &Bounds2D) {
        self.min.x = self.min.x.min(other.min.x);
        self.min.y = self.min.y.min(other.min.y);
        self.max.x = self.max.x.max(other.max.x);
        self.max.y = self.max.y.max(other.max.y);
    }
}

/// 2D polygon with optional holes
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon2D {
    /// Outer boundary (counter-clockwise)
    pub outer: Vec<Point2<f64>>,
    /// Holes (clockwise)
    pub holes: Vec<Vec<Point2<f64>>>,
}

impl Polygon2D {
    /// Create a new polygon without holes
    pub fn new(outer: Vec<Point2<f64>>) -> Self {
        Self {
            outer,
            holes: Vec::new(),
        }
    }

    /// Build an axis-aligned rectangle; handy for regular tile grids
    pub fn rectangle(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self::new(vec![
            Point2::new(min_x, min_y),
            Point2::new(max_x, min_y),
            Point2::new(max_x, max_y),
            Point2::new(min_x, max_y),
        ])
    }

    /// Add a hole to the polygon
    pub fn add_hole(&mut self, hole: Vec<Point2<f64>>) {
        self.holes.push(hole);
    }

    /// Iterate over all rings, outer first
    pub fn rings(&self) -> impl Iterator<Item = &[Point2<f64>]> {
        std::iter::once(self.outer.as_slice()).chain(self.holes.iter().map(|h| h.as_slice()))
    }

    /// Bounding box of the outer ring
    pub fn bounds(&self) -> Option<Bounds2D> {
        ring_bounds(&self.outer)
    }

    /// Reject rings with too few vertices or non-finite coordinates
    pub fn validate(&self) -> Result<()> {
        if self.outer.len() < 3 {
            return Err(Error::InvalidPolygon(format!(
                "outer ring has {} vertices, at least 3 required",
                self.outer.len()
            )));
        }
        for (i, hole) in self.holes.iter().enumerate() {
            if hole.len() < 3 {
                return Err(Error::InvalidPolygon(format!(
                    "hole {} has {} vertices, at least 3 required",
                    i,
                    hole.len()
                )));
            }
        }
        let mut index = 0;
        for ring in self.rings() {
            for p in ring {
                if !p.x.is_finite() || !p.y.is_finite() {
                    return Err(Error::NonFiniteCoordinate { index });
                }
                index += 1;
            }
        }
        Ok(())
    }
}

/// A set of disjoint polygons, the general result of overlay operations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultiPolygon2D {
    pub polygons: Vec<Polygon2D>,
}

impl MultiPolygon2D {
    pub fn new(polygons: Vec<Polygon2D>) -> Self {
        Self { polygons }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Polygon2D> {
        self.polygons.iter()
    }

    /// Bounding box over all member polygons
    pub fn bounds(&self) -> Option<Bounds2D> {
        let mut iter = self.polygons.iter().filter_map(|p| p.bounds());
        let mut bounds = iter.next()?;
        for b in iter {
            bounds.expand(&b);
        }
        Some(bounds)
    }

    pub fn validate(&self) -> Result<()> {
        self.polygons.iter().try_for_each(|p| p.validate())
    }
}

impl From<Polygon2D> for MultiPolygon2D {
    fn from(polygon: Polygon2D) -> Self {
        Self {
            polygons: vec![polygon],
        }
    }
}

/// Compute bounding box of a ring
pub fn ring_bounds(ring: &[Point2<f64>]) -> Option<Bounds2D> {
    let first = ring.first()?;
    let mut min = *first;
    let mut max = *first;

    for p in ring.iter().skip(1) {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }

    Some(Bounds2D { min, max })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_bounds() {
        let rect = Polygon2D::rectangle(1.0, 2.0, 5.0, 7.0);
        let bounds = rect.bounds().unwrap();
        assert_eq!(bounds.min, Point2::new(1.0, 2.0));
        assert_eq!(bounds.max, Point2::new(5.0, 7.0));
    }

    #[test]
    fn test_multipolygon_bounds_cover_all_members() {
        let multi = MultiPolygon2D::new(vec![
            Polygon2D::rectangle(0.0, 0.0, 1.0, 1.0),
            Polygon2D::rectangle(4.0, -2.0, 6.0, 0.5),
        ]);
        let bounds = multi.bounds().unwrap();
        assert_eq!(bounds.min, Point2::new(0.0, -2.0));
        assert_eq!(bounds.max, Point2::new(6.0, 1.0));
        assert!(MultiPolygon2D::empty().bounds().is_none());
    }

    #[test]
    fn test_bounds_overlap() {
        let a = Polygon2D::rectangle(0.0, 0.0, 10.0, 10.0).bounds().unwrap();
        let b = Polygon2D::rectangle(5.0, 5.0, 15.0, 15.0).bounds().unwrap();
        let c = Polygon2D::rectangle(20.0, 20.0, 30.0, 30.0).bounds().unwrap();

        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_validate_rejects_short_ring() {
        let poly = Polygon2D::new(vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)]);
        assert!(matches!(poly.validate(), Err(Error::InvalidPolygon(_))));
    }

    #[test]
    fn test_validate_rejects_nan() {
        let mut poly = Polygon2D::rectangle(0.0, 0.0, 1.0, 1.0);
        poly.outer[2] = Point2::new(f64::NAN, 1.0);
        assert!(matches!(
            poly.validate(),
            Err(Error::NonFiniteCoordinate { index: 2 })
        ));
    }
}
