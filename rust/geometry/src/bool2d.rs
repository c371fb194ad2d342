// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D Boolean Operations for Footprints and Tiles
//!
//! Thin wrapper over the i_overlay crate. Footprints are intersected with
//! tile polygons to produce fragments, and projected mesh triangles are
//! unioned into a single footprint outline.

use crate::error::Result;
use crate::polygon::{MultiPolygon2D, Polygon2D};
use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use nalgebra::Point2;

/// Minimum area threshold - polygons smaller than this are considered degenerate
pub const MIN_AREA_THRESHOLD: f64 = 1e-10;

/// Intersect two polygon sets: `a ∩ b`
///
/// Both inputs are validated first. An empty result is not an error; it means
/// the shapes do not overlap (or only touch along an edge or a vertex).
pub fn intersect_2d(a: &MultiPolygon2D, b: &MultiPolygon2D) -> Result<MultiPolygon2D> {
    a.validate()?;
    b.validate()?;

    if a.is_empty() || b.is_empty() {
        return Ok(MultiPolygon2D::empty());
    }

    let subject = multipolygon_to_paths(a);
    let clip = multipolygon_to_paths(b);

    // Result is Vec<Vec<Vec<[f64; 2]>>> - Vec of shapes, each shape is Vec of contours
    let result = subject.overlay(&clip, OverlayRule::Intersect, FillRule::EvenOdd);

    Ok(shapes_to_multipolygon(&result))
}

/// Union a set of contours into disjoint polygons
///
/// Contours are normalized to counter-clockwise winding and combined with the
/// non-zero fill rule, so overlapping inputs merge instead of cancelling out.
/// Degenerate contours are skipped.
pub fn union_contours(contours: &[Vec<Point2<f64>>]) -> MultiPolygon2D {
    let mut valid = contours
        .iter()
        .filter(|c| is_valid_contour(c))
        .map(|c| contour_to_path(&ensure_ccw(c)));

    // Start with first contour as subject
    let subject: Vec<Vec<[f64; 2]>> = match valid.next() {
        Some(first) => vec![first],
        None => return MultiPolygon2D::empty(),
    };

    // Collect all other contours as clip
    let clip: Vec<Vec<[f64; 2]>> = valid.collect();

    if clip.is_empty() {
        return shapes_to_multipolygon(&[subject]);
    }

    let result = subject.overlay(&clip, OverlayRule::Union, FillRule::NonZero);

    shapes_to_multipolygon(&result)
}

/// Resolve a polygon set into disjoint, simple polygons
///
/// Outer rings are wound counter-clockwise and holes clockwise, then all
/// rings are unioned with the non-zero fill rule. Self-intersecting rings
/// split into their lobes and overlapping members merge, so the shoelace
/// area of the result matches what [`intersect_2d`] sees. Degenerate input
/// yields an empty set.
pub fn normalize_polygons(shape: &MultiPolygon2D) -> Result<MultiPolygon2D> {
    shape.validate()?;

    let subject: Vec<Vec<[f64; 2]>> = multipolygon_to_paths(shape);
    if subject.is_empty() {
        return Ok(MultiPolygon2D::empty());
    }

    let clip: Vec<Vec<[f64; 2]>> = Vec::new();
    let result = subject.overlay(&clip, OverlayRule::Union, FillRule::NonZero);

    Ok(shapes_to_multipolygon(&result))
}

/// Planar area of a polygon: outer ring minus holes
pub fn polygon_area(polygon: &Polygon2D) -> f64 {
    let outer = compute_signed_area(&polygon.outer).abs();
    let holes: f64 = polygon
        .holes
        .iter()
        .map(|h| compute_signed_area(h).abs())
        .sum();
    (outer - holes).max(0.0)
}

/// Planar area of a polygon set (members are assumed disjoint)
pub fn multipolygon_area(shape: &MultiPolygon2D) -> f64 {
    shape.iter().map(polygon_area).sum()
}

/// Check if a contour is valid (has area, not degenerate)
pub fn is_valid_contour(contour: &[Point2<f64>]) -> bool {
    if contour.len() < 3 {
        return false;
    }

    let area = compute_signed_area(contour).abs();
    area > MIN_AREA_THRESHOLD
}

/// Compute the signed area of a 2D contour
/// Positive = counter-clockwise, Negative = clockwise
pub fn compute_signed_area(contour: &[Point2<f64>]) -> f64 {
    if contour.len() < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    let n = contour.len();

    for i in 0..n {
        let j = (i + 1) % n;
        area += contour[i].x * contour[j].y;
        area -= contour[j].x * contour[i].y;
    }

    area * 0.5
}

/// Ensure contour has counter-clockwise winding (positive area)
pub fn ensure_ccw(contour: &[Point2<f64>]) -> Vec<Point2<f64>> {
    let area = compute_signed_area(contour);
    if area < 0.0 {
        contour.iter().rev().cloned().collect()
    } else {
        contour.to_vec()
    }
}

/// Ensure contour has clockwise winding (for holes)
pub fn ensure_cw(contour: &[Point2<f64>]) -> Vec<Point2<f64>> {
    let area = compute_signed_area(contour);
    if area > 0.0 {
        contour.iter().rev().cloned().collect()
    } else {
        contour.to_vec()
    }
}

// ============================================================================
// Internal Helper Functions
// ============================================================================

/// Convert a polygon set to i_overlay path format
///
/// Outer rings go in counter-clockwise, holes clockwise. Even-odd fill
/// ignores orientation; non-zero fill needs it to keep holes open.
fn multipolygon_to_paths(shape: &MultiPolygon2D) -> Vec<Vec<[f64; 2]>> {
    let ring_count: usize = shape.iter().map(|p| 1 + p.holes.len()).sum();
    let mut paths = Vec::with_capacity(ring_count);

    for polygon in shape.iter() {
        paths.push(contour_to_path(&ensure_ccw(&polygon.outer)));
        for hole in &polygon.holes {
            paths.push(contour_to_path(&ensure_cw(hole)));
        }
    }

    paths
}

/// Convert a Point2 contour to i_overlay path format
fn contour_to_path(contour: &[Point2<f64>]) -> Vec<[f64; 2]> {
    contour.iter().map(|p| [p.x, p.y]).collect()
}

fn path_to_contour(path: &[[f64; 2]]) -> Vec<Point2<f64>> {
    path.iter().map(|p| Point2::new(p[0], p[1])).collect()
}

/// Convert i_overlay result shapes back to polygons
///
/// i_overlay returns Vec<Vec<Vec<[f64; 2]>>> where:
/// - Outer Vec: list of shapes
/// - Middle Vec: list of contours per shape (first is outer, rest are holes)
/// - Inner Vec: list of points per contour
///
/// Shapes whose outer ring is degenerate are dropped.
fn shapes_to_multipolygon(shapes: &[Vec<Vec<[f64; 2]>>]) -> MultiPolygon2D {
    let mut polygons = Vec::with_capacity(shapes.len());

    for shape in shapes {
        let Some(outer) = shape.first() else {
            continue;
        };
        let outer = path_to_contour(outer);
        if !is_valid_contour(&outer) {
            continue;
        }

        let mut polygon = Polygon2D::new(ensure_ccw(&outer));
        for contour in shape.iter().skip(1) {
            let hole = path_to_contour(contour);
            if is_valid_contour(&hole) {
                polygon.add_hole(ensure_cw(&hole));
            }
        }
        polygons.push(polygon);
    }

    MultiPolygon2D::new(polygons)
}
