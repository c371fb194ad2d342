// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry service boundary
//!
//! The tiling pipeline treats footprint extraction, intersection and area as
//! black-box primitives behind [`GeometryService`]. [`OverlayGeometryService`]
//! is the bundled implementation on top of i_overlay.

use crate::bool2d::{intersect_2d, multipolygon_area, normalize_polygons};
use crate::error::Result;
use crate::footprint::extract_footprint;
use crate::mesh::Mesh;
use crate::polygon::MultiPolygon2D;

/// Geometric primitives consumed by the tiling pipeline
///
/// Implementations must be thread-safe: the pipeline calls them from a
/// rayon pool.
pub trait GeometryService: Send + Sync {
    /// Project a 3-D model onto the XY plane
    fn footprint(&self, mesh: &Mesh) -> Result<MultiPolygon2D>;

    /// Resolve self-intersections and overlapping members
    ///
    /// Area and intersection are only consistent on normalized shapes.
    fn normalize(&self, shape: &MultiPolygon2D) -> Result<MultiPolygon2D>;

    /// Intersect two polygon sets
    fn intersect(&self, a: &MultiPolygon2D, b: &MultiPolygon2D) -> Result<MultiPolygon2D>;

    /// Planar area of a polygon set
    fn area(&self, shape: &MultiPolygon2D) -> Result<f64>;
}

/// i_overlay backed geometry service
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlayGeometryService;

impl OverlayGeometryService {
    pub fn new() -> Self {
        Self
    }
}

impl GeometryService for OverlayGeometryService {
    fn footprint(&self, mesh: &Mesh) -> Result<MultiPolygon2D> {
        extract_footprint(mesh)
    }

    fn normalize(&self, shape: &MultiPolygon2D) -> Result<MultiPolygon2D> {
        normalize_polygons(shape)
    }

    fn intersect(&self, a: &MultiPolygon2D, b: &MultiPolygon2D) -> Result<MultiPolygon2D> {
        intersect_2d(a, b)
    }

    fn area(&self, shape: &MultiPolygon2D) -> Result<f64> {
        shape.validate()?;
        Ok(multipolygon_area(shape))
    }
}
