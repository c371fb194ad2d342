// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Footprint Tiler Geometry
//!
//! Planar geometry primitives for assigning buildings to tiles: footprint
//! extraction from triangle meshes, polygon intersection via i_overlay, and
//! area computation.

pub mod bool2d;
pub mod error;
pub mod footprint;
pub mod mesh;
pub mod polygon;
pub mod service;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Point3};

pub use bool2d::{
    intersect_2d, multipolygon_area, normalize_polygons, polygon_area, union_contours,
    MIN_AREA_THRESHOLD,
};
pub use error::{Error, Result};
pub use footprint::extract_footprint;
pub use mesh::Mesh;
pub use polygon::{Bounds2D, MultiPolygon2D, Polygon2D};
pub use service::{GeometryService, OverlayGeometryService};
