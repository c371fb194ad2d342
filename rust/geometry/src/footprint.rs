// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Footprint extraction from 3-D building models
//!
//! A footprint is the union of all mesh triangles projected onto the XY
//! plane. Vertical faces (walls) project to zero-area slivers and drop out;
//! roofs and floors cover the outline from above and below.

use crate::bool2d::union_contours;
use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::polygon::MultiPolygon2D;
use nalgebra::Point2;

/// Project a mesh onto the XY plane and union the result into a footprint
pub fn extract_footprint(mesh: &Mesh) -> Result<MultiPolygon2D> {
    mesh.validate()?;

    if mesh.is_empty() {
        return Err(Error::EmptyFootprint("mesh has no triangles".to_string()));
    }

    let projected: Vec<Vec<Point2<f64>>> = mesh
        .triangles()
        .map(|[a, b, c]| {
            vec![
                Point2::new(a.x, a.y),
                Point2::new(b.x, b.y),
                Point2::new(c.x, c.y),
            ]
        })
        .collect();

    let footprint = union_contours(&projected);

    if footprint.is_empty() {
        return Err(Error::EmptyFootprint(format!(
            "all {} triangles are vertical or degenerate",
            mesh.triangle_count()
        )));
    }

    Ok(footprint)
}
