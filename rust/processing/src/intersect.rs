// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Footprint × tile intersection.
//!
//! Every building is tested against every tile whose bounding box overlaps
//! its own; each non-empty overlap becomes one [`FragmentPiece`]. A building
//! inside a single tile yields exactly one piece.

use footprint_tiler_core::{BuildingFootprint, FeatureId, TilePolygon};
use footprint_tiler_geometry::{Bounds2D, GeometryService, MultiPolygon2D};
use rayon::prelude::*;

use crate::error::{Error, Result};

/// Unmeasured overlap of one building with one tile.
#[derive(Debug, Clone)]
pub struct FragmentPiece {
    pub building_id: FeatureId,
    pub tile_id: FeatureId,
    pub file_name: String,
    pub building_area: f64,
    pub shape: MultiPolygon2D,
}

/// Intersect all footprints with all tiles.
///
/// Output order is building input order, then tile input order.
pub fn intersect_tiles(
    buildings: &[BuildingFootprint],
    tiles: &[TilePolygon],
    service: &dyn GeometryService,
) -> Result<Vec<FragmentPiece>> {
    let tile_bounds: Vec<Option<Bounds2D>> = tiles.iter().map(|t| t.shape.bounds()).collect();

    let per_building: Vec<Vec<FragmentPiece>> = buildings
        .par_iter()
        .map(|building| intersect_building(building, tiles, &tile_bounds, service))
        .collect::<Result<_>>()?;

    let pieces: Vec<FragmentPiece> = per_building.into_iter().flatten().collect();

    tracing::debug!(
        buildings = buildings.len(),
        tiles = tiles.len(),
        pieces = pieces.len(),
        "Intersected footprints with tiles"
    );
    Ok(pieces)
}

fn intersect_building(
    building: &BuildingFootprint,
    tiles: &[TilePolygon],
    tile_bounds: &[Option<Bounds2D>],
    service: &dyn GeometryService,
) -> Result<Vec<FragmentPiece>> {
    let Some(bounds) = building.shape.bounds() else {
        return Ok(Vec::new());
    };

    let mut pieces = Vec::new();
    for (tile, tb) in tiles.iter().zip(tile_bounds) {
        match tb {
            Some(tb) if tb.overlaps(&bounds) => {}
            _ => continue,
        }

        let shape = service.intersect(&building.shape, &tile.shape).map_err(|e| {
            Error::geometry(
                format!("building {} against tile {}", building.id, tile.id),
                e,
            )
        })?;

        if shape.is_empty() {
            continue;
        }

        pieces.push(FragmentPiece {
            building_id: building.id.clone(),
            tile_id: tile.id.clone(),
            file_name: tile.file_name.clone(),
            building_area: building.area,
            shape,
        });
    }

    if pieces.len() > 1 {
        tracing::trace!(building = %building.id, tiles = pieces.len(), "Building spans several tiles");
    }
    Ok(pieces)
}
