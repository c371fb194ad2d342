// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Area annotation for footprints and fragments.

use footprint_tiler_core::{FeatureCollection, FieldType, FieldValue, Fragment, Geometry};
use footprint_tiler_geometry::{
    Error as GeometryError, GeometryService, MultiPolygon2D, MIN_AREA_THRESHOLD,
};
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::intersect::FragmentPiece;

/// Relative slack allowed when checking `fragment.area <= building.area`
const AREA_BOUND_TOLERANCE: f64 = 1e-6;

/// Planar shape of a feature: polygons normalized, meshes via footprint
/// extraction.
pub fn planar_shape(
    geometry: &Geometry,
    service: &dyn GeometryService,
) -> std::result::Result<MultiPolygon2D, GeometryError> {
    match geometry {
        Geometry::Polygon(shape) => service.normalize(shape),
        Geometry::Mesh(mesh) => service.footprint(mesh),
    }
}

/// Compute each feature's planar area and store it as a double attribute.
///
/// The field is added when absent. An existing field of another type fails
/// before anything is written. Degenerate features (including meshes with
/// nothing but vertical faces) get area 0.
pub fn annotate_area(
    collection: &mut FeatureCollection,
    field: &str,
    service: &dyn GeometryService,
) -> Result<()> {
    if let Some(def) = collection.field(field) {
        if def.field_type != FieldType::Double {
            return Err(footprint_tiler_core::Error::FieldTypeMismatch {
                field: field.to_string(),
                expected: FieldType::Double,
                found: def.field_type,
            }
            .into());
        }
    }

    let areas: Vec<f64> = collection
        .features()
        .par_iter()
        .enumerate()
        .map(|(index, feature)| {
            let shape = match planar_shape(&feature.geometry, service) {
                Ok(shape) => shape,
                Err(GeometryError::EmptyFootprint(_)) => return Ok(0.0),
                Err(e) => return Err(Error::geometry(format!("feature {}", index), e)),
            };
            service
                .area(&shape)
                .map_err(|e| Error::geometry(format!("feature {}", index), e))
        })
        .collect::<Result<_>>()?;

    collection.add_field(field, FieldType::Double)?;
    for (index, area) in areas.into_iter().enumerate() {
        collection.set_value(index, field, FieldValue::Double(area))?;
    }

    tracing::debug!(
        collection = %collection.name,
        field,
        count = collection.len(),
        "Annotated feature areas"
    );
    Ok(())
}

/// Measure intersection pieces and keep those with positive area.
///
/// Order is preserved. A fragment larger than its building beyond numeric
/// tolerance means area and intersection disagree about the footprint; the
/// call fails with [`Error::FragmentExceedsBuilding`].
pub fn measure_fragments(
    pieces: Vec<FragmentPiece>,
    service: &dyn GeometryService,
) -> Result<Vec<Fragment>> {
    let measured: Vec<Option<Fragment>> = pieces
        .into_par_iter()
        .map(|piece| {
            let area = service.area(&piece.shape).map_err(|e| {
                Error::geometry(
                    format!("fragment of building {} in tile {}", piece.building_id, piece.tile_id),
                    e,
                )
            })?;

            if area <= MIN_AREA_THRESHOLD {
                tracing::trace!(
                    building = %piece.building_id,
                    tile = %piece.tile_id,
                    area,
                    "Dropping zero-area fragment"
                );
                return Ok(None);
            }

            let slack = AREA_BOUND_TOLERANCE * piece.building_area.max(1.0);
            if area > piece.building_area + slack {
                return Err(Error::FragmentExceedsBuilding {
                    building: piece.building_id.to_string(),
                    tile: piece.tile_id.to_string(),
                    fragment_area: area,
                    building_area: piece.building_area,
                });
            }

            Ok(Some(Fragment {
                building_id: piece.building_id,
                tile_id: piece.tile_id,
                file_name: piece.file_name,
                building_area: piece.building_area,
                area,
            }))
        })
        .collect::<Result<_>>()?;

    Ok(measured.into_iter().flatten().collect())
}
