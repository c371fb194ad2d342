// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Building → tile assignment pipeline.
//!
//! Stages run in sequence, each consuming the previous stage's full output:
//!
//! 1. capability gate and input preconditions
//! 2. footprint extraction and whole-footprint area
//! 3. footprint × tile intersection and fragment area
//! 4. sort, count and select one tile per building
//! 5. merge the assignments back into the building collection
//!
//! Everything up to step 5 works on temporary data. The caller's collection
//! is only written once the full assignment set exists.

use std::sync::Arc;
use std::time::Instant;

use footprint_tiler_core::{
    AssignmentSet, BuildingFootprint, Feature, FeatureCollection, FeatureId, FieldDef,
    FieldValue, Geometry, TilePolygon,
};
use footprint_tiler_geometry::{
    Error as GeometryError, GeometryService, MultiPolygon2D, OverlayGeometryService,
};
use rayon::prelude::*;
use serde::Serialize;

use crate::area::{annotate_area, measure_fragments, planar_shape};
use crate::capability::{ensure_available, CapabilityProvider, StaticCapability};
use crate::config::TilingConfig;
use crate::error::{Error, Result};
use crate::grouping::{sort_fragments, FragmentCounts};
use crate::intersect::intersect_tiles;
use crate::selector::select_assignments;
use crate::writer::{write_assignments, OutputFields};

/// Name of the capability a tiling run requires.
pub const TILING_CAPABILITY: &str = "3D";

/// Summary of a tiling run.
#[derive(Debug, Clone, Serialize)]
pub struct TilingReport {
    pub building_count: usize,
    pub tile_count: usize,
    pub fragment_count: usize,
    /// Buildings inside exactly one tile
    pub single_tile_buildings: usize,
    /// Buildings spanning several tiles
    pub multi_tile_buildings: usize,
    pub assigned: usize,
    pub unassigned: usize,
    pub total_time_ms: u64,
    pub assignments: AssignmentSet,
}

/// Assigns buildings to tiles.
pub struct TilingPipeline {
    service: Arc<dyn GeometryService>,
    capability: Arc<dyn CapabilityProvider>,
    config: TilingConfig,
}

impl TilingPipeline {
    pub fn new(
        service: Arc<dyn GeometryService>,
        capability: Arc<dyn CapabilityProvider>,
        config: TilingConfig,
    ) -> Self {
        Self {
            service,
            capability,
            config,
        }
    }

    /// i_overlay geometry and an always-available capability.
    pub fn with_config(config: TilingConfig) -> Self {
        Self::new(
            Arc::new(OverlayGeometryService::new()),
            Arc::new(StaticCapability::available(TILING_CAPABILITY)),
            config,
        )
    }

    pub fn config(&self) -> &TilingConfig {
        &self.config
    }

    /// Compute assignments and write them onto `buildings`.
    ///
    /// On error the building collection is left exactly as it was.
    pub fn run(
        &self,
        buildings: &mut FeatureCollection,
        tiles: &FeatureCollection,
    ) -> Result<TilingReport> {
        let total_start = Instant::now();
        let mut report = self.compute(buildings, tiles)?;

        let assigned = write_assignments(
            buildings,
            &report.assignments,
            OutputFields {
                building_id: &self.config.building_id_field,
                tile_id: &self.config.output_tile_id_field,
                file_name: &self.config.output_file_name_field,
            },
        )?;
        debug_assert_eq!(assigned, report.assigned);

        report.total_time_ms = total_start.elapsed().as_millis() as u64;
        tracing::info!(
            buildings = report.building_count,
            assigned = report.assigned,
            unassigned = report.unassigned,
            total_time_ms = report.total_time_ms,
            "Tiling complete"
        );
        Ok(report)
    }

    /// Compute the assignment set without touching any input.
    pub fn compute(
        &self,
        buildings: &FeatureCollection,
        tiles: &FeatureCollection,
    ) -> Result<TilingReport> {
        let start = Instant::now();

        self.config.validate()?;
        ensure_available(self.capability.as_ref())?;

        let building_ids = buildings.unique_ids(&self.config.building_id_field)?;
        let tile_ids = tiles.unique_ids(&self.config.tile_id_field)?;
        tiles.require_field(&self.config.file_name_field)?;

        tracing::info!(
            buildings = building_ids.len(),
            tiles = tile_ids.len(),
            workers = self.config.worker_threads,
            "Starting tiling run"
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.worker_threads)
            .build()
            .map_err(|e| Error::ThreadPool(e.to_string()))?;

        let assignments_and_counts =
            pool.install(|| self.compute_assignments(buildings, &building_ids, tiles, &tile_ids))?;
        let (assignments, counts, fragment_count) = assignments_and_counts;

        let report = TilingReport {
            building_count: building_ids.len(),
            tile_count: tile_ids.len(),
            fragment_count,
            single_tile_buildings: counts.single_count(),
            multi_tile_buildings: counts.multi_count(),
            assigned: assignments.len(),
            unassigned: building_ids.len() - assignments.len(),
            total_time_ms: start.elapsed().as_millis() as u64,
            assignments,
        };
        Ok(report)
    }

    fn compute_assignments(
        &self,
        buildings: &FeatureCollection,
        building_ids: &[FeatureId],
        tiles: &FeatureCollection,
        tile_ids: &[FeatureId],
    ) -> Result<(AssignmentSet, FragmentCounts, usize)> {
        let service = self.service.as_ref();

        let footprint_start = Instant::now();
        let footprints = self.building_footprints(buildings, building_ids)?;
        let tile_polygons = self.tile_polygons(tiles, tile_ids)?;
        tracing::info!(
            footprints = footprints.len(),
            tiles = tile_polygons.len(),
            footprint_time_ms = footprint_start.elapsed().as_millis(),
            "Footprints extracted"
        );

        let intersect_start = Instant::now();
        let pieces = intersect_tiles(&footprints, &tile_polygons, service)?;
        let mut fragments = measure_fragments(pieces, service)?;
        tracing::info!(
            fragments = fragments.len(),
            intersect_time_ms = intersect_start.elapsed().as_millis(),
            "Intersection complete"
        );

        let select_start = Instant::now();
        sort_fragments(&mut fragments);
        let counts = FragmentCounts::from_fragments(&fragments);
        let assignments = select_assignments(&fragments, &counts);
        debug_assert_eq!(assignments.len(), counts.building_count());
        tracing::info!(
            single = counts.single_count(),
            multi = counts.multi_count(),
            assigned = assignments.len(),
            select_time_ms = select_start.elapsed().as_millis(),
            "Tile selection complete"
        );

        Ok((assignments, counts, fragments.len()))
    }

    /// Footprints with whole-footprint area, via a temporary collection.
    fn building_footprints(
        &self,
        buildings: &FeatureCollection,
        building_ids: &[FeatureId],
    ) -> Result<Vec<BuildingFootprint>> {
        let service = self.service.as_ref();
        let id_field = &self.config.building_id_field;
        let area_field = &self.config.orig_area_field;

        let shapes: Vec<MultiPolygon2D> = buildings
            .features()
            .par_iter()
            .zip(building_ids.par_iter())
            .map(|(feature, id)| match planar_shape(&feature.geometry, service) {
                Ok(shape) => Ok(shape),
                Err(GeometryError::EmptyFootprint(reason)) => {
                    tracing::warn!(building = %id, %reason, "Building has an empty footprint");
                    Ok(MultiPolygon2D::empty())
                }
                Err(e) => Err(Error::geometry(format!("footprint of building {}", id), e)),
            })
            .collect::<Result<_>>()?;

        let id_type = buildings.require_field(id_field)?.field_type;
        let mut footprints =
            FeatureCollection::new("footprints", vec![FieldDef::new(id_field.as_str(), id_type)]);
        for (shape, id) in shapes.into_iter().zip(building_ids) {
            footprints.push(
                Feature::new(Geometry::Polygon(shape)).with(id_field, id.to_value()),
            )?;
        }

        annotate_area(&mut footprints, area_field, service)?;

        footprints
            .features()
            .iter()
            .zip(building_ids)
            .map(|(feature, id)| {
                let shape = match &feature.geometry {
                    Geometry::Polygon(shape) => shape.clone(),
                    Geometry::Mesh(_) => MultiPolygon2D::empty(),
                };
                Ok(BuildingFootprint {
                    id: id.clone(),
                    shape,
                    area: feature.get(area_field).as_f64().unwrap_or(0.0),
                })
            })
            .collect()
    }

    fn tile_polygons(
        &self,
        tiles: &FeatureCollection,
        tile_ids: &[FeatureId],
    ) -> Result<Vec<TilePolygon>> {
        let service = self.service.as_ref();
        let label_field = &self.config.file_name_field;

        tiles
            .features()
            .par_iter()
            .zip(tile_ids.par_iter())
            .map(|(feature, id)| {
                let shape = planar_shape(&feature.geometry, service)
                    .map_err(|e| Error::geometry(format!("tile {}", id), e))?;
                Ok(TilePolygon {
                    id: id.clone(),
                    shape,
                    file_name: file_label(feature.get(label_field)),
                })
            })
            .collect()
    }
}

/// Text form of a tile's file-name label; null becomes empty.
fn file_label(value: &FieldValue) -> String {
    match value {
        FieldValue::Null => String::new(),
        FieldValue::Text(s) => s.clone(),
        other => other.to_string(),
    }
}
