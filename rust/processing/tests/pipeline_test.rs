// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end tiling runs on small synthetic layouts.
//!
//! Tiles are vertical strips; buildings are rectangles placed so that the
//! split areas are whole numbers.

use std::sync::Arc;

use approx::assert_relative_eq;
use footprint_tiler_core::{
    BuildingFootprint, Feature, FeatureCollection, FeatureId, FieldDef, FieldType, FieldValue,
    Geometry, TilePolygon,
};
use footprint_tiler_geometry::{
    Error as GeometryError, GeometryService, Mesh, MultiPolygon2D, OverlayGeometryService,
    Point2, Point3, Polygon2D,
};
use footprint_tiler_processing::{
    intersect_tiles, measure_fragments, Error, StaticCapability, TilingConfig, TilingPipeline,
};

fn config() -> TilingConfig {
    TilingConfig {
        worker_threads: 2,
        ..TilingConfig::default()
    }
}

fn pipeline() -> TilingPipeline {
    TilingPipeline::with_config(config())
}

fn strip(id: i64, min_x: f64, max_x: f64) -> Feature {
    Feature::new(Geometry::Polygon(
        Polygon2D::rectangle(min_x, -1000.0, max_x, 1000.0).into(),
    ))
    .with("FID_tiles", FieldValue::Integer(id))
    .with("FileName", FieldValue::Text(format!("T{}.las", id)))
}

fn tiles_from(strips: Vec<Feature>) -> FeatureCollection {
    let mut fc = FeatureCollection::new(
        "tiles",
        vec![
            FieldDef::new("FID_tiles", FieldType::Integer),
            FieldDef::new("FileName", FieldType::Text),
        ],
    );
    for s in strips {
        fc.push(s).unwrap();
    }
    fc
}

/// T1 [0,8] T2 [8,20] T3 [20,40] T4 [40,41] T5 [41,48] T6 [48,60]
fn tile_strips() -> Vec<Feature> {
    vec![
        strip(1, 0.0, 8.0),
        strip(2, 8.0, 20.0),
        strip(3, 20.0, 40.0),
        strip(4, 40.0, 41.0),
        strip(5, 41.0, 48.0),
        strip(6, 48.0, 60.0),
    ]
}

fn building(id: i64, min_x: f64, max_x: f64) -> Feature {
    Feature::new(Geometry::Polygon(
        Polygon2D::rectangle(min_x, 0.0, max_x, 10.0).into(),
    ))
    .with("bldg_fid", FieldValue::Integer(id))
}

fn buildings_from(features: Vec<Feature>) -> FeatureCollection {
    let mut fc = FeatureCollection::new(
        "buildings",
        vec![FieldDef::new("bldg_fid", FieldType::Integer)],
    );
    for f in features {
        fc.push(f).unwrap();
    }
    fc
}

/// B1 splits 80/20 over T1/T2, B2 sits inside T3, B3 splits 10/70/20 over
/// T4/T5/T6, B4 lies outside every tile.
fn building_set() -> Vec<Feature> {
    vec![
        building(1, 0.0, 10.0),
        building(2, 25.0, 30.0),
        building(3, 40.0, 50.0),
        building(4, 100.0, 110.0),
    ]
}

fn assigned_tile(fc: &FeatureCollection, index: usize) -> (&FieldValue, &FieldValue) {
    let feature = &fc.features()[index];
    (feature.get("tile_id"), feature.get("file_name"))
}

#[test]
fn assigns_split_single_and_uncovered_buildings() {
    let mut buildings = buildings_from(building_set());
    let tiles = tiles_from(tile_strips());

    let report = pipeline().run(&mut buildings, &tiles).unwrap();

    assert_eq!(buildings.field("tile_id").unwrap().field_type, FieldType::Integer);
    assert_eq!(buildings.field("file_name").unwrap().field_type, FieldType::Text);

    // 80/20 split: the 20 fragment leaves 80 uncovered and wins
    assert_eq!(
        assigned_tile(&buildings, 0),
        (&FieldValue::Integer(2), &FieldValue::Text("T2.las".into()))
    );
    // one fragment passes straight through
    assert_eq!(
        assigned_tile(&buildings, 1),
        (&FieldValue::Integer(3), &FieldValue::Text("T3.las".into()))
    );
    // 10/70/20 split: metrics 90/30/80
    assert_eq!(
        assigned_tile(&buildings, 2),
        (&FieldValue::Integer(4), &FieldValue::Text("T4.las".into()))
    );
    // no overlap, no assignment
    assert!(buildings.features()[3].get("tile_id").is_null());
    assert!(buildings.features()[3].get("file_name").is_null());

    assert_eq!(report.building_count, 4);
    assert_eq!(report.tile_count, 6);
    assert_eq!(report.fragment_count, 6);
    assert_eq!(report.single_tile_buildings, 1);
    assert_eq!(report.multi_tile_buildings, 2);
    assert_eq!(report.assigned, 3);
    assert_eq!(report.unassigned, 1);
    assert!(report.assignments.get(&FeatureId::from(4)).is_none());
}

#[test]
fn result_does_not_depend_on_input_order() {
    let mut forward = buildings_from(building_set());
    pipeline()
        .run(&mut forward, &tiles_from(tile_strips()))
        .unwrap();

    let mut reversed_buildings = building_set();
    reversed_buildings.reverse();
    let mut reversed_tiles = tile_strips();
    reversed_tiles.reverse();

    let mut backward = buildings_from(reversed_buildings);
    let report = pipeline()
        .run(&mut backward, &tiles_from(reversed_tiles))
        .unwrap();

    for id in 1..=4 {
        let a = forward
            .features()
            .iter()
            .find(|f| f.get("bldg_fid") == &FieldValue::Integer(id))
            .unwrap();
        let b = backward
            .features()
            .iter()
            .find(|f| f.get("bldg_fid") == &FieldValue::Integer(id))
            .unwrap();
        assert_eq!(a.get("tile_id"), b.get("tile_id"), "building {}", id);
        assert_eq!(a.get("file_name"), b.get("file_name"), "building {}", id);
    }
    assert_eq!(report.assigned, 3);
}

#[test]
fn tied_fragments_go_to_the_highest_tile_id() {
    let strips = || vec![strip(11, 0.0, 100.0), strip(10, -100.0, 0.0)];
    let mut buildings = buildings_from(vec![building(1, -5.0, 5.0)]);

    pipeline().run(&mut buildings, &tiles_from(strips())).unwrap();
    assert_eq!(buildings.features()[0].get("tile_id"), &FieldValue::Integer(11));

    let mut reordered = strips();
    reordered.reverse();
    let mut again = buildings_from(vec![building(1, -5.0, 5.0)]);
    pipeline().run(&mut again, &tiles_from(reordered)).unwrap();
    assert_eq!(again.features()[0].get("tile_id"), &FieldValue::Integer(11));
}

#[test]
fn missing_building_id_fails_without_mutation() {
    let mut buildings = buildings_from(building_set());
    let before = buildings.clone();
    let pipeline = TilingPipeline::with_config(TilingConfig {
        building_id_field: "OBJECTID".into(),
        ..config()
    });

    let err = pipeline
        .run(&mut buildings, &tiles_from(tile_strips()))
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Data(footprint_tiler_core::Error::MissingAttribute { .. })
    ));
    assert!(err.to_string().contains("OBJECTID"));
    assert_eq!(buildings, before);
}

#[test]
fn missing_tile_label_field_fails_without_mutation() {
    let mut buildings = buildings_from(building_set());
    let before = buildings.clone();
    let mut tiles = FeatureCollection::new(
        "tiles",
        vec![FieldDef::new("FID_tiles", FieldType::Integer)],
    );
    tiles
        .push(
            Feature::new(Geometry::Polygon(
                Polygon2D::rectangle(0.0, 0.0, 10.0, 10.0).into(),
            ))
            .with("FID_tiles", FieldValue::Integer(1)),
        )
        .unwrap();

    let err = pipeline().run(&mut buildings, &tiles).unwrap_err();
    assert!(err.to_string().contains("FileName"));
    assert_eq!(buildings, before);
}

#[test]
fn duplicate_tile_ids_are_rejected() {
    let mut buildings = buildings_from(building_set());
    let tiles = tiles_from(vec![strip(1, 0.0, 8.0), strip(1, 8.0, 20.0)]);

    let err = pipeline().run(&mut buildings, &tiles).unwrap_err();
    assert!(matches!(
        err,
        Error::Data(footprint_tiler_core::Error::DuplicateId { .. })
    ));
}

#[test]
fn unavailable_capability_stops_before_any_work() {
    let mut buildings = buildings_from(building_set());
    let before = buildings.clone();
    let pipeline = TilingPipeline::new(
        Arc::new(OverlayGeometryService::new()),
        Arc::new(StaticCapability::unavailable("3D")),
        config(),
    );

    let err = pipeline
        .run(&mut buildings, &tiles_from(tile_strips()))
        .unwrap_err();

    assert_eq!(err.to_string(), "3D capability is unavailable");
    assert_eq!(buildings, before);
}

/// Delegates to i_overlay but refuses to intersect.
struct BrokenIntersection;

impl GeometryService for BrokenIntersection {
    fn footprint(&self, mesh: &Mesh) -> footprint_tiler_geometry::Result<MultiPolygon2D> {
        OverlayGeometryService.footprint(mesh)
    }

    fn normalize(&self, shape: &MultiPolygon2D) -> footprint_tiler_geometry::Result<MultiPolygon2D> {
        OverlayGeometryService.normalize(shape)
    }

    fn intersect(
        &self,
        _a: &MultiPolygon2D,
        _b: &MultiPolygon2D,
    ) -> footprint_tiler_geometry::Result<MultiPolygon2D> {
        Err(GeometryError::InvalidPolygon("engine offline".into()))
    }

    fn area(&self, shape: &MultiPolygon2D) -> footprint_tiler_geometry::Result<f64> {
        OverlayGeometryService.area(shape)
    }
}

#[test]
fn geometry_failure_aborts_without_mutation() {
    let mut buildings = buildings_from(building_set());
    buildings.add_field("tile_id", FieldType::Text).unwrap();
    buildings
        .set_value(0, "tile_id", FieldValue::Text("previous".into()))
        .unwrap();
    let before = buildings.clone();

    let pipeline = TilingPipeline::new(
        Arc::new(BrokenIntersection),
        Arc::new(StaticCapability::available("3D")),
        config(),
    );
    let err = pipeline
        .run(&mut buildings, &tiles_from(tile_strips()))
        .unwrap_err();

    assert!(matches!(err, Error::Geometry { .. }));
    assert!(err.to_string().contains("engine offline"));
    assert_eq!(buildings, before);
}

/// Closed box: floor, roof and four walls.
fn box_mesh(min_x: f64, max_x: f64, height: f64) -> Mesh {
    let mut mesh = Mesh::new();
    for z in [0.0, height] {
        for (x, y) in [(min_x, 0.0), (max_x, 0.0), (max_x, 10.0), (min_x, 10.0)] {
            mesh.add_vertex(Point3::new(x, y, z));
        }
    }
    mesh.add_triangle(0, 2, 1);
    mesh.add_triangle(0, 3, 2);
    mesh.add_triangle(4, 5, 6);
    mesh.add_triangle(4, 6, 7);
    for i in 0..4u32 {
        let j = (i + 1) % 4;
        mesh.add_triangle(i, j, j + 4);
        mesh.add_triangle(i, j + 4, i + 4);
    }
    mesh
}

#[test]
fn mesh_buildings_use_their_footprint() {
    let mut buildings = buildings_from(vec![
        Feature::new(Geometry::Mesh(box_mesh(0.0, 10.0, 15.0)))
            .with("bldg_fid", FieldValue::Integer(7)),
        // walls only: empty footprint, stays unassigned
        Feature::new(Geometry::Mesh({
            let mut mesh = Mesh::new();
            let a = mesh.add_vertex(Point3::new(25.0, 0.0, 0.0));
            let b = mesh.add_vertex(Point3::new(30.0, 0.0, 0.0));
            let c = mesh.add_vertex(Point3::new(30.0, 0.0, 5.0));
            mesh.add_triangle(a, b, c);
            mesh
        }))
        .with("bldg_fid", FieldValue::Integer(8)),
    ]);

    let report = pipeline()
        .run(&mut buildings, &tiles_from(tile_strips()))
        .unwrap();

    assert_eq!(buildings.features()[0].get("tile_id"), &FieldValue::Integer(2));
    assert!(buildings.features()[1].get("tile_id").is_null());
    assert_eq!(report.assigned, 1);
    assert_eq!(report.unassigned, 1);
}

#[test]
fn text_building_ids_and_existing_output_fields() {
    let mut buildings = FeatureCollection::new(
        "buildings",
        vec![
            FieldDef::new("bldg_fid", FieldType::Text),
            FieldDef::new("file_name", FieldType::Integer),
        ],
    );
    for (id, min_x, max_x) in [("north", 0.0, 10.0), ("south", 25.0, 30.0)] {
        buildings
            .push(
                Feature::new(Geometry::Polygon(
                    Polygon2D::rectangle(min_x, 0.0, max_x, 10.0).into(),
                ))
                .with("bldg_fid", FieldValue::Text(id.into()))
                .with("file_name", FieldValue::Integer(0)),
            )
            .unwrap();
    }

    pipeline()
        .run(&mut buildings, &tiles_from(tile_strips()))
        .unwrap();

    assert_eq!(buildings.field("file_name").unwrap().field_type, FieldType::Text);
    assert_eq!(
        assigned_tile(&buildings, 0),
        (&FieldValue::Integer(2), &FieldValue::Text("T2.las".into()))
    );
    assert_eq!(
        assigned_tile(&buildings, 1),
        (&FieldValue::Integer(3), &FieldValue::Text("T3.las".into()))
    );
}

#[test]
fn compute_leaves_buildings_untouched() {
    let buildings = buildings_from(building_set());
    let before = buildings.clone();
    let report = pipeline()
        .compute(&buildings, &tiles_from(tile_strips()))
        .unwrap();

    assert_eq!(buildings, before);
    assert_eq!(
        report.assignments.get(&FeatureId::from(3)).unwrap().tile_id,
        FeatureId::from(4)
    );
}

#[test]
fn json_round_trip_through_a_run() {
    let buildings_json = r#"{
        "name": "buildings",
        "fields": [{"name": "bldg_fid", "field_type": "integer"}],
        "features": [
            {"attributes": {"bldg_fid": 1},
             "geometry": {"type": "polygon", "polygons": [{"outer": [[0,0],[10,0],[10,10],[0,10]]}]}}
        ]
    }"#;
    let tiles_json = r#"{
        "name": "tiles",
        "fields": [
            {"name": "FID_tiles", "field_type": "integer"},
            {"name": "FileName", "field_type": "text"}
        ],
        "features": [
            {"attributes": {"FID_tiles": 1, "FileName": "a.las"},
             "geometry": {"type": "polygon", "polygons": [{"outer": [[0,-50],[8,-50],[8,50],[0,50]]}]}},
            {"attributes": {"FID_tiles": 2, "FileName": "b.las"},
             "geometry": {"type": "polygon", "polygons": [{"outer": [[8,-50],[20,-50],[20,50],[8,50]]}]}}
        ]
    }"#;

    let mut buildings = FeatureCollection::from_json(buildings_json).unwrap();
    let tiles = FeatureCollection::from_json(tiles_json).unwrap();
    pipeline().run(&mut buildings, &tiles).unwrap();

    let reloaded = FeatureCollection::from_json(&buildings.to_json().unwrap()).unwrap();
    assert_eq!(reloaded.features()[0].get("tile_id"), &FieldValue::Integer(2));
    assert_eq!(
        reloaded.features()[0].get("file_name"),
        &FieldValue::Text("b.las".into())
    );
}

#[test]
fn self_intersecting_building_is_split_by_its_lobes() {
    // two 25-unit lobes meeting at (5, 5); T1 takes 25 + 4, T2 takes 21
    let bowtie = Polygon2D::new(vec![
        Point2::new(0.0, 0.0),
        Point2::new(10.0, 10.0),
        Point2::new(10.0, 0.0),
        Point2::new(0.0, 10.0),
    ]);
    let buildings = buildings_from(vec![Feature::new(Geometry::Polygon(bowtie.into()))
        .with("bldg_fid", FieldValue::Integer(1))]);
    let tiles = tiles_from(vec![strip(1, 0.0, 7.0), strip(2, 7.0, 20.0)]);

    let report = pipeline().compute(&buildings, &tiles).unwrap();
    assert_eq!(report.fragment_count, 2);
    assert_eq!(
        report.assignments.get(&FeatureId::from(1)).unwrap().tile_id,
        FeatureId::from(2)
    );
}

#[test]
fn overlapping_parts_count_once() {
    let parts = MultiPolygon2D::new(vec![
        Polygon2D::rectangle(0.0, 0.0, 10.0, 10.0),
        Polygon2D::rectangle(0.0, 0.0, 10.0, 10.0),
    ]);
    let mut buildings = buildings_from(vec![
        Feature::new(Geometry::Polygon(parts)).with("bldg_fid", FieldValue::Integer(1)),
    ]);

    let report = pipeline()
        .run(&mut buildings, &tiles_from(tile_strips()))
        .unwrap();

    // same 80/20 split as a single 10x10 footprint
    assert_eq!(report.assigned, 1);
    assert_eq!(
        assigned_tile(&buildings, 0),
        (&FieldValue::Integer(2), &FieldValue::Text("T2.las".into()))
    );
}

#[test]
fn fragments_stay_within_their_building_area() {
    let service = OverlayGeometryService::new();
    let mut courtyard = Polygon2D::rectangle(30.0, -5.0, 52.0, 15.0);
    courtyard.add_hole(Polygon2D::rectangle(38.0, 0.0, 45.0, 10.0).outer);
    let shapes: Vec<MultiPolygon2D> = vec![
        Polygon2D::rectangle(0.0, 0.0, 10.0, 10.0).into(),
        Polygon2D::rectangle(5.5, 3.0, 23.25, 7.5).into(),
        courtyard.into(),
        Polygon2D::rectangle(39.0, -2.0, 58.0, 4.0).into(),
    ];
    let buildings: Vec<BuildingFootprint> = shapes
        .into_iter()
        .enumerate()
        .map(|(i, shape)| {
            let shape = service.normalize(&shape).unwrap();
            BuildingFootprint {
                id: FeatureId::from(i as i64),
                area: service.area(&shape).unwrap(),
                shape,
            }
        })
        .collect();
    let tiles: Vec<TilePolygon> = [0.0, 8.0, 20.0, 40.0, 41.0, 48.0, 60.0]
        .windows(2)
        .enumerate()
        .map(|(i, x)| TilePolygon {
            id: FeatureId::from(i as i64),
            shape: Polygon2D::rectangle(x[0], -1000.0, x[1], 1000.0).into(),
            file_name: format!("T{}.las", i),
        })
        .collect();

    let pieces = intersect_tiles(&buildings, &tiles, &service).unwrap();
    let fragments = measure_fragments(pieces, &service).unwrap();
    assert!(fragments.len() > buildings.len());

    for fragment in &fragments {
        assert!(fragment.area > 0.0);
        assert!(
            fragment.area <= fragment.building_area + 1e-9,
            "building {} tile {}: {} > {}",
            fragment.building_id,
            fragment.tile_id,
            fragment.area,
            fragment.building_area
        );
    }

    // every building lies inside the strips, so its pieces add up to it
    for building in &buildings {
        let total: f64 = fragments
            .iter()
            .filter(|f| f.building_id == building.id)
            .map(|f| f.area)
            .sum();
        assert_relative_eq!(total, building.area, epsilon = 1e-6);
    }
}
