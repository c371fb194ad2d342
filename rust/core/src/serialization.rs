// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JSON serialization for feature collections.
//!
//! Geometry goes through plain snapshot structs (`[x, y]` arrays) so the
//! interchange format does not depend on nalgebra's serde layout.

use std::collections::BTreeMap;
use std::path::Path;

use footprint_tiler_geometry::{Mesh, MultiPolygon2D, Point2, Polygon2D};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::feature::{Feature, FeatureCollection, FieldDef, Geometry};
use crate::value::{FieldType, FieldValue};

/// Serializable representation of a feature collection.
#[derive(Debug, Serialize, Deserialize)]
pub struct CollectionSnapshot {
    pub name: String,
    pub fields: Vec<FieldSnapshot>,
    pub features: Vec<FeatureSnapshot>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FieldSnapshot {
    pub name: String,
    pub field_type: FieldType,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FeatureSnapshot {
    #[serde(default)]
    pub attributes: BTreeMap<String, FieldValue>,
    pub geometry: GeometrySnapshot,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GeometrySnapshot {
    Polygon { polygons: Vec<PolygonSnapshot> },
    Mesh { positions: Vec<f64>, indices: Vec<u32> },
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PolygonSnapshot {
    pub outer: Vec<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub holes: Vec<Vec<[f64; 2]>>,
}

impl FeatureCollection {
    /// Serializes the collection to a pretty JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_snapshot())?)
    }

    /// Parses a collection, coercing attribute values to the declared schema.
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: CollectionSnapshot = serde_json::from_str(json)?;
        Self::from_snapshot(snapshot)
    }

    pub fn read_json(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    fn to_snapshot(&self) -> CollectionSnapshot {
        let fields = self
            .fields()
            .iter()
            .map(|f| FieldSnapshot {
                name: f.name.clone(),
                field_type: f.field_type,
            })
            .collect();

        // Every schema field is written, nulls included, so the output is
        // self-describing even for unassigned features.
        let features = self
            .features()
            .iter()
            .map(|feature| FeatureSnapshot {
                attributes: self
                    .fields()
                    .iter()
                    .map(|f| (f.name.clone(), feature.get(&f.name).clone()))
                    .collect(),
                geometry: geometry_to_snapshot(&feature.geometry),
            })
            .collect();

        CollectionSnapshot {
            name: self.name.clone(),
            fields,
            features,
        }
    }

    fn from_snapshot(snapshot: CollectionSnapshot) -> Result<Self> {
        let fields = snapshot
            .fields
            .into_iter()
            .map(|f| FieldDef::new(f.name, f.field_type))
            .collect();
        let mut collection = FeatureCollection::new(snapshot.name, fields);

        for feature in snapshot.features {
            let mut restored = Feature::new(geometry_from_snapshot(feature.geometry));
            restored.attributes.extend(feature.attributes);
            collection.push(restored)?;
        }

        Ok(collection)
    }
}

fn geometry_to_snapshot(geometry: &Geometry) -> GeometrySnapshot {
    match geometry {
        Geometry::Polygon(shape) => GeometrySnapshot::Polygon {
            polygons: shape
                .iter()
                .map(|p| PolygonSnapshot {
                    outer: ring_to_snapshot(&p.outer),
                    holes: p.holes.iter().map(|h| ring_to_snapshot(h)).collect(),
                })
                .collect(),
        },
        Geometry::Mesh(mesh) => GeometrySnapshot::Mesh {
            positions: mesh.positions.clone(),
            indices: mesh.indices.clone(),
        },
    }
}

fn geometry_from_snapshot(snapshot: GeometrySnapshot) -> Geometry {
    match snapshot {
        GeometrySnapshot::Polygon { polygons } => Geometry::Polygon(MultiPolygon2D::new(
            polygons
                .into_iter()
                .map(|p| Polygon2D {
                    outer: ring_from_snapshot(&p.outer),
                    holes: p.holes.iter().map(|h| ring_from_snapshot(h)).collect(),
                })
                .collect(),
        )),
        GeometrySnapshot::Mesh { positions, indices } => {
            Geometry::Mesh(Mesh { positions, indices })
        }
    }
}

fn ring_to_snapshot(ring: &[Point2<f64>]) -> Vec<[f64; 2]> {
    ring.iter().map(|p| [p.x, p.y]).collect()
}

/// Closing vertices (last == first) are dropped; rings are implicitly closed.
fn ring_from_snapshot(ring: &[[f64; 2]]) -> Vec<Point2<f64>> {
    let mut points: Vec<Point2<f64>> = ring.iter().map(|p| Point2::new(p[0], p[1])).collect();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points
}
