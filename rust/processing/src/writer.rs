// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Merge of the assignment set back into the building collection.

use footprint_tiler_core::{AssignmentSet, FeatureCollection, FieldType, FieldValue};

use crate::error::Result;

/// Output field names on the building collection.
#[derive(Debug, Clone, Copy)]
pub struct OutputFields<'a> {
    pub building_id: &'a str,
    pub tile_id: &'a str,
    pub file_name: &'a str,
}

/// Write winning tile ids and file names onto the buildings.
///
/// All values are resolved before the collection is touched: a building
/// without a usable id or a tile id that is not numeric fails the call with
/// the collection unchanged. Existing output fields are replaced; buildings
/// without an assignment end up with null in both. Returns the number of
/// buildings that received an assignment.
pub fn write_assignments(
    buildings: &mut FeatureCollection,
    assignments: &AssignmentSet,
    fields: OutputFields<'_>,
) -> Result<usize> {
    let ids = buildings.unique_ids(fields.building_id)?;

    let mut rows: Vec<Option<(i64, String)>> = Vec::with_capacity(ids.len());
    for id in &ids {
        let row = match assignments.get(id) {
            Some(assignment) => {
                let tile_id = assignment.tile_id.as_i64().ok_or_else(|| {
                    footprint_tiler_core::Error::InvalidValue {
                        field: fields.tile_id.to_string(),
                        field_type: FieldType::Integer,
                        value: assignment.tile_id.to_string(),
                    }
                })?;
                Some((tile_id, assignment.file_name.clone()))
            }
            None => None,
        };
        rows.push(row);
    }

    buildings.replace_field(fields.tile_id, FieldType::Integer);
    buildings.replace_field(fields.file_name, FieldType::Text);

    let mut written = 0;
    for (index, row) in rows.into_iter().enumerate() {
        if let Some((tile_id, file_name)) = row {
            buildings.set_value(index, fields.tile_id, FieldValue::Integer(tile_id))?;
            buildings.set_value(index, fields.file_name, FieldValue::Text(file_name))?;
            written += 1;
        }
    }

    tracing::debug!(
        collection = %buildings.name,
        assigned = written,
        unassigned = ids.len() - written,
        "Wrote tile assignments"
    );
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use footprint_tiler_core::{Assignment, Feature, FeatureId, FieldDef, Geometry};
    use footprint_tiler_geometry::Polygon2D;

    const FIELDS: OutputFields<'static> = OutputFields {
        building_id: "bldg_fid",
        tile_id: "tile_id",
        file_name: "file_name",
    };

    fn buildings() -> FeatureCollection {
        let mut fc = FeatureCollection::new(
            "buildings",
            vec![
                FieldDef::new("bldg_fid", FieldType::Integer),
                FieldDef::new("tile_id", FieldType::Text),
            ],
        );
        for id in 1..=3 {
            fc.push(
                Feature::new(Geometry::Polygon(
                    Polygon2D::rectangle(0.0, 0.0, 1.0, 1.0).into(),
                ))
                .with("bldg_fid", FieldValue::Integer(id))
                .with("tile_id", FieldValue::Text("stale".into())),
            )
            .unwrap();
        }
        fc
    }

    fn assignment(tile: FeatureId, file_name: &str) -> Assignment {
        Assignment {
            tile_id: tile,
            file_name: file_name.to_string(),
        }
    }

    #[test]
    fn writes_assigned_and_nulls_the_rest() {
        let mut fc = buildings();
        let mut set = AssignmentSet::new();
        set.insert(FeatureId::from(1), assignment(FeatureId::from(10), "a.las"));
        set.insert(FeatureId::from(3), assignment(FeatureId::from("30"), "c.las"));

        let written = write_assignments(&mut fc, &set, FIELDS).unwrap();
        assert_eq!(written, 2);

        // pre-existing text field replaced by an integer one
        assert_eq!(fc.field("tile_id").unwrap().field_type, FieldType::Integer);
        assert_eq!(fc.field("file_name").unwrap().field_type, FieldType::Text);

        let f = fc.features();
        assert_eq!(f[0].get("tile_id"), &FieldValue::Integer(10));
        assert_eq!(f[0].get("file_name"), &FieldValue::Text("a.las".into()));
        assert!(f[1].get("tile_id").is_null());
        assert!(f[1].get("file_name").is_null());
        assert_eq!(f[2].get("tile_id"), &FieldValue::Integer(30));
    }

    #[test]
    fn non_numeric_tile_id_leaves_collection_untouched() {
        let mut fc = buildings();
        let before = fc.clone();
        let mut set = AssignmentSet::new();
        set.insert(FeatureId::from(2), assignment(FeatureId::from("north-7"), "n.las"));

        let err = write_assignments(&mut fc, &set, FIELDS).unwrap_err();
        assert!(matches!(
            err,
            Error::Data(footprint_tiler_core::Error::InvalidValue { .. })
        ));
        assert_eq!(fc, before);
    }

    #[test]
    fn missing_building_id_field_fails() {
        let mut fc = buildings();
        let fields = OutputFields {
            building_id: "OBJECTID",
            ..FIELDS
        };
        let err = write_assignments(&mut fc, &AssignmentSet::new(), fields).unwrap_err();
        assert!(err.to_string().contains("OBJECTID"));
    }
}
