// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Records exchanged between the tiling stages.

use std::collections::BTreeMap;

use footprint_tiler_geometry::MultiPolygon2D;
use serde::Serialize;

use crate::value::FeatureId;

/// A building reduced to its planar footprint.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingFootprint {
    pub id: FeatureId,
    pub shape: MultiPolygon2D,
    /// Whole-footprint area
    pub area: f64,
}

/// A tile of the partition with its file label.
#[derive(Debug, Clone, PartialEq)]
pub struct TilePolygon {
    pub id: FeatureId,
    pub shape: MultiPolygon2D,
    pub file_name: String,
}

/// Overlap of one building with one tile.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub building_id: FeatureId,
    pub tile_id: FeatureId,
    pub file_name: String,
    /// Area of the whole building footprint
    pub building_area: f64,
    /// Area of the overlap piece
    pub area: f64,
}

impl Fragment {
    /// Building area not covered by this fragment's tile.
    #[inline]
    pub fn uncovered_area(&self) -> f64 {
        self.building_area - self.area
    }
}

/// Winning tile for one building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub tile_id: FeatureId,
    pub file_name: String,
}

impl From<&Fragment> for Assignment {
    fn from(fragment: &Fragment) -> Self {
        Self {
            tile_id: fragment.tile_id.clone(),
            file_name: fragment.file_name.clone(),
        }
    }
}

/// Building id → assignment, at most one entry per building.
///
/// Kept ordered so reports and serialized output are reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssignmentSet {
    entries: BTreeMap<FeatureId, Assignment>,
}

impl AssignmentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the winner for a building. Returns the previous assignment if
    /// one was already present; callers treat that as a logic error.
    pub fn insert(&mut self, building_id: FeatureId, assignment: Assignment) -> Option<Assignment> {
        self.entries.insert(building_id, assignment)
    }

    pub fn get(&self, building_id: &FeatureId) -> Option<&Assignment> {
        self.entries.get(building_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FeatureId, &Assignment)> {
        self.entries.iter()
    }
}

impl FromIterator<(FeatureId, Assignment)> for AssignmentSet {
    fn from_iter<I: IntoIterator<Item = (FeatureId, Assignment)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncovered_area_is_building_minus_fragment() {
        let fragment = Fragment {
            building_id: FeatureId::from(1),
            tile_id: FeatureId::from(7),
            file_name: "tile_7.las".to_string(),
            building_area: 100.0,
            area: 80.0,
        };
        assert_eq!(fragment.uncovered_area(), 20.0);

        let assignment = Assignment::from(&fragment);
        assert_eq!(assignment.tile_id, FeatureId::from(7));
        assert_eq!(assignment.file_name, "tile_7.las");
    }

    #[test]
    fn assignment_set_iterates_in_id_order() {
        let set: AssignmentSet = [3, 1, 2]
            .into_iter()
            .map(|id| {
                (
                    FeatureId::from(id),
                    Assignment {
                        tile_id: FeatureId::from(id * 10),
                        file_name: String::new(),
                    },
                )
            })
            .collect();
        let ids: Vec<_> = set.iter().map(|(id, _)| id.clone()).collect();
        assert_eq!(
            ids,
            vec![FeatureId::from(1), FeatureId::from(2), FeatureId::from(3)]
        );
    }
}
