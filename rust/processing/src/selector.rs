// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Best-tile selection for buildings that span several tiles.
//!
//! The metric for a fragment is the building area it leaves uncovered,
//! `building_area - fragment_area`, and the fragment with the LARGEST metric
//! wins. Ties go to the later fragment in sorted order (highest tile id).
//!
//! Note that this picks the tile holding the smallest share of the building,
//! not the largest. Existing assignments were produced with this rule; see
//! DESIGN.md before changing it.

use footprint_tiler_core::{Assignment, AssignmentSet, FeatureId, Fragment};
use rayon::prelude::*;

use crate::grouping::{group_by_building, FragmentCounts, GroupKind};

/// Pick the winning fragment of one building's run.
///
/// Returns `None` only for an empty slice.
pub fn select_best(group: &[Fragment]) -> Option<&Fragment> {
    group.iter().reduce(|best, candidate| {
        if candidate.uncovered_area() >= best.uncovered_area() {
            candidate
        } else {
            best
        }
    })
}

/// Resolve every building in sorted fragments to exactly one assignment.
///
/// Single-fragment buildings pass through without evaluating the metric.
/// Groups are reduced in parallel; since groups are independent and each
/// reduction is a pure function of its slice, the result does not depend on
/// scheduling.
pub fn select_assignments(sorted: &[Fragment], counts: &FragmentCounts) -> AssignmentSet {
    let groups: Vec<(&FeatureId, &[Fragment])> = group_by_building(sorted).collect();

    groups
        .into_par_iter()
        .filter_map(|(building_id, group)| {
            debug_assert_eq!(
                counts.count(building_id),
                group.len(),
                "fragments must be sorted before selection"
            );
            let winner = match counts.classify(building_id)? {
                GroupKind::Single => group.first()?,
                GroupKind::Multi(n) => {
                    let best = select_best(group)?;
                    tracing::trace!(
                        building = %building_id,
                        candidates = n,
                        tile = %best.tile_id,
                        metric = best.uncovered_area(),
                        "Selected tile"
                    );
                    best
                }
            };
            Some((building_id.clone(), Assignment::from(winner)))
        })
        .collect::<Vec<_>>()
        .into_iter()
        .collect()
}
