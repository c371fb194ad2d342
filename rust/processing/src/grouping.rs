// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fragment ordering, per-building counts and grouping.

use footprint_tiler_core::{FeatureId, Fragment};
use rustc_hash::FxHashMap;

/// Sort fragments by building id, then tile id.
///
/// The tile-id secondary key fixes the order in which tied fragments reach
/// the selector, so results do not depend on intersection output order.
/// The sort is stable.
pub fn sort_fragments(fragments: &mut [Fragment]) {
    fragments.sort_by(|a, b| {
        a.building_id
            .cmp(&b.building_id)
            .then_with(|| a.tile_id.cmp(&b.tile_id))
    });
}

/// How a building's fragments are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    /// Exactly one fragment: passes straight through.
    Single,
    /// More than one fragment: goes to the selector.
    Multi(usize),
}

/// Frequency count of fragments per building id.
#[derive(Debug, Clone, Default)]
pub struct FragmentCounts {
    counts: FxHashMap<FeatureId, usize>,
}

impl FragmentCounts {
    /// Count fragments per building id.
    pub fn from_fragments(fragments: &[Fragment]) -> Self {
        let mut counts: FxHashMap<FeatureId, usize> = FxHashMap::default();
        for fragment in fragments {
            *counts.entry(fragment.building_id.clone()).or_default() += 1;
        }
        Self { counts }
    }

    pub fn count(&self, building_id: &FeatureId) -> usize {
        self.counts.get(building_id).copied().unwrap_or(0)
    }

    /// Classify a building; `None` when it has no fragments.
    pub fn classify(&self, building_id: &FeatureId) -> Option<GroupKind> {
        match self.count(building_id) {
            0 => None,
            1 => Some(GroupKind::Single),
            n => Some(GroupKind::Multi(n)),
        }
    }

    /// Number of buildings with at least one fragment.
    pub fn building_count(&self) -> usize {
        self.counts.len()
    }

    /// Number of buildings spanning more than one tile.
    pub fn multi_count(&self) -> usize {
        self.counts.values().filter(|&&n| n > 1).count()
    }

    pub fn single_count(&self) -> usize {
        self.counts.values().filter(|&&n| n == 1).count()
    }
}

/// Iterator over runs of fragments sharing a building id.
///
/// Expects input sorted with [`sort_fragments`]; each building then forms
/// exactly one contiguous, non-empty run.
pub struct BuildingGroups<'a> {
    rest: &'a [Fragment],
}

impl<'a> Iterator for BuildingGroups<'a> {
    type Item = (&'a FeatureId, &'a [Fragment]);

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.rest.first()?;
        let len = self
            .rest
            .iter()
            .position(|f| f.building_id != first.building_id)
            .unwrap_or(self.rest.len());
        let (group, rest) = self.rest.split_at(len);
        self.rest = rest;
        Some((&first.building_id, group))
    }
}

/// Group sorted fragments by building id.
pub fn group_by_building(sorted: &[Fragment]) -> BuildingGroups<'_> {
    BuildingGroups { rest: sorted }
}
