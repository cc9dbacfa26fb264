// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Matching clusters against a scenario's selector.

use super::ClusterPool;
use crate::model::ClusterModel;
use crate::record::ClusterRecord;
use crate::scenario::Scenario;

/// Records whose cluster satisfies `scenario`, in input order.
pub fn viable_clusters<'a, K: 'a>(
    scenario: &Scenario,
    records: impl IntoIterator<Item = &'a ClusterRecord<K>>,
) -> Vec<&'a ClusterRecord<K>> {
    records
        .into_iter()
        .filter(|record| scenario.is_viable(record.cluster()))
        .collect()
}

/// Whether any of `clusters` satisfies `scenario`. Stops at the first match.
pub fn has_viable_cluster<'a>(
    scenario: &Scenario,
    clusters: impl IntoIterator<Item = &'a ClusterModel>,
) -> bool {
    clusters.into_iter().any(|cluster| scenario.is_viable(cluster))
}

impl<K> ClusterPool<K> {
    /// Positions of the members viable for `scenario`, in pool order.
    #[must_use]
    pub fn viable_indices(&self, scenario: &Scenario) -> Vec<usize> {
        self.iter()
            .enumerate()
            .filter(|(_, record)| scenario.is_viable(record.cluster()))
            .map(|(index, _)| index)
            .collect()
    }
}
