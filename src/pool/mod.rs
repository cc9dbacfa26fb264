// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Pool reconciliation and cluster selection.
//!
//! The pool is an owned [`ClusterPool`] threaded explicitly through the call chain:
//! - [`inventory::list_clusters`] builds it from the test resource group
//! - [`provision::create_missing_clusters`] appends clusters created for unmet scenarios
//! - [`select::choose_cluster`] validates, repairs and prepares one member per scenario
//!
//! [`bootstrap_pool`] runs the first two steps after making sure the resource group exists.

pub mod health;
pub mod inventory;
pub mod prepare;
pub mod provision;
pub mod resource_group;
pub mod select;
pub mod viability;

use crate::cloud::CloudClient;
use crate::connector::ClusterConnector;
use crate::context::PoolContext;
use crate::model::ClusterModel;
use crate::record::ClusterRecord;
use crate::scenario::Scenario;
use anyhow::Result;
use rand::Rng;
use tracing::info;

/// Every cluster record known to the current run, in pool order.
#[derive(Debug)]
pub struct ClusterPool<K> {
    records: Vec<ClusterRecord<K>>,
}

impl<K> Default for ClusterPool<K> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<K> ClusterPool<K> {
    /// An empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_records(records: Vec<ClusterRecord<K>>) -> Self {
        Self { records }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClusterRecord<K>> {
        self.records.iter()
    }

    /// Control-plane models of every member, in pool order.
    pub fn models(&self) -> impl Iterator<Item = &ClusterModel> {
        self.records.iter().map(ClusterRecord::cluster)
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ClusterRecord<K>> {
        self.records.get(index)
    }

    /// Member named `name`, if any.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&ClusterRecord<K>> {
        self.records.iter().find(|r| r.name() == name)
    }

    /// Append a member.
    pub fn push(&mut self, record: ClusterRecord<K>) {
        self.records.push(record);
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut ClusterRecord<K>> {
        self.records.get_mut(index)
    }

    /// Swap the member at `index` for `record`, handing back the old one.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub(crate) fn replace(&mut self, index: usize, record: ClusterRecord<K>) -> ClusterRecord<K> {
        std::mem::replace(&mut self.records[index], record)
    }
}

/// Make sure the resource group exists, inventory it and create whatever clusters
/// the scenarios still lack.
///
/// # Errors
///
/// Returns an error if the resource group cannot be ensured, the inventory fails,
/// or any cluster creation task fails (as [`crate::errors::ClusterCreationErrors`]).
pub async fn bootstrap_pool<C, X, R>(
    ctx: &PoolContext<C, X>,
    rng: &mut R,
    scenarios: &[Scenario],
) -> Result<ClusterPool<X::Client>>
where
    C: CloudClient + ?Sized + 'static,
    X: ClusterConnector + 'static,
    R: Rng + ?Sized,
{
    resource_group::ensure_resource_group(ctx.cloud.as_ref(), ctx.resource_group(), ctx.location())
        .await?;

    let mut pool = inventory::list_clusters(ctx.cloud.as_ref(), ctx.resource_group()).await?;
    info!(
        resource_group = ctx.resource_group(),
        existing = pool.len(),
        scenarios = scenarios.len(),
        "Inventoried cluster pool"
    );

    provision::create_missing_clusters(ctx, rng, scenarios, &mut pool).await?;
    Ok(pool)
}
