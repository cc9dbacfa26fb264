// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Choosing a ready-to-use cluster for one scenario.
//!
//! Viable candidates are tried in pool order. Each is validated (and deleted if
//! unhealthy), recreated under the same name and desired model when needed, and
//! prepared if it is not already. The first candidate to come through all of that
//! is returned; a failing candidate is logged and skipped.
//!
//! A recreated cluster always gets a brand-new record in the candidate's slot, so
//! nothing prepared for the stale cluster survives into the replacement.

use super::health::validate_existing_cluster_state;
use super::prepare::prepare_cluster_for_tests;
use super::provision::create_new_cluster;
use super::ClusterPool;
use crate::cloud::CloudClient;
use crate::connector::ClusterConnector;
use crate::context::PoolContext;
use crate::errors::SelectionError;
use crate::metrics::{record_cluster_operation, record_selection, OP_RECREATE, STATUS_ERROR, STATUS_SUCCESS};
use crate::record::ClusterRecord;
use crate::scenario::Scenario;
use anyhow::{Context, Result};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Make the candidate at `index` healthy and prepared.
async fn make_ready<C, X>(
    ctx: &PoolContext<C, X>,
    pool: &mut ClusterPool<X::Client>,
    index: usize,
) -> Result<()>
where
    C: CloudClient + ?Sized,
    X: ClusterConnector,
{
    let candidate = pool
        .get(index)
        .map(|record| record.cluster().clone())
        .context("candidate index out of range")?;
    let name = candidate.name.as_str();

    let health = validate_existing_cluster_state(
        ctx.cloud.as_ref(),
        ctx.resource_group(),
        &candidate,
        &ctx.health_checks,
    )
    .await
    .with_context(|| format!("unable to validate state of viable cluster {name:?}"))?;

    if health.needs_recreation() {
        info!(cluster = name, "Viable cluster is in a bad state, attempting to recreate");
        let recreated =
            match create_new_cluster(ctx.cloud.as_ref(), ctx.resource_group(), &candidate.to_desired())
                .await
            {
                Ok(recreated) => {
                    record_cluster_operation(OP_RECREATE, STATUS_SUCCESS);
                    recreated
                }
                Err(e) => {
                    record_cluster_operation(OP_RECREATE, STATUS_ERROR);
                    return Err(e.context(format!("unable to recreate viable cluster {name:?}")));
                }
            };
        pool.replace(index, ClusterRecord::new(recreated));
    }

    let Some(record) = pool.get(index) else {
        return Ok(());
    };
    if record.is_prepared() {
        debug!(cluster = name, "Cluster already prepared");
        return Ok(());
    }

    let prepared = prepare_cluster_for_tests(ctx, record.cluster())
        .await
        .context("unable to prepare viable cluster for testing")?;
    if let Some(record) = pool.get_mut(index) {
        record.set_prepared(prepared);
    }
    Ok(())
}

/// Return a prepared pool member for `scenario`, repairing candidates on the way.
///
/// # Errors
///
/// - [`SelectionError::NoViableCluster`] if no viable candidate could be made ready
/// - [`SelectionError::MissingNodeResourceGroup`] if the chosen cluster has no node
///   resource group
///
/// Both are fatal to the scenario.
pub async fn choose_cluster<'p, C, X>(
    ctx: &PoolContext<C, X>,
    scenario: &Scenario,
    pool: &'p mut ClusterPool<X::Client>,
) -> Result<&'p ClusterRecord<X::Client>, SelectionError>
where
    C: CloudClient + ?Sized,
    X: ClusterConnector,
{
    let started = Instant::now();
    let candidates = pool.viable_indices(scenario);
    debug!(
        scenario = %scenario.name,
        candidates = candidates.len(),
        "Choosing cluster for scenario"
    );

    let mut chosen = None;
    for index in candidates {
        match make_ready(ctx, pool, index).await {
            Ok(()) => {
                chosen = Some(index);
                break;
            }
            Err(e) => {
                warn!(scenario = %scenario.name, error = %format!("{e:#}"), "Skipping viable cluster");
            }
        }
    }

    let pool: &'p ClusterPool<X::Client> = pool;
    let Some(record) = chosen.and_then(|index| pool.get(index)) else {
        error!(scenario = %scenario.name, "Unable to successfully choose a cluster");
        record_selection(false, started.elapsed());
        return Err(SelectionError::NoViableCluster {
            scenario: scenario.name.clone(),
        });
    };

    if record.cluster().node_resource_group.is_none() {
        record_selection(false, started.elapsed());
        return Err(SelectionError::MissingNodeResourceGroup {
            cluster: record.name().to_string(),
        });
    }

    info!(scenario = %scenario.name, cluster = record.name(), "Chose cluster for scenario");
    record_selection(true, started.elapsed());
    Ok(record)
}

#[cfg(test)]
#[path = "select_tests.rs"]
mod select_tests;
