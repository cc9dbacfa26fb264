// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Creation of the clusters missing from the pool.
//!
//! [`create_missing_clusters`] works in two phases:
//!
//! 1. Sequentially queue one desired model per scenario that has no viable
//!    cluster in the pool *or* in the queue built so far, so scenarios with the
//!    same requirements share a single new cluster.
//! 2. Spawn one task per queued model that creates the cluster and prepares it.
//!    Every task runs to completion; each result lands in the slot matching the
//!    task's queue position. The tasks belong to the batch: if the caller drops
//!    it (for example on a deadline) the tasks still running are aborted. Successful records are appended to the pool and the
//!    failures, if any, are returned together as [`ClusterCreationErrors`].

use super::prepare::prepare_cluster_for_tests;
use super::viability::has_viable_cluster;
use super::ClusterPool;
use crate::cloud::CloudClient;
use crate::connector::ClusterConnector;
use crate::context::PoolContext;
use crate::errors::ClusterCreationErrors;
use crate::metrics::{record_cluster_operation, record_pool_size, OP_CREATE, STATUS_ERROR, STATUS_SUCCESS};
use crate::model::{generate_cluster_name, ClusterModel};
use crate::record::ClusterRecord;
use crate::scenario::Scenario;
use anyhow::{anyhow, Context, Result};
use rand::Rng;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

/// Create a cluster from `desired` and wait for the creation to finish.
///
/// # Errors
///
/// Returns an error if the creation cannot be started or does not complete.
pub async fn create_new_cluster<C>(
    cloud: &C,
    resource_group: &str,
    desired: &ClusterModel,
) -> Result<ClusterModel>
where
    C: CloudClient + ?Sized,
{
    let name = desired.name.as_str();
    info!(cluster = name, location = %desired.location, "Creating cluster");

    let result: Result<ClusterModel> = async {
        let mut poller = cloud
            .begin_create_cluster(resource_group, name, desired)
            .await
            .with_context(|| format!("failed to begin creation of cluster {name:?}"))?;
        poller
            .poll_until_done()
            .await
            .with_context(|| format!("failed to wait for creation of cluster {name:?}"))
    }
    .await;

    let status = if result.is_ok() {
        STATUS_SUCCESS
    } else {
        STATUS_ERROR
    };
    record_cluster_operation(OP_CREATE, status);
    result
}

/// Desired models for the scenarios the pool cannot serve, at most one per
/// distinct requirement.
fn queue_missing_clusters<K, R>(
    scenarios: &[Scenario],
    pool: &ClusterPool<K>,
    rng: &mut R,
    name_prefix: &str,
    location: &str,
) -> Vec<ClusterModel>
where
    R: Rng + ?Sized,
{
    let mut queued: Vec<ClusterModel> = Vec::new();

    for scenario in scenarios {
        if has_viable_cluster(scenario, pool.models().chain(queued.iter())) {
            continue;
        }

        let name = generate_cluster_name(rng, name_prefix);
        debug!(scenario = %scenario.name, cluster = %name, "Queueing cluster creation");
        queued.push(scenario.desired_cluster_model(&name, location));
    }

    queued
}

async fn create_and_prepare<C, X>(
    ctx: PoolContext<C, X>,
    desired: ClusterModel,
) -> Result<ClusterRecord<X::Client>>
where
    C: CloudClient + ?Sized,
    X: ClusterConnector,
{
    let cluster = create_new_cluster(ctx.cloud.as_ref(), ctx.resource_group(), &desired)
        .await
        .context("unable to create new cluster")?;
    let prepared = prepare_cluster_for_tests(&ctx, &cluster).await?;
    Ok(ClusterRecord::prepared(cluster, prepared))
}

/// Create and prepare, in parallel, one cluster per unmet scenario requirement.
///
/// # Errors
///
/// Returns [`ClusterCreationErrors`] naming only the tasks that failed, once
/// every task has finished. Records from the successful tasks are in `pool`.
pub async fn create_missing_clusters<C, X, R>(
    ctx: &PoolContext<C, X>,
    rng: &mut R,
    scenarios: &[Scenario],
    pool: &mut ClusterPool<X::Client>,
) -> Result<()>
where
    C: CloudClient + ?Sized + 'static,
    X: ClusterConnector + 'static,
    R: Rng + ?Sized,
{
    let queued = queue_missing_clusters(
        scenarios,
        pool,
        rng,
        &ctx.config.cluster_name_prefix,
        ctx.location(),
    );

    if queued.is_empty() {
        debug!("Every scenario already has a viable cluster");
        return Ok(());
    }

    info!(count = queued.len(), "Creating missing clusters in parallel");

    let names: Vec<String> = queued.iter().map(|m| m.name.clone()).collect();

    // Dropping the set aborts every task still running, so a caller deadline
    // on this future also stops the creations it started.
    let mut tasks = JoinSet::new();
    for (index, desired) in queued.into_iter().enumerate() {
        let ctx = ctx.clone();
        tasks.spawn(async move { (index, create_and_prepare(ctx, desired).await) });
    }

    // One slot per task, in queue order; the loop drains every task.
    let mut slots: Vec<Option<Result<ClusterRecord<X::Client>>>> =
        std::iter::repeat_with(|| None).take(names.len()).collect();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, result)) => slots[index] = Some(result),
            Err(e) => error!(error = %e, "Cluster creation task did not finish"),
        }
    }

    let mut errors = Vec::new();
    for (name, slot) in names.iter().zip(slots) {
        let slot = slot
            .unwrap_or_else(|| Err(anyhow!("cluster creation task for {name:?} panicked")));
        match slot {
            Ok(record) => pool.push(record),
            Err(e) => {
                error!(cluster = %name, error = %format!("{e:#}"), "Cluster creation task failed");
                errors.push(e);
            }
        }
    }

    record_pool_size(pool.len());

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ClusterCreationErrors(errors).into())
    }
}

#[cfg(test)]
#[path = "provision_tests.rs"]
mod provision_tests;
