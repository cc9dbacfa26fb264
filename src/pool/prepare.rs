// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Preparation of a live cluster for tests.
//!
//! Preparation resolves the subnet nodes live in, connects to the cluster, makes
//! sure the debug workload is running and obtains the cluster parameters through
//! the shared [`ParamCache`]. The result is only handed back when every step
//! succeeded, so a failed attempt never leaves a half-prepared record behind.

use crate::cache::ParamCache;
use crate::cloud::CloudClient;
use crate::connector::{ClusterConnector, ClusterParams};
use crate::constants::AKS_SUBNET_NAME;
use crate::context::PoolContext;
use crate::model::ClusterModel;
use crate::record::Prepared;
use anyhow::{bail, Context, Result};
use futures::StreamExt;
use tracing::{debug, info};

/// Id of the node subnet of the first virtual network in `node_resource_group`.
///
/// # Errors
///
/// Returns an error if a page of the listing fails, if no virtual network exists,
/// or if the first one has an empty id.
pub async fn get_cluster_subnet_id<C>(cloud: &C, node_resource_group: &str) -> Result<String>
where
    C: CloudClient + ?Sized,
{
    let mut pages = cloud.list_virtual_networks(node_resource_group);

    while let Some(page) = pages.next().await {
        let page = page.with_context(|| {
            format!("failed to advance page of virtual networks in {node_resource_group:?}")
        })?;

        if let Some(vnet) = page.into_iter().next() {
            if vnet.id.is_empty() {
                bail!("aks vnet id was empty");
            }
            return Ok(format!("{}/subnets/{AKS_SUBNET_NAME}", vnet.id));
        }
    }

    bail!("failed to find aks vnet in {node_resource_group:?}")
}

/// Parameters of `cluster_name`, extracted through `client` only on a cache miss.
///
/// # Errors
///
/// Returns an error if extraction runs and fails.
pub async fn get_cluster_parameters_with_cache<X>(
    connector: &X,
    cache: &ParamCache,
    cluster_name: &str,
    client: &X::Client,
) -> Result<ClusterParams>
where
    X: ClusterConnector,
{
    cache
        .get_or_extract(cluster_name, || connector.extract_parameters(client))
        .await
        .with_context(|| format!("unable to extract cluster parameters from {cluster_name:?}"))
}

/// Run the full preparation pipeline against a live cluster.
///
/// # Errors
///
/// Returns the first failing step's error with the cluster name attached.
pub async fn prepare_cluster_for_tests<C, X>(
    ctx: &PoolContext<C, X>,
    cluster: &ClusterModel,
) -> Result<Prepared<X::Client>>
where
    C: CloudClient + ?Sized,
    X: ClusterConnector,
{
    let name = cluster.name.as_str();
    debug!(cluster = name, "Preparing cluster for tests");

    let node_rg = cluster
        .node_resource_group
        .as_deref()
        .with_context(|| format!("cluster {name:?} has no node resource group"))?;

    let subnet_id = get_cluster_subnet_id(ctx.cloud.as_ref(), node_rg)
        .await
        .with_context(|| format!("unable to get subnet id of cluster {name:?}"))?;

    let client = ctx
        .connector
        .connect(ctx.resource_group(), name)
        .await
        .with_context(|| format!("unable to get management client for cluster {name:?}"))?;

    ctx.connector
        .ensure_debug_workload(&client)
        .await
        .with_context(|| format!("unable to ensure debug workload on cluster {name:?}"))?;

    let parameters =
        get_cluster_parameters_with_cache(ctx.connector.as_ref(), &ctx.param_cache, name, &client)
            .await?;

    info!(cluster = name, subnet_id = %subnet_id, "Cluster prepared for tests");
    Ok(Prepared {
        client,
        subnet_id,
        parameters,
    })
}

#[cfg(test)]
#[path = "prepare_tests.rs"]
mod prepare_tests;
