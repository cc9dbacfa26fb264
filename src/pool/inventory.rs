// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Inventory of the clusters already present in the test resource group.

use super::ClusterPool;
use crate::cloud::CloudClient;
use crate::constants::MANAGED_CLUSTER_RESOURCE_TYPE;
use crate::errors::is_not_found_error;
use crate::metrics::record_pool_size;
use crate::record::ClusterRecord;
use crate::retry::retry_cloud_call;
use anyhow::{Context, Result};
use futures::StreamExt;
use tracing::{debug, info};

/// Build an unprepared pool from every managed cluster in `resource_group`.
///
/// Clusters that vanish between listing and fetching, and clusters being deleted,
/// are skipped. The resource type is matched case-insensitively.
///
/// # Errors
///
/// Returns an error if a page of the listing or any cluster fetch fails for a
/// reason other than "not found".
pub async fn list_clusters<C, K>(cloud: &C, resource_group: &str) -> Result<ClusterPool<K>>
where
    C: CloudClient + ?Sized,
{
    let mut pool = ClusterPool::new();
    let mut pages = cloud.list_resources(resource_group);

    while let Some(page) = pages.next().await {
        let page = page.with_context(|| {
            format!("failed to advance page of resources in {resource_group:?}")
        })?;

        for resource in page {
            if !resource
                .resource_type
                .eq_ignore_ascii_case(MANAGED_CLUSTER_RESOURCE_TYPE)
            {
                continue;
            }

            let name = resource.name.as_str();
            let cluster = match retry_cloud_call(
                move || cloud.get_cluster(resource_group, name),
                &format!("get cluster {name}"),
            )
            .await
            {
                Ok(cluster) => cluster,
                Err(e) if is_not_found_error(&e) => {
                    info!(cluster = name, "Cluster returned 404 Not Found, continuing inventory");
                    continue;
                }
                Err(e) => {
                    return Err(e.context(format!("failed to get cluster {name:?}")));
                }
            };

            if cluster.is_deleting() {
                debug!(cluster = name, "Skipping cluster that is being deleted");
                continue;
            }

            info!(cluster = name, "Found existing e2e cluster");
            pool.push(ClusterRecord::new(cluster));
        }
    }

    record_pool_size(pool.len());
    Ok(pool)
}

#[cfg(test)]
#[path = "inventory_tests.rs"]
mod inventory_tests;
