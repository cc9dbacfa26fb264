// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Health validation and repair of a single candidate cluster.
//!
//! A candidate is re-fetched from the control plane and judged on the live model:
//!
//! - Gone (not found): it needs recreation and there is nothing to delete.
//! - Unhealthy: it is deleted, waiting for the deletion to finish, and needs recreation.
//!   A cluster is unhealthy when its node resource group reference is missing, that
//!   group no longer exists, its provisioning state is missing or `Failed`, or an
//!   extra [`HealthCheck`] rejects it.
//! - Otherwise it is healthy and usable as-is.
//!
//! Any other fetch or delete failure is returned to the caller, which treats the
//! candidate as unusable for this attempt only.

use super::resource_group::is_existing_resource_group;
use crate::cloud::CloudClient;
use crate::errors::is_not_found_error;
use crate::metrics::{record_cluster_operation, OP_DELETE, STATUS_ERROR, STATUS_SUCCESS};
use crate::model::{ClusterModel, ProvisioningState};
use crate::retry::retry_cloud_call;
use anyhow::{Context, Result};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// An extra, named condition a live cluster must meet to be considered healthy.
#[derive(Clone)]
pub struct HealthCheck {
    /// Name reported when the check fails
    pub name: String,
    check: Arc<dyn Fn(&ClusterModel) -> bool + Send + Sync>,
}

impl HealthCheck {
    pub fn new<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&ClusterModel) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            check: Arc::new(check),
        }
    }

    /// Every agent pool reports `Succeeded`.
    #[must_use]
    pub fn agent_pools_succeeded() -> Self {
        Self::new("agent-pools-succeeded", |cluster| {
            cluster
                .agent_pool_profiles
                .iter()
                .all(|pool| pool.provisioning_state == Some(ProvisioningState::Succeeded))
        })
    }

    #[must_use]
    pub fn passes(&self, cluster: &ClusterModel) -> bool {
        (self.check)(cluster)
    }
}

impl fmt::Debug for HealthCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthCheck")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Verdict of [`validate_existing_cluster_state`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClusterHealth {
    /// Usable as-is
    Healthy,
    /// Gone, or deleted because it was unhealthy
    NeedsRecreation,
}

impl ClusterHealth {
    #[must_use]
    pub fn needs_recreation(self) -> bool {
        self == Self::NeedsRecreation
    }
}

/// Decide whether `cluster` is usable, deleting it if it exists but is unhealthy.
///
/// # Errors
///
/// Returns an error if fetching the cluster fails for a reason other than "not
/// found", if the node resource group check fails, or if the deletion fails.
pub async fn validate_existing_cluster_state<C>(
    cloud: &C,
    resource_group: &str,
    cluster: &ClusterModel,
    checks: &[HealthCheck],
) -> Result<ClusterHealth>
where
    C: CloudClient + ?Sized,
{
    let name = cluster.name.as_str();

    let live = match retry_cloud_call(
        move || cloud.get_cluster(resource_group, name),
        &format!("get cluster {name}"),
    )
    .await
    {
        Ok(live) => live,
        Err(e) if is_not_found_error(&e) => {
            info!(cluster = name, "Received not found when fetching test cluster");
            return Ok(ClusterHealth::NeedsRecreation);
        }
        Err(e) => return Err(e.context(format!("failed to get cluster {name:?}"))),
    };

    let Some(reason) = unhealthy_reason(cloud, &live, checks).await? else {
        debug!(cluster = name, "Cluster is healthy");
        return Ok(ClusterHealth::Healthy);
    };

    info!(cluster = name, reason = %reason, "Deleting test cluster in bad state");
    delete_existing_cluster(cloud, resource_group, name)
        .await
        .context("failed to delete cluster in bad state")?;
    Ok(ClusterHealth::NeedsRecreation)
}

async fn unhealthy_reason<C>(
    cloud: &C,
    live: &ClusterModel,
    checks: &[HealthCheck],
) -> Result<Option<String>>
where
    C: CloudClient + ?Sized,
{
    let Some(node_rg) = live.node_resource_group.as_deref() else {
        return Ok(Some("missing node resource group reference".to_string()));
    };

    if !is_existing_resource_group(cloud, node_rg).await? {
        return Ok(Some(format!("node resource group {node_rg:?} no longer exists")));
    }

    match live.provisioning_state {
        None => return Ok(Some("missing provisioning state".to_string())),
        Some(ProvisioningState::Failed) => {
            return Ok(Some("provisioning state is Failed".to_string()));
        }
        Some(_) => {}
    }

    Ok(checks
        .iter()
        .find(|check| !check.passes(live))
        .map(|check| format!("health check {:?} failed", check.name)))
}

/// Delete a cluster and wait for the deletion to finish.
///
/// A cluster that is already gone counts as deleted.
///
/// # Errors
///
/// Returns an error if the deletion cannot be started or does not complete.
pub async fn delete_existing_cluster<C>(cloud: &C, resource_group: &str, name: &str) -> Result<()>
where
    C: CloudClient + ?Sized,
{
    let result: Result<()> = async {
        let mut poller = cloud
            .begin_delete_cluster(resource_group, name)
            .await
            .with_context(|| format!("failed to start cluster {name:?} deletion"))?;
        poller
            .poll_until_done()
            .await
            .with_context(|| format!("failed to wait for cluster {name:?} deletion"))
    }
    .await;

    match result {
        Ok(()) => {
            record_cluster_operation(OP_DELETE, STATUS_SUCCESS);
            Ok(())
        }
        Err(e) if is_not_found_error(&e) => {
            debug!(cluster = name, "Cluster already gone");
            record_cluster_operation(OP_DELETE, STATUS_SUCCESS);
            Ok(())
        }
        Err(e) => {
            record_cluster_operation(OP_DELETE, STATUS_ERROR);
            Err(e)
        }
    }
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod health_tests;
