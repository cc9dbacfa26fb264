// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Cluster preparation collaborators.
//!
//! A [`ClusterConnector`] knows how to reach inside a live cluster: obtain a
//! management client, make sure the debug workload is running and read the
//! scenario-relevant parameters. [`crate::kube_connector::KubeConnector`] is the
//! production implementation.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Derived, scenario-relevant facts about a cluster (OS build, kernel version, ...).
pub type ClusterParams = BTreeMap<String, String>;

/// Reaches inside a live cluster on behalf of the preparation pipeline.
#[async_trait]
pub trait ClusterConnector: Send + Sync {
    /// Management client scoped to one cluster.
    type Client: Send + Sync + 'static;

    /// Obtain a management client for `cluster_name` in `resource_group`.
    async fn connect(&self, resource_group: &str, cluster_name: &str) -> Result<Self::Client>;

    /// Make sure the debug workload is present. A no-op when it already is.
    async fn ensure_debug_workload(&self, client: &Self::Client) -> Result<()>;

    /// Extract parameters from the live cluster. May poll internally.
    async fn extract_parameters(&self, client: &Self::Client) -> Result<ClusterParams>;
}
