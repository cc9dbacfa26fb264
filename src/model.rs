// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Control-plane representation of managed clusters.
//!
//! These types mirror the subset of the managed-cluster resource the pool inspects:
//! identity, location, provisioning state, network profile, agent pools and the
//! node resource group. Field names serialize in camelCase so a control-plane
//! client can move them over the wire unchanged.
//!
//! # Example
//!
//! ```rust
//! use clusterpool::model::{base_cluster_model, NetworkPlugin};
//!
//! let model = base_cluster_model("abe2e-qwert", "eastus");
//! assert_eq!(model.network_plugin(), Some(NetworkPlugin::Kubenet));
//! assert_eq!(model.agent_pool_profiles.len(), 1);
//! ```

use crate::constants::{
    CLUSTER_NAME_SUFFIX_LEN, DEFAULT_AGENT_POOL_COUNT, DEFAULT_AGENT_POOL_MAX_PODS,
    DEFAULT_AGENT_POOL_NAME, DEFAULT_AGENT_POOL_OS_DISK_SIZE_GB, DEFAULT_AGENT_POOL_VM_SIZE,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Provisioning state reported by the control plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProvisioningState {
    Succeeded,
    Creating,
    Updating,
    Deleting,
    Failed,
    Canceled,
    /// Any state this crate does not know about
    #[serde(other)]
    Unknown,
}

/// Network plugin of a cluster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkPlugin {
    Kubenet,
    Azure,
    None,
}

/// Operating system of an agent pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OsType {
    #[default]
    Linux,
    Windows,
}

/// Backing compute type of an agent pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentPoolType {
    #[default]
    VirtualMachineScaleSets,
    AvailabilitySet,
}

/// Whether an agent pool hosts system pods.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentPoolMode {
    #[default]
    System,
    User,
}

/// Managed identity kind of a cluster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceIdentityType {
    SystemAssigned,
    UserAssigned,
    None,
}

/// Managed identity of a cluster.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterIdentity {
    #[serde(rename = "type")]
    pub identity_type: ResourceIdentityType,
}

/// Cluster networking configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_plugin: Option<NetworkPlugin>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_plugin_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_policy: Option<String>,
}

/// One agent pool of a cluster.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPoolProfile {
    pub name: String,
    pub count: i32,
    pub vm_size: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pods: Option<i32>,
    #[serde(default)]
    pub os_type: OsType,
    #[serde(default, rename = "osSKU", skip_serializing_if = "Option::is_none")]
    pub os_sku: Option<String>,
    #[serde(default, rename = "type")]
    pub pool_type: AgentPoolType,
    #[serde(default)]
    pub mode: AgentPoolMode,
    #[serde(default, rename = "osDiskSizeGB", skip_serializing_if = "Option::is_none")]
    pub os_disk_size_gb: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
}

/// Control-plane model of a managed cluster.
///
/// The identity key is `name` within the test resource group. Fields the control
/// plane owns (`id`, provisioning states, `node_resource_group`) are only set on
/// models read back from the control plane.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_resource_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_profile: Option<NetworkProfile>,
    #[serde(default)]
    pub agent_pool_profiles: Vec<AgentPoolProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<ClusterIdentity>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

impl ClusterModel {
    /// Network plugin, if a network profile is set.
    #[must_use]
    pub fn network_plugin(&self) -> Option<NetworkPlugin> {
        self.network_profile.as_ref().and_then(|p| p.network_plugin)
    }

    /// Whether the control plane reports the cluster as being torn down.
    #[must_use]
    pub fn is_deleting(&self) -> bool {
        self.provisioning_state == Some(ProvisioningState::Deleting)
    }

    /// Turn a model read back from the control plane into a creation request.
    ///
    /// Strips the fields the control plane owns so a stale live model can be
    /// resubmitted when a cluster has to be recreated under the same name.
    #[must_use]
    pub fn to_desired(&self) -> ClusterModel {
        let mut desired = self.clone();
        desired.id = None;
        desired.provisioning_state = None;
        desired.node_resource_group = None;
        for pool in &mut desired.agent_pool_profiles {
            pool.provisioning_state = None;
        }
        desired
    }
}

/// A resource listed from a resource group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericResource {
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: String,
}

/// A virtual network listed from a resource group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualNetwork {
    pub id: String,
}

/// Desired model every new cluster starts from before a scenario mutates it.
#[must_use]
pub fn base_cluster_model(cluster_name: &str, location: &str) -> ClusterModel {
    ClusterModel {
        name: cluster_name.to_string(),
        location: location.to_string(),
        dns_prefix: Some(cluster_name.to_string()),
        agent_pool_profiles: vec![AgentPoolProfile {
            name: DEFAULT_AGENT_POOL_NAME.to_string(),
            count: DEFAULT_AGENT_POOL_COUNT,
            vm_size: DEFAULT_AGENT_POOL_VM_SIZE.to_string(),
            max_pods: Some(DEFAULT_AGENT_POOL_MAX_PODS),
            os_type: OsType::Linux,
            os_sku: None,
            pool_type: AgentPoolType::VirtualMachineScaleSets,
            mode: AgentPoolMode::System,
            os_disk_size_gb: Some(DEFAULT_AGENT_POOL_OS_DISK_SIZE_GB),
            provisioning_state: None,
        }],
        network_profile: Some(NetworkProfile {
            network_plugin: Some(NetworkPlugin::Kubenet),
            ..NetworkProfile::default()
        }),
        identity: Some(ClusterIdentity {
            identity_type: ResourceIdentityType::SystemAssigned,
        }),
        ..ClusterModel::default()
    }
}

/// Generate a fresh cluster name: `<prefix>-<random lowercase suffix>`.
pub fn generate_cluster_name<R: Rng + ?Sized>(rng: &mut R, prefix: &str) -> String {
    let suffix: String = (0..CLUSTER_NAME_SUFFIX_LEN)
        .map(|_| char::from(rng.gen_range(b'a'..=b'z')))
        .collect();
    format!("{prefix}-{suffix}")
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod model_tests;
