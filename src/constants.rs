// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the cluster pool.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// Control Plane Constants
// ============================================================================

/// Resource type of managed clusters as reported by resource-group listings
pub const MANAGED_CLUSTER_RESOURCE_TYPE: &str = "Microsoft.ContainerService/managedClusters";

/// Name of the subnet the control plane creates inside a cluster's virtual network
pub const AKS_SUBNET_NAME: &str = "aks-subnet";

// ============================================================================
// Base Cluster Template Constants
// ============================================================================

/// Name of the system agent pool in the base template
pub const DEFAULT_AGENT_POOL_NAME: &str = "nodepool1";

/// Node count of the system agent pool
pub const DEFAULT_AGENT_POOL_COUNT: i32 = 2;

/// VM size of the system agent pool
pub const DEFAULT_AGENT_POOL_VM_SIZE: &str = "Standard_DS2_v2";

/// Max pods per node in the system agent pool
pub const DEFAULT_AGENT_POOL_MAX_PODS: i32 = 110;

/// OS disk size (GiB) of the system agent pool
pub const DEFAULT_AGENT_POOL_OS_DISK_SIZE_GB: i32 = 512;

/// Length of the random suffix appended to generated cluster names
pub const CLUSTER_NAME_SUFFIX_LEN: usize = 5;

// ============================================================================
// Configuration Defaults
// ============================================================================

/// Default location for new clusters and the test resource group
pub const DEFAULT_LOCATION: &str = "eastus";

/// Default prefix for generated cluster and resource group names
pub const DEFAULT_CLUSTER_NAME_PREFIX: &str = "abe2e";

/// Default namespace for the debug workload
pub const DEFAULT_DEBUG_NAMESPACE: &str = "default";

/// Environment variable overriding the location
pub const ENV_LOCATION: &str = "E2E_LOCATION";

/// Environment variable overriding the test resource group
pub const ENV_RESOURCE_GROUP: &str = "E2E_RESOURCE_GROUP";

/// Environment variable overriding the cluster name prefix
pub const ENV_CLUSTER_NAME_PREFIX: &str = "E2E_CLUSTER_NAME_PREFIX";

/// Environment variable overriding the debug workload namespace
pub const ENV_DEBUG_NAMESPACE: &str = "E2E_DEBUG_NAMESPACE";

// ============================================================================
// Debug Workload Constants
// ============================================================================

/// Name of the debug `DaemonSet`
pub const DEBUG_DAEMONSET_NAME: &str = "debug";

/// Image run by the debug `DaemonSet`
pub const DEBUG_DAEMONSET_IMAGE: &str = "mcr.microsoft.com/cbl-mariner/base/core:2.0";

/// Field manager used for server-side apply
pub const FIELD_MANAGER: &str = "e2e-cluster-pool";

/// Node label carrying the node image version
pub const NODE_IMAGE_VERSION_LABEL: &str = "kubernetes.azure.com/node-image-version";
