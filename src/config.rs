// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Pool configuration.
//!
//! Configuration comes from environment variables (the usual path inside a test
//! run) or from a YAML file with the same fields in camelCase.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `E2E_LOCATION` | `eastus` |
//! | `E2E_RESOURCE_GROUP` | `abe2e-<location>` |
//! | `E2E_CLUSTER_NAME_PREFIX` | `abe2e` |
//! | `E2E_DEBUG_NAMESPACE` | `default` |

use crate::constants::{
    DEFAULT_CLUSTER_NAME_PREFIX, DEFAULT_DEBUG_NAMESPACE, DEFAULT_LOCATION, ENV_CLUSTER_NAME_PREFIX,
    ENV_DEBUG_NAMESPACE, ENV_LOCATION, ENV_RESOURCE_GROUP,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Where and how pool clusters are created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolConfig {
    /// Location of the test resource group and every new cluster
    #[serde(default = "default_location")]
    pub location: String,
    /// Resource group holding all pool clusters
    #[serde(default)]
    pub resource_group: String,
    /// Prefix of generated cluster names
    #[serde(default = "default_cluster_name_prefix")]
    pub cluster_name_prefix: String,
    /// Namespace the debug workload is applied to
    #[serde(default = "default_debug_namespace")]
    pub debug_namespace: String,
}

fn default_location() -> String {
    DEFAULT_LOCATION.to_string()
}

fn default_cluster_name_prefix() -> String {
    DEFAULT_CLUSTER_NAME_PREFIX.to_string()
}

fn default_debug_namespace() -> String {
    DEFAULT_DEBUG_NAMESPACE.to_string()
}

fn default_resource_group(prefix: &str, location: &str) -> String {
    format!("{prefix}-{location}")
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            location: default_location(),
            resource_group: default_resource_group(DEFAULT_CLUSTER_NAME_PREFIX, DEFAULT_LOCATION),
            cluster_name_prefix: default_cluster_name_prefix(),
            debug_namespace: default_debug_namespace(),
        }
    }
}

impl PoolConfig {
    /// Build the configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let location = get(ENV_LOCATION).unwrap_or_else(default_location);
        let cluster_name_prefix =
            get(ENV_CLUSTER_NAME_PREFIX).unwrap_or_else(default_cluster_name_prefix);
        let resource_group = get(ENV_RESOURCE_GROUP)
            .unwrap_or_else(|| default_resource_group(&cluster_name_prefix, &location));
        let debug_namespace = get(ENV_DEBUG_NAMESPACE).unwrap_or_else(default_debug_namespace);

        Self {
            location,
            resource_group,
            cluster_name_prefix,
            debug_namespace,
        }
    }

    /// Load the configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid YAML.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read pool config {}", path.display()))?;
        let mut config: Self = serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse pool config {}", path.display()))?;

        if config.resource_group.is_empty() {
            config.resource_group =
                default_resource_group(&config.cluster_name_prefix, &config.location);
        }
        Ok(config)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
