// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Scenario capabilities consumed by the pool.
//!
//! A scenario is read-only to the pool: it contributes a name, a selector deciding
//! whether an existing cluster can host it, and optionally a mutator shaping the
//! desired model of a brand-new cluster created on its behalf.
//!
//! # Example
//!
//! ```rust
//! use clusterpool::model::{base_cluster_model, NetworkPlugin, NetworkProfile};
//! use clusterpool::scenario::Scenario;
//!
//! let azure_cni = Scenario::new("azure-cni", |c| c.network_plugin() == Some(NetworkPlugin::Azure))
//!     .with_mutator(|c| {
//!         c.network_profile = Some(NetworkProfile {
//!             network_plugin: Some(NetworkPlugin::Azure),
//!             ..NetworkProfile::default()
//!         });
//!     });
//!
//! let desired = azure_cni.desired_cluster_model("abe2e-abcde", "eastus");
//! assert!(azure_cni.is_viable(&desired));
//! assert!(!azure_cni.is_viable(&base_cluster_model("abe2e-fghij", "eastus")));
//! ```

use crate::model::{base_cluster_model, ClusterModel};
use std::fmt;
use std::sync::Arc;

/// Predicate deciding whether a cluster can host a scenario.
pub type ClusterSelector = Arc<dyn Fn(&ClusterModel) -> bool + Send + Sync>;

/// Builder step applied to the base template when creating a cluster for a scenario.
pub type ClusterMutator = Arc<dyn Fn(&mut ClusterModel) + Send + Sync>;

/// One end-to-end test case and its cluster requirements.
#[derive(Clone)]
pub struct Scenario {
    /// Scenario name, used in logs and fatal errors
    pub name: String,
    /// Viability predicate over a cluster's control-plane model
    pub selector: ClusterSelector,
    /// Optional shaping of a brand-new cluster's desired model
    pub mutator: Option<ClusterMutator>,
}

impl Scenario {
    /// Create a scenario from a name and a selector.
    pub fn new<F>(name: impl Into<String>, selector: F) -> Self
    where
        F: Fn(&ClusterModel) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            selector: Arc::new(selector),
            mutator: None,
        }
    }

    /// Attach a mutator applied on top of the base template.
    #[must_use]
    pub fn with_mutator<F>(mut self, mutator: F) -> Self
    where
        F: Fn(&mut ClusterModel) + Send + Sync + 'static,
    {
        self.mutator = Some(Arc::new(mutator));
        self
    }

    /// Whether `cluster` satisfies this scenario's selector.
    #[must_use]
    pub fn is_viable(&self, cluster: &ClusterModel) -> bool {
        (self.selector)(cluster)
    }

    /// Desired model for a new cluster created to host this scenario.
    #[must_use]
    pub fn desired_cluster_model(&self, cluster_name: &str, location: &str) -> ClusterModel {
        let mut model = base_cluster_model(cluster_name, location);
        if let Some(mutator) = &self.mutator {
            mutator(&mut model);
        }
        model
    }
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("has_mutator", &self.mutator.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "scenario_tests.rs"]
mod scenario_tests;
