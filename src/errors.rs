// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for the cluster pool.
//!
//! This module provides specialized error types for:
//! - Control-plane client failures, classified so callers can tell a vanished
//!   resource apart from a transient or fatal API failure
//! - Aggregated failures of a parallel cluster creation batch
//! - Fatal outcomes of choosing a cluster for a scenario
//!
//! Everything else flows through `anyhow` with operation and resource context attached.

use thiserror::Error;

/// Errors returned by a control-plane client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CloudError {
    /// The addressed resource does not exist (HTTP 404).
    #[error("{resource} not found (HTTP 404)")]
    NotFound {
        /// The resource that was not found
        resource: String,
    },

    /// The control plane rejected or failed the request.
    #[error("control plane returned HTTP {status} for {resource}: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// The resource the request addressed
        resource: String,
        /// Error message returned by the control plane
        message: String,
    },

    /// The request never reached the control plane (connection reset, DNS, timeout).
    #[error("transport error talking to the control plane: {0}")]
    Transport(String),
}

impl CloudError {
    /// Build a `NotFound` error for a resource.
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Whether the addressed resource is gone.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Api { status, .. } => *status == 404,
            Self::Transport(_) => false,
        }
    }

    /// Whether retrying the same call may succeed.
    ///
    /// Rate limiting (429), server errors (5xx) and transport failures are
    /// retryable; all other client errors are permanent.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::NotFound { .. } => false,
            Self::Api { status, .. } => *status == 429 || (500..600).contains(status),
            Self::Transport(_) => true,
        }
    }
}

/// Whether an `anyhow` error chain bottoms out in a control-plane "not found".
#[must_use]
pub fn is_not_found_error(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<CloudError>())
        .any(CloudError::is_not_found)
}

/// Failures of one or more tasks in a parallel cluster creation batch.
///
/// Only failed tasks contribute an entry; successful siblings are not mentioned.
#[derive(Error, Debug)]
#[error("{}", render_creation_errors(.0))]
pub struct ClusterCreationErrors(pub Vec<anyhow::Error>);

impl ClusterCreationErrors {
    /// Number of failed tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no task failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn render_creation_errors(errors: &[anyhow::Error]) -> String {
    if let [single] = errors {
        return format!("{single:#}");
    }

    let mut msg = String::from("encountered multiple cluster creation errors:");
    for err in errors {
        msg.push('\n');
        msg.push_str(&format!("{err:#}"));
    }
    msg
}

/// Fatal outcomes of choosing a cluster for a scenario.
///
/// Either one ends the calling scenario; neither is retried at this layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    /// No viable cluster could be validated, repaired and prepared.
    #[error("unable to successfully choose a cluster for scenario {scenario:?}")]
    NoViableCluster {
        /// Name of the scenario that cannot run
        scenario: String,
    },

    /// The chosen cluster has no node resource group, which the control plane
    /// always populates on a healthy cluster.
    #[error("tried to choose cluster {cluster:?} without a node resource group")]
    MissingNodeResourceGroup {
        /// Name of the offending cluster
        cluster: String,
    },
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
