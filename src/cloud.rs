// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Control-plane client contract.
//!
//! The pool never talks to the cloud directly; it drives an implementation of
//! [`CloudClient`]. Long-running operations come back as a [`Poller`] that must be
//! driven to completion, and listings come back as a [`PageStream`] consumed page
//! by page until exhausted or an error is yielded.

use crate::errors::CloudError;
use crate::model::{ClusterModel, GenericResource, VirtualNetwork};
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Paged listing: each item is one page of results.
pub type PageStream<'a, T> = BoxStream<'a, Result<Vec<T>, CloudError>>;

/// Handle to a long-running control-plane operation.
#[async_trait]
pub trait Poller<T: Send>: Send {
    /// Block until the operation finishes and return its result.
    async fn poll_until_done(&mut self) -> Result<T, CloudError>;
}

/// Operations the pool needs from the cloud control plane.
#[async_trait]
pub trait CloudClient: Send + Sync {
    /// Whether a resource group exists.
    async fn resource_group_exists(&self, name: &str) -> Result<bool, CloudError>;

    /// Create a resource group, or update it if it exists.
    async fn create_or_update_resource_group(
        &self,
        name: &str,
        location: &str,
    ) -> Result<(), CloudError>;

    /// Fetch a cluster. A vanished cluster yields [`CloudError::NotFound`].
    async fn get_cluster(
        &self,
        resource_group: &str,
        name: &str,
    ) -> Result<ClusterModel, CloudError>;

    /// Start creating (or updating) a cluster from a desired model.
    async fn begin_create_cluster(
        &self,
        resource_group: &str,
        name: &str,
        desired: &ClusterModel,
    ) -> Result<Box<dyn Poller<ClusterModel>>, CloudError>;

    /// Start deleting a cluster.
    async fn begin_delete_cluster(
        &self,
        resource_group: &str,
        name: &str,
    ) -> Result<Box<dyn Poller<()>>, CloudError>;

    /// Admin kubeconfig of a cluster, base64 encoded as delivered by the control plane.
    async fn get_admin_kubeconfig(
        &self,
        resource_group: &str,
        name: &str,
    ) -> Result<String, CloudError>;

    /// List the virtual networks of a resource group.
    fn list_virtual_networks<'a>(&'a self, resource_group: &'a str)
        -> PageStream<'a, VirtualNetwork>;

    /// List every resource of a resource group.
    fn list_resources<'a>(&'a self, resource_group: &'a str) -> PageStream<'a, GenericResource>;
}
