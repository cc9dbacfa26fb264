// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory pool members.
//!
//! A [`ClusterRecord`] pairs a cluster's control-plane model with the result of
//! preparing it. The management client, subnet id and parameters only exist
//! together inside [`Prepared`], so a half-prepared record cannot be expressed.

use crate::connector::ClusterParams;
use crate::model::ClusterModel;

/// Everything preparation produces for one cluster.
#[derive(Debug)]
pub struct Prepared<K> {
    /// Management client scoped to the cluster, owned by the record
    pub client: K,
    /// Id of the subnet nodes of the cluster live in
    pub subnet_id: String,
    /// Parameters extracted from (or cached for) the cluster
    pub parameters: ClusterParams,
}

/// One pool member.
#[derive(Debug)]
pub struct ClusterRecord<K> {
    cluster: ClusterModel,
    prepared: Option<Prepared<K>>,
}

impl<K> ClusterRecord<K> {
    /// An unprepared record.
    #[must_use]
    pub fn new(cluster: ClusterModel) -> Self {
        Self {
            cluster,
            prepared: None,
        }
    }

    /// A record that is prepared from the start.
    #[must_use]
    pub fn prepared(cluster: ClusterModel, prepared: Prepared<K>) -> Self {
        Self {
            cluster,
            prepared: Some(prepared),
        }
    }

    /// Control-plane model of the cluster.
    #[must_use]
    pub fn cluster(&self) -> &ClusterModel {
        &self.cluster
    }

    /// Cluster name, the record's identity within the resource group.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.cluster.name
    }

    /// Whether the management client, subnet id and parameters are all set.
    #[must_use]
    pub fn is_prepared(&self) -> bool {
        self.prepared.is_some()
    }

    /// Mark the record prepared.
    pub fn set_prepared(&mut self, prepared: Prepared<K>) {
        self.prepared = Some(prepared);
    }

    #[must_use]
    pub fn management_client(&self) -> Option<&K> {
        self.prepared.as_ref().map(|p| &p.client)
    }

    #[must_use]
    pub fn subnet_id(&self) -> Option<&str> {
        self.prepared.as_ref().map(|p| p.subnet_id.as_str())
    }

    #[must_use]
    pub fn parameters(&self) -> Option<&ClusterParams> {
        self.prepared.as_ref().map(|p| &p.parameters)
    }
}
