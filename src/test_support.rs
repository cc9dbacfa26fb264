// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Test doubles for the pool.
//!
//! Provides a scripted control plane and connector that record every call and
//! allow controlled failures for fetch, create, delete and each preparation step.

use crate::cloud::{CloudClient, PageStream, Poller};
use crate::config::PoolConfig;
use crate::connector::{ClusterConnector, ClusterParams};
use crate::constants::MANAGED_CLUSTER_RESOURCE_TYPE;
use crate::context::PoolContext;
use crate::errors::CloudError;
use crate::model::{ClusterModel, GenericResource, NetworkPlugin, ProvisioningState, VirtualNetwork};
use crate::scenario::Scenario;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::StreamExt;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Barrier;

/// Resource group used by [`test_context`].
pub const TEST_RG: &str = "abe2e-eastus";

/// Node resource group the fake control plane assigns to a cluster.
pub fn node_resource_group_of(resource_group: &str, name: &str, location: &str) -> String {
    format!("MC_{resource_group}_{name}_{location}")
}

/// Virtual network id the fake control plane assigns to a cluster.
pub fn vnet_id_of(node_resource_group: &str, name: &str) -> String {
    format!(
        "/subscriptions/sub/resourceGroups/{node_resource_group}/providers/Microsoft.Network/virtualNetworks/aks-vnet-{name}"
    )
}

#[derive(Default)]
struct CloudState {
    resource_groups: BTreeSet<String>,
    clusters: BTreeMap<(String, String), ClusterModel>,
    extra_resources: Vec<(String, GenericResource)>,
    listed_types: HashMap<String, String>,
    vnets: BTreeMap<String, Vec<VirtualNetwork>>,
    get_failures: HashMap<String, CloudError>,
    create_failures: HashSet<String>,
    delete_failures: HashSet<String>,
    resource_group_failures: HashSet<String>,
    create_barrier: Option<Arc<Barrier>>,
    gets: Vec<String>,
    created: Vec<ClusterModel>,
    deleted: Vec<String>,
}

/// Scripted in-memory control plane.
#[derive(Clone, Default)]
pub struct FakeCloud {
    state: Arc<Mutex<CloudState>>,
}

fn lock(state: &Mutex<CloudState>) -> MutexGuard<'_, CloudState> {
    state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Materialize a desired model the way the control plane would after creation.
fn materialize(state: &mut CloudState, resource_group: &str, desired: &ClusterModel) -> ClusterModel {
    let node_rg = node_resource_group_of(resource_group, &desired.name, &desired.location);
    let mut live = desired.clone();
    live.id = Some(format!(
        "/subscriptions/sub/resourceGroups/{resource_group}/providers/Microsoft.ContainerService/managedClusters/{}",
        desired.name
    ));
    live.provisioning_state = Some(ProvisioningState::Succeeded);
    live.node_resource_group = Some(node_rg.clone());
    for pool in &mut live.agent_pool_profiles {
        pool.provisioning_state = Some(ProvisioningState::Succeeded);
    }

    state.resource_groups.insert(node_rg.clone());
    state.vnets.insert(
        node_rg.clone(),
        vec![VirtualNetwork {
            id: vnet_id_of(&node_rg, &desired.name),
        }],
    );
    state.clusters.insert(
        (resource_group.to_string(), desired.name.clone()),
        live.clone(),
    );
    live
}

impl FakeCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_resource_group(&self, name: &str) {
        lock(&self.state).resource_groups.insert(name.to_string());
    }

    pub fn remove_resource_group(&self, name: &str) {
        lock(&self.state).resource_groups.remove(name);
    }

    /// Seed a healthy cluster (with node resource group and vnet) and return its live model.
    pub fn add_healthy_cluster(&self, resource_group: &str, desired: &ClusterModel) -> ClusterModel {
        let mut state = lock(&self.state);
        state.resource_groups.insert(resource_group.to_string());
        materialize(&mut state, resource_group, desired)
    }

    /// Seed a cluster model verbatim, without touching resource groups or vnets.
    pub fn insert_cluster(&self, resource_group: &str, model: ClusterModel) {
        lock(&self.state)
            .clusters
            .insert((resource_group.to_string(), model.name.clone()), model);
    }

    /// Overwrite the provisioning state of a seeded cluster.
    pub fn set_provisioning_state(&self, resource_group: &str, name: &str, state: ProvisioningState) {
        if let Some(model) = lock(&self.state)
            .clusters
            .get_mut(&(resource_group.to_string(), name.to_string()))
        {
            model.provisioning_state = Some(state);
        }
    }

    pub fn remove_vnets(&self, node_resource_group: &str) {
        lock(&self.state).vnets.remove(node_resource_group);
    }

    pub fn set_vnets(&self, node_resource_group: &str, vnets: Vec<VirtualNetwork>) {
        lock(&self.state)
            .vnets
            .insert(node_resource_group.to_string(), vnets);
    }

    pub fn add_resource(&self, resource_group: &str, resource: GenericResource) {
        lock(&self.state)
            .extra_resources
            .push((resource_group.to_string(), resource));
    }

    /// List cluster `name` with `resource_type` instead of the canonical type.
    pub fn set_listed_type(&self, name: &str, resource_type: &str) {
        lock(&self.state)
            .listed_types
            .insert(name.to_string(), resource_type.to_string());
    }

    pub fn fail_get(&self, name: &str, err: CloudError) {
        lock(&self.state).get_failures.insert(name.to_string(), err);
    }

    pub fn fail_create(&self, name: &str) {
        lock(&self.state).create_failures.insert(name.to_string());
    }

    pub fn fail_delete(&self, name: &str) {
        lock(&self.state).delete_failures.insert(name.to_string());
    }

    pub fn fail_resource_group_check(&self, name: &str) {
        lock(&self.state)
            .resource_group_failures
            .insert(name.to_string());
    }

    /// Make every creation wait on `barrier` before completing.
    pub fn set_create_barrier(&self, barrier: Arc<Barrier>) {
        lock(&self.state).create_barrier = Some(barrier);
    }

    pub fn has_resource_group(&self, name: &str) -> bool {
        lock(&self.state).resource_groups.contains(name)
    }

    pub fn cluster(&self, resource_group: &str, name: &str) -> Option<ClusterModel> {
        lock(&self.state)
            .clusters
            .get(&(resource_group.to_string(), name.to_string()))
            .cloned()
    }

    /// Names passed to `get_cluster`, in call order.
    pub fn gets(&self) -> Vec<String> {
        lock(&self.state).gets.clone()
    }

    /// Desired models passed to `begin_create_cluster`, in call order.
    pub fn created(&self) -> Vec<ClusterModel> {
        lock(&self.state).created.clone()
    }

    pub fn created_names(&self) -> Vec<String> {
        self.created().into_iter().map(|m| m.name).collect()
    }

    /// Names passed to `begin_delete_cluster`, in call order.
    pub fn deleted(&self) -> Vec<String> {
        lock(&self.state).deleted.clone()
    }
}

struct FakeCreatePoller {
    state: Arc<Mutex<CloudState>>,
    resource_group: String,
    desired: ClusterModel,
    fail: bool,
    barrier: Option<Arc<Barrier>>,
}

#[async_trait]
impl Poller<ClusterModel> for FakeCreatePoller {
    async fn poll_until_done(&mut self) -> Result<ClusterModel, CloudError> {
        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        if self.fail {
            return Err(CloudError::Api {
                status: 409,
                resource: format!("cluster {}", self.desired.name),
                message: "OperationNotAllowed: quota exceeded".to_string(),
            });
        }
        Ok(materialize(
            &mut lock(&self.state),
            &self.resource_group,
            &self.desired,
        ))
    }
}

struct FakeDeletePoller {
    state: Arc<Mutex<CloudState>>,
    resource_group: String,
    name: String,
    fail: bool,
}

#[async_trait]
impl Poller<()> for FakeDeletePoller {
    async fn poll_until_done(&mut self) -> Result<(), CloudError> {
        if self.fail {
            return Err(CloudError::Api {
                status: 409,
                resource: format!("cluster {}", self.name),
                message: "deletion blocked".to_string(),
            });
        }
        let mut state = lock(&self.state);
        if let Some(model) = state
            .clusters
            .remove(&(self.resource_group.clone(), self.name.clone()))
        {
            if let Some(node_rg) = model.node_resource_group {
                state.resource_groups.remove(&node_rg);
                state.vnets.remove(&node_rg);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CloudClient for FakeCloud {
    async fn resource_group_exists(&self, name: &str) -> Result<bool, CloudError> {
        let state = lock(&self.state);
        if state.resource_group_failures.contains(name) {
            return Err(CloudError::Api {
                status: 403,
                resource: format!("resource group {name}"),
                message: "AuthorizationFailed".to_string(),
            });
        }
        Ok(state.resource_groups.contains(name))
    }

    async fn create_or_update_resource_group(
        &self,
        name: &str,
        _location: &str,
    ) -> Result<(), CloudError> {
        lock(&self.state).resource_groups.insert(name.to_string());
        Ok(())
    }

    async fn get_cluster(
        &self,
        resource_group: &str,
        name: &str,
    ) -> Result<ClusterModel, CloudError> {
        let mut state = lock(&self.state);
        state.gets.push(name.to_string());
        if let Some(err) = state.get_failures.get(name) {
            return Err(err.clone());
        }
        state
            .clusters
            .get(&(resource_group.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| CloudError::not_found(format!("cluster {name}")))
    }

    async fn begin_create_cluster(
        &self,
        resource_group: &str,
        name: &str,
        desired: &ClusterModel,
    ) -> Result<Box<dyn Poller<ClusterModel>>, CloudError> {
        let mut state = lock(&self.state);
        state.created.push(desired.clone());
        Ok(Box::new(FakeCreatePoller {
            state: Arc::clone(&self.state),
            resource_group: resource_group.to_string(),
            desired: desired.clone(),
            fail: state.create_failures.contains(name),
            barrier: state.create_barrier.clone(),
        }))
    }

    async fn begin_delete_cluster(
        &self,
        resource_group: &str,
        name: &str,
    ) -> Result<Box<dyn Poller<()>>, CloudError> {
        let mut state = lock(&self.state);
        state.deleted.push(name.to_string());
        Ok(Box::new(FakeDeletePoller {
            state: Arc::clone(&self.state),
            resource_group: resource_group.to_string(),
            name: name.to_string(),
            fail: state.delete_failures.contains(name),
        }))
    }

    async fn get_admin_kubeconfig(
        &self,
        _resource_group: &str,
        name: &str,
    ) -> Result<String, CloudError> {
        Err(CloudError::not_found(format!("credentials of {name}")))
    }

    fn list_virtual_networks<'a>(
        &'a self,
        resource_group: &'a str,
    ) -> PageStream<'a, VirtualNetwork> {
        let vnets = lock(&self.state)
            .vnets
            .get(resource_group)
            .cloned()
            .unwrap_or_default();
        // An empty first page mimics the control plane paging through nothing.
        futures::stream::iter(vec![Ok(Vec::new()), Ok(vnets)]).boxed()
    }

    fn list_resources<'a>(&'a self, resource_group: &'a str) -> PageStream<'a, GenericResource> {
        let state = lock(&self.state);
        let clusters: Vec<GenericResource> = state
            .clusters
            .keys()
            .filter(|(rg, _)| rg == resource_group)
            .map(|(_, name)| GenericResource {
                name: name.clone(),
                resource_type: state
                    .listed_types
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| MANAGED_CLUSTER_RESOURCE_TYPE.to_string()),
            })
            .collect();
        let extras: Vec<GenericResource> = state
            .extra_resources
            .iter()
            .filter(|(rg, _)| rg == resource_group)
            .map(|(_, r)| r.clone())
            .collect();
        futures::stream::iter(vec![Ok(clusters), Ok(extras)]).boxed()
    }
}

/// Management client handed out by [`FakeConnector`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FakeKube {
    pub cluster: String,
    /// Unique per `connect` call
    pub session: usize,
}

#[derive(Default)]
struct ConnectorState {
    connects: Vec<String>,
    ensures: Vec<String>,
    extractions: HashMap<String, usize>,
    fail_connect: HashSet<String>,
    fail_ensure: HashSet<String>,
    fail_extract: HashSet<String>,
}

/// Scripted cluster connector.
#[derive(Default)]
pub struct FakeConnector {
    state: Mutex<ConnectorState>,
    sessions: AtomicUsize,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ConnectorState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub fn fail_connect(&self, cluster: &str) {
        self.lock().fail_connect.insert(cluster.to_string());
    }

    pub fn fail_ensure(&self, cluster: &str) {
        self.lock().fail_ensure.insert(cluster.to_string());
    }

    pub fn fail_extract(&self, cluster: &str) {
        self.lock().fail_extract.insert(cluster.to_string());
    }

    /// Cluster names passed to `connect`, in call order.
    pub fn connects(&self) -> Vec<String> {
        self.lock().connects.clone()
    }

    /// Cluster names passed to `ensure_debug_workload`, in call order.
    pub fn ensures(&self) -> Vec<String> {
        self.lock().ensures.clone()
    }

    /// Number of parameter extractions run against `cluster`.
    pub fn extractions(&self, cluster: &str) -> usize {
        self.lock().extractions.get(cluster).copied().unwrap_or(0)
    }
}

/// Parameters the fake connector extracts for a cluster.
pub fn fake_params(cluster: &str) -> ClusterParams {
    ClusterParams::from([
        ("clusterName".to_string(), cluster.to_string()),
        ("kernelVersion".to_string(), "5.15.0-1064-azure".to_string()),
    ])
}

#[async_trait]
impl ClusterConnector for FakeConnector {
    type Client = FakeKube;

    async fn connect(&self, _resource_group: &str, cluster_name: &str) -> Result<FakeKube> {
        let mut state = self.lock();
        state.connects.push(cluster_name.to_string());
        if state.fail_connect.contains(cluster_name) {
            return Err(anyhow!("unable to fetch credentials for {cluster_name}"));
        }
        Ok(FakeKube {
            cluster: cluster_name.to_string(),
            session: self.sessions.fetch_add(1, Ordering::SeqCst),
        })
    }

    async fn ensure_debug_workload(&self, client: &FakeKube) -> Result<()> {
        let mut state = self.lock();
        state.ensures.push(client.cluster.clone());
        if state.fail_ensure.contains(&client.cluster) {
            return Err(anyhow!("debug daemonset rejected by {}", client.cluster));
        }
        Ok(())
    }

    async fn extract_parameters(&self, client: &FakeKube) -> Result<ClusterParams> {
        let mut state = self.lock();
        *state.extractions.entry(client.cluster.clone()).or_default() += 1;
        if state.fail_extract.contains(&client.cluster) {
            return Err(anyhow!("no ready node in {}", client.cluster));
        }
        Ok(fake_params(&client.cluster))
    }
}

/// Context over the fakes with the default configuration (resource group [`TEST_RG`]).
pub fn test_context(cloud: FakeCloud, connector: FakeConnector) -> PoolContext<FakeCloud, FakeConnector> {
    cloud.add_resource_group(TEST_RG);
    PoolContext::new(Arc::new(cloud), Arc::new(connector), PoolConfig::default())
}

/// Scenario accepting clusters with the given network plugin and creating them with it.
pub fn plugin_scenario(name: &str, plugin: NetworkPlugin) -> Scenario {
    Scenario::new(name, move |c| c.network_plugin() == Some(plugin)).with_mutator(move |c| {
        if let Some(profile) = c.network_profile.as_mut() {
            profile.network_plugin = Some(plugin);
        }
    })
}

/// Scenario accepting only clusters tagged `scenario=<tag>` and tagging the clusters it creates.
pub fn tagged_scenario(tag: &str) -> Scenario {
    let wanted = tag.to_string();
    let applied = tag.to_string();
    Scenario::new(format!("scenario-{tag}"), move |c| {
        c.tags.get("scenario") == Some(&wanted)
    })
    .with_mutator(move |c| {
        c.tags.insert("scenario".to_string(), applied.clone());
    })
}
