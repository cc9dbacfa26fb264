// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `kube`-backed cluster connector.
//!
//! [`KubeConnector`] reaches a cluster through the admin kubeconfig served by the
//! control plane, keeps a privileged host-network debug `DaemonSet` applied on it
//! and derives cluster parameters from the first `Ready` node.

use crate::cloud::CloudClient;
use crate::config::PoolConfig;
use crate::connector::{ClusterConnector, ClusterParams};
use crate::constants::{
    DEBUG_DAEMONSET_IMAGE, DEBUG_DAEMONSET_NAME, FIELD_MANAGER, NODE_IMAGE_VERSION_LABEL,
};
use crate::retry::{poll_backoff, retry_cloud_call};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use k8s_openapi::api::{
    apps::v1::{DaemonSet, DaemonSetSpec},
    core::v1::{
        Container, HostPathVolumeSource, Node, PodSpec, PodTemplateSpec, SecurityContext,
        Toleration, Volume, VolumeMount,
    },
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use kube::api::{Api, ListParams, Patch, PatchParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config, ResourceExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

// Parameter keys
pub const PARAM_KERNEL_VERSION: &str = "kernelVersion";
pub const PARAM_OS_IMAGE: &str = "osImage";
pub const PARAM_KUBELET_VERSION: &str = "kubeletVersion";
pub const PARAM_CONTAINER_RUNTIME_VERSION: &str = "containerRuntimeVersion";
pub const PARAM_ARCHITECTURE: &str = "architecture";
pub const PARAM_OPERATING_SYSTEM: &str = "operatingSystem";
pub const PARAM_NODE_IMAGE_VERSION: &str = "nodeImageVersion";

const HOST_VOLUME_NAME: &str = "host";
const HOST_MOUNT_PATH: &str = "/host";

/// Decode a base64 admin kubeconfig as delivered by the control plane.
///
/// # Errors
///
/// Returns an error if the input is not base64-encoded UTF-8 kubeconfig YAML.
pub fn decode_kubeconfig(encoded: &str) -> Result<Kubeconfig> {
    let raw = STANDARD
        .decode(encoded.trim())
        .context("admin kubeconfig is not valid base64")?;
    let yaml = String::from_utf8(raw).context("admin kubeconfig is not valid UTF-8")?;
    Kubeconfig::from_yaml(&yaml).context("failed to parse admin kubeconfig")
}

/// Privileged host-network `DaemonSet` used to debug nodes from inside the cluster.
#[must_use]
pub fn build_debug_daemonset(namespace: &str) -> DaemonSet {
    let labels = BTreeMap::from([("app".to_string(), DEBUG_DAEMONSET_NAME.to_string())]);

    DaemonSet {
        metadata: ObjectMeta {
            name: Some(DEBUG_DAEMONSET_NAME.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(labels.clone()),
            ..Default::default()
        },
        spec: Some(DaemonSetSpec {
            selector: LabelSelector {
                match_labels: Some(labels.clone()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    host_network: Some(true),
                    host_pid: Some(true),
                    containers: vec![Container {
                        name: DEBUG_DAEMONSET_NAME.to_string(),
                        image: Some(DEBUG_DAEMONSET_IMAGE.to_string()),
                        command: Some(vec!["sleep".to_string(), "infinity".to_string()]),
                        security_context: Some(SecurityContext {
                            privileged: Some(true),
                            ..Default::default()
                        }),
                        volume_mounts: Some(vec![VolumeMount {
                            name: HOST_VOLUME_NAME.to_string(),
                            mount_path: HOST_MOUNT_PATH.to_string(),
                            ..Default::default()
                        }]),
                        ..Default::default()
                    }],
                    volumes: Some(vec![Volume {
                        name: HOST_VOLUME_NAME.to_string(),
                        host_path: Some(HostPathVolumeSource {
                            path: "/".to_string(),
                            ..Default::default()
                        }),
                        ..Default::default()
                    }]),
                    // Run on every node, tainted or not
                    tolerations: Some(vec![Toleration {
                        operator: Some("Exists".to_string()),
                        ..Default::default()
                    }]),
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Whether the node reports the `Ready` condition as `True`.
#[must_use]
pub fn node_is_ready(node: &Node) -> bool {
    node.status
        .as_ref()
        .and_then(|status| status.conditions.as_ref())
        .is_some_and(|conditions| {
            conditions
                .iter()
                .any(|c| c.type_ == "Ready" && c.status == "True")
        })
}

/// Cluster parameters derived from one node's system info and labels.
#[must_use]
pub fn derive_node_parameters(node: &Node) -> ClusterParams {
    let mut params = ClusterParams::new();

    if let Some(info) = node.status.as_ref().and_then(|s| s.node_info.as_ref()) {
        for (key, value) in [
            (PARAM_KERNEL_VERSION, &info.kernel_version),
            (PARAM_OS_IMAGE, &info.os_image),
            (PARAM_KUBELET_VERSION, &info.kubelet_version),
            (PARAM_CONTAINER_RUNTIME_VERSION, &info.container_runtime_version),
            (PARAM_ARCHITECTURE, &info.architecture),
            (PARAM_OPERATING_SYSTEM, &info.operating_system),
        ] {
            params.insert(key.to_string(), value.clone());
        }
    }

    if let Some(version) = node.labels().get(NODE_IMAGE_VERSION_LABEL) {
        params.insert(PARAM_NODE_IMAGE_VERSION.to_string(), version.clone());
    }

    params
}

/// [`ClusterConnector`] talking to clusters through the Kubernetes API.
pub struct KubeConnector<C: ?Sized> {
    cloud: Arc<C>,
    debug_namespace: String,
}

impl<C: ?Sized> KubeConnector<C> {
    pub fn new(cloud: Arc<C>, debug_namespace: impl Into<String>) -> Self {
        Self {
            cloud,
            debug_namespace: debug_namespace.into(),
        }
    }

    /// Connector deploying the debug workload into the configured namespace.
    pub fn from_config(cloud: Arc<C>, config: &PoolConfig) -> Self {
        Self::new(cloud, config.debug_namespace.clone())
    }

    #[must_use]
    pub fn debug_namespace(&self) -> &str {
        &self.debug_namespace
    }
}

#[async_trait]
impl<C> ClusterConnector for KubeConnector<C>
where
    C: CloudClient + ?Sized,
{
    type Client = Client;

    async fn connect(&self, resource_group: &str, cluster_name: &str) -> Result<Client> {
        let encoded = retry_cloud_call(
            move || self.cloud.get_admin_kubeconfig(resource_group, cluster_name),
            &format!("get admin kubeconfig of {cluster_name}"),
        )
        .await
        .with_context(|| format!("failed to get admin kubeconfig of cluster {cluster_name:?}"))?;

        let kubeconfig = decode_kubeconfig(&encoded)?;
        let config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await
            .context("failed to load admin kubeconfig")?;

        debug!(cluster = cluster_name, "Connecting to cluster API server");
        Client::try_from(config).context("failed to create kube client")
    }

    async fn ensure_debug_workload(&self, client: &Client) -> Result<()> {
        let daemonset = build_debug_daemonset(&self.debug_namespace);
        let api: Api<DaemonSet> = Api::namespaced(client.clone(), &self.debug_namespace);

        api.patch(
            DEBUG_DAEMONSET_NAME,
            &PatchParams::apply(FIELD_MANAGER).force(),
            &Patch::Apply(&daemonset),
        )
        .await
        .with_context(|| {
            format!(
                "failed to apply debug daemonset {}/{DEBUG_DAEMONSET_NAME}",
                self.debug_namespace
            )
        })?;

        info!(
            namespace = %self.debug_namespace,
            name = DEBUG_DAEMONSET_NAME,
            "Debug daemonset applied"
        );
        Ok(())
    }

    async fn extract_parameters(&self, client: &Client) -> Result<ClusterParams> {
        let nodes: Api<Node> = Api::all(client.clone());
        let mut backoff = poll_backoff();

        loop {
            match nodes.list(&ListParams::default()).await {
                Ok(list) => {
                    if let Some(node) = list.items.iter().find(|n| node_is_ready(n)) {
                        debug!(node = %node.name_any(), "Extracting parameters from ready node");
                        return Ok(derive_node_parameters(node));
                    }
                    debug!(nodes = list.items.len(), "No ready node yet");
                }
                Err(e) => warn!(error = %e, "Failed to list nodes, will retry"),
            }

            let Some(delay) = backoff.next_backoff() else {
                bail!("no ready node found after {:?}", backoff.elapsed());
            };
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
#[path = "kube_connector_tests.rs"]
mod kube_connector_tests;
