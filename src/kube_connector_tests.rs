// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `kube_connector.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::test_support::FakeCloud;
    use k8s_openapi::api::core::v1::{NodeCondition, NodeStatus, NodeSystemInfo};

    const KUBECONFIG: &str = r"apiVersion: v1
kind: Config
clusters:
- name: abe2e-aaaaa
  cluster:
    server: https://abe2e-aaaaa.hcp.eastus.azmk8s.io:443
contexts:
- name: abe2e-aaaaa
  context:
    cluster: abe2e-aaaaa
    user: clusterAdmin
current-context: abe2e-aaaaa
users:
- name: clusterAdmin
  user:
    token: not-a-real-token
";

    fn node(ready: &str, image_version: Option<&str>) -> Node {
        Node {
            metadata: ObjectMeta {
                name: Some("aks-nodepool1-0".to_string()),
                labels: image_version.map(|v| {
                    BTreeMap::from([(NODE_IMAGE_VERSION_LABEL.to_string(), v.to_string())])
                }),
                ..Default::default()
            },
            status: Some(NodeStatus {
                conditions: Some(vec![NodeCondition {
                    type_: "Ready".to_string(),
                    status: ready.to_string(),
                    ..Default::default()
                }]),
                node_info: Some(NodeSystemInfo {
                    kernel_version: "5.15.0-1064-azure".to_string(),
                    os_image: "Ubuntu 22.04.4 LTS".to_string(),
                    kubelet_version: "v1.30.3".to_string(),
                    container_runtime_version: "containerd://1.7.15-1".to_string(),
                    architecture: "amd64".to_string(),
                    operating_system: "linux".to_string(),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_decode_kubeconfig() {
        let kubeconfig = decode_kubeconfig(&STANDARD.encode(KUBECONFIG)).unwrap();

        assert_eq!(kubeconfig.current_context.as_deref(), Some("abe2e-aaaaa"));
        assert_eq!(kubeconfig.clusters.len(), 1);
    }

    #[test]
    fn test_decode_kubeconfig_rejects_bad_base64() {
        let err = decode_kubeconfig("not base64!").unwrap_err();

        assert!(err.to_string().contains("not valid base64"));
    }

    #[test]
    fn test_decode_kubeconfig_rejects_bad_yaml() {
        let err = decode_kubeconfig(&STANDARD.encode("clusters: [")).unwrap_err();

        assert!(err.to_string().contains("failed to parse admin kubeconfig"));
    }

    #[test]
    fn test_debug_daemonset_shape() {
        let ds = build_debug_daemonset("e2e-debug");

        assert_eq!(ds.metadata.name.as_deref(), Some(DEBUG_DAEMONSET_NAME));
        assert_eq!(ds.metadata.namespace.as_deref(), Some("e2e-debug"));

        let spec = ds.spec.unwrap();
        assert_eq!(spec.selector.match_labels, spec.template.metadata.unwrap().labels);

        let pod = spec.template.spec.unwrap();
        assert_eq!(pod.host_network, Some(true));
        assert_eq!(pod.containers.len(), 1);
        let container = &pod.containers[0];
        assert_eq!(container.image.as_deref(), Some(DEBUG_DAEMONSET_IMAGE));
        assert_eq!(
            container.security_context.as_ref().and_then(|s| s.privileged),
            Some(true)
        );
    }

    #[test]
    fn test_debug_daemonset_serializes_for_apply() {
        let value = serde_json::to_value(build_debug_daemonset("default")).unwrap();

        assert_eq!(value["apiVersion"], "apps/v1");
        assert_eq!(value["kind"], "DaemonSet");
    }

    #[test]
    fn test_node_readiness() {
        assert!(node_is_ready(&node("True", None)));
        assert!(!node_is_ready(&node("False", None)));
        assert!(!node_is_ready(&node("Unknown", None)));
        assert!(!node_is_ready(&Node::default()));
    }

    #[test]
    fn test_derive_node_parameters() {
        let params = derive_node_parameters(&node("True", Some("AKSUbuntu-2204gen2-202407.29.0")));

        assert_eq!(params[PARAM_KERNEL_VERSION], "5.15.0-1064-azure");
        assert_eq!(params[PARAM_OS_IMAGE], "Ubuntu 22.04.4 LTS");
        assert_eq!(params[PARAM_KUBELET_VERSION], "v1.30.3");
        assert_eq!(params[PARAM_CONTAINER_RUNTIME_VERSION], "containerd://1.7.15-1");
        assert_eq!(params[PARAM_ARCHITECTURE], "amd64");
        assert_eq!(params[PARAM_OPERATING_SYSTEM], "linux");
        assert_eq!(params[PARAM_NODE_IMAGE_VERSION], "AKSUbuntu-2204gen2-202407.29.0");
    }

    #[test]
    fn test_derive_node_parameters_without_label() {
        let params = derive_node_parameters(&node("True", None));

        assert!(!params.contains_key(PARAM_NODE_IMAGE_VERSION));
        assert_eq!(params.len(), 6);
        assert!(derive_node_parameters(&Node::default()).is_empty());
    }

    #[test]
    fn test_connector_uses_configured_namespace() {
        let config = PoolConfig {
            debug_namespace: "e2e-debug".to_string(),
            ..PoolConfig::default()
        };
        let connector = KubeConnector::from_config(Arc::new(FakeCloud::new()), &config);

        assert_eq!(connector.debug_namespace(), "e2e-debug");
    }

    #[tokio::test]
    async fn test_connect_fails_without_credentials() {
        let connector = KubeConnector::new(Arc::new(FakeCloud::new()), "default");

        let Err(err) = connector.connect("rg", "abe2e-aaaaa").await else {
            panic!("connect should fail without an admin kubeconfig");
        };

        assert!(format!("{err:#}").contains("failed to get admin kubeconfig"));
    }
}
