// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # Cluster pool for end-to-end test scenarios
//!
//! Keeps a reusable pool of managed Kubernetes clusters that end-to-end scenarios
//! run on, instead of provisioning one cluster per test.
//!
//! ## Overview
//!
//! - Inventory the clusters already in the test resource group
//! - Match them against each scenario's requirements
//! - Delete and recreate clusters found in a bad state
//! - Create the clusters still missing, in parallel
//! - Prepare a chosen cluster once (subnet, management client, debug workload,
//!   parameters) and cache the expensive parameter extraction per cluster
//!
//! ## Modules
//!
//! - [`pool`] - Inventory, viability, health, provisioning, preparation and selection
//! - [`cloud`] - Control-plane client contract
//! - [`connector`] - Contract for reaching inside a live cluster
//! - [`kube_connector`] - `kube`-backed connector
//! - [`cache`] - Parameter cache shared by every scenario
//! - [`record`] - Pool members and their prepared state
//! - [`context`] - Shared context passed to every pool operation
//!
//! ## Example
//!
//! ```rust,no_run
//! use clusterpool::config::PoolConfig;
//! use clusterpool::context::PoolContext;
//! use clusterpool::kube_connector::KubeConnector;
//! use clusterpool::cloud::CloudClient;
//! use clusterpool::model::NetworkPlugin;
//! use clusterpool::pool::{bootstrap_pool, select::choose_cluster};
//! use clusterpool::scenario::Scenario;
//! use std::sync::Arc;
//!
//! # async fn run(cloud: Arc<dyn CloudClient>) -> anyhow::Result<()> {
//! let config = PoolConfig::from_env();
//! let connector = Arc::new(KubeConnector::from_config(cloud.clone(), &config));
//! let ctx = PoolContext::new(cloud, connector, config);
//!
//! let scenarios = vec![Scenario::new("kubenet", |c| {
//!     c.network_plugin() == Some(NetworkPlugin::Kubenet)
//! })];
//! let mut pool = bootstrap_pool(&ctx, &mut rand::thread_rng(), &scenarios).await?;
//!
//! let record = choose_cluster(&ctx, &scenarios[0], &mut pool).await?;
//! println!("running on {} in subnet {:?}", record.name(), record.subnet_id());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod cloud;
pub mod config;
pub mod connector;
pub mod constants;
pub mod context;
pub mod errors;
pub mod kube_connector;
pub mod metrics;
pub mod model;
pub mod pool;
pub mod record;
pub mod retry;
pub mod scenario;
pub mod telemetry;

#[cfg(test)]
mod test_support;
