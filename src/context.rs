// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared context for all pool operations.
//!
//! Every pool operation receives a [`PoolContext`] that contains:
//! - The control-plane client
//! - The cluster connector used by the preparation pipeline
//! - The parameter cache shared across scenarios and creation tasks
//! - Pool configuration and any extra health checks
//!
//! Cloning a context is cheap and every clone shares the same client, connector
//! and cache, which is what lets parallel creation tasks each own one.

use crate::cache::ParamCache;
use crate::config::PoolConfig;
use crate::pool::health::HealthCheck;
use std::sync::Arc;

/// Shared context passed to all pool operations.
pub struct PoolContext<C: ?Sized, X> {
    /// Control-plane client
    pub cloud: Arc<C>,

    /// Connector reaching inside live clusters
    pub connector: Arc<X>,

    /// Parameters extracted so far, keyed by cluster name
    pub param_cache: ParamCache,

    /// Location, resource group and naming
    pub config: PoolConfig,

    /// Extra checks a cluster must pass to be considered healthy
    pub health_checks: Vec<HealthCheck>,
}

impl<C: ?Sized, X> PoolContext<C, X> {
    /// Create a context with an empty parameter cache and no extra health checks.
    pub fn new(cloud: Arc<C>, connector: Arc<X>, config: PoolConfig) -> Self {
        Self {
            cloud,
            connector,
            param_cache: ParamCache::new(),
            config,
            health_checks: Vec::new(),
        }
    }

    /// Register an extra health check.
    #[must_use]
    pub fn with_health_check(mut self, check: HealthCheck) -> Self {
        self.health_checks.push(check);
        self
    }

    /// Resource group holding the pool's clusters.
    #[must_use]
    pub fn resource_group(&self) -> &str {
        &self.config.resource_group
    }

    /// Location of new clusters.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.config.location
    }
}

impl<C: ?Sized, X> Clone for PoolContext<C, X> {
    fn clone(&self) -> Self {
        Self {
            cloud: Arc::clone(&self.cloud),
            connector: Arc::clone(&self.connector),
            param_cache: self.param_cache.clone(),
            config: self.config.clone(),
            health_checks: self.health_checks.clone(),
        }
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod context_tests;
