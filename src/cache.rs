// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Parameter cache shared by every scenario and every preparation task.
//!
//! Extracting parameters from a live cluster is slow, so it happens at most once
//! per cluster name for the lifetime of the cache. Each name maps to its own
//! once-cell: concurrent lookups for the same name wait for a single extraction,
//! lookups for different names never block each other, and a failed extraction
//! leaves the entry empty so the next lookup tries again. Entries are never evicted.

use crate::connector::ClusterParams;
use crate::metrics::record_param_cache_lookup;
use anyhow::Result;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;
use tracing::debug;

type Slot = Arc<OnceCell<ClusterParams>>;

/// Cluster name → extracted parameters. Cheap to clone; clones share entries.
#[derive(Clone, Debug, Default)]
pub struct ParamCache {
    entries: Arc<Mutex<HashMap<String, Slot>>>,
}

impl ParamCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, cluster_name: &str) -> Slot {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .entry(cluster_name.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }

    /// Cached parameters of `cluster_name`, if extraction already succeeded.
    #[must_use]
    pub fn get(&self, cluster_name: &str) -> Option<ClusterParams> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(cluster_name)
            .and_then(|slot| slot.get().cloned())
    }

    /// Number of clusters with cached parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.values().filter(|slot| slot.initialized()).count()
    }

    /// Whether no parameters are cached yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the cached parameters of `cluster_name`, running `extract` on a miss.
    ///
    /// # Errors
    ///
    /// Returns the extraction error on a miss; nothing is cached in that case.
    pub async fn get_or_extract<F, Fut>(&self, cluster_name: &str, extract: F) -> Result<ClusterParams>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ClusterParams>>,
    {
        let slot = self.slot(cluster_name);

        if let Some(params) = slot.get() {
            debug!(cluster = cluster_name, "Cluster parameters cache hit");
            record_param_cache_lookup(true);
            return Ok(params.clone());
        }

        let mut extracted = false;
        let params = slot
            .get_or_try_init(|| {
                extracted = true;
                extract()
            })
            .await?;

        record_param_cache_lookup(!extracted);
        if extracted {
            debug!(cluster = cluster_name, "Cached freshly extracted cluster parameters");
        }
        Ok(params.clone())
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod cache_tests;
