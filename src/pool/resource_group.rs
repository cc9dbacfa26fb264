// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Resource group checks used before inventory and during health validation.

use crate::cloud::CloudClient;
use crate::retry::retry_cloud_call;
use anyhow::{Context, Result};
use tracing::{debug, info};

/// Whether the resource group `name` exists.
///
/// # Errors
///
/// Returns an error if the existence check fails after retries.
pub async fn is_existing_resource_group<C>(cloud: &C, name: &str) -> Result<bool>
where
    C: CloudClient + ?Sized,
{
    retry_cloud_call(
        move || cloud.resource_group_exists(name),
        &format!("check resource group {name}"),
    )
    .await
    .with_context(|| format!("failed to get resource group {name:?}"))
}

/// Create the resource group `name` in `location` unless it already exists.
///
/// # Errors
///
/// Returns an error if the existence check or the creation fails.
pub async fn ensure_resource_group<C>(cloud: &C, name: &str, location: &str) -> Result<()>
where
    C: CloudClient + ?Sized,
{
    info!(resource_group = name, "Ensuring resource group");

    if is_existing_resource_group(cloud, name).await? {
        debug!(resource_group = name, "Resource group already exists");
        return Ok(());
    }

    cloud
        .create_or_update_resource_group(name, location)
        .await
        .with_context(|| format!("failed to create resource group {name:?}"))?;
    info!(resource_group = name, location, "Created resource group");
    Ok(())
}

#[cfg(test)]
#[path = "resource_group_tests.rs"]
mod resource_group_tests;
