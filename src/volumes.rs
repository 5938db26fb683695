use serde::Deserialize;
use serde_json::json;

use crate::locator::ResourceLocator;
use crate::providers::{ApiError, CloudApi};
use crate::run::{DeletionOutcome, RunError, RunMode};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct VolumeList {
    #[serde(default)]
    volumes: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Volume {
    volume_id: String,
}

// Volume ids are not ARNs; a locator is synthesized for uniform reporting.
fn volume_locator(volume_id: &str) -> ResourceLocator {
    ResourceLocator {
        service: "ec2".to_string(),
        resource_type: "volume".to_string(),
        resource_id: volume_id.to_string(),
        raw: volume_id.to_string(),
    }
}

/// Deletes every EBS volume in the "available" state, i.e. volumes left
/// behind after their instance went away. Preview-aware like the main sweep;
/// a listing failure is fatal, per-volume failures are not.
pub async fn sweep_available_volumes(
    api: &dyn CloudApi,
    mode: RunMode,
) -> Result<Vec<DeletionOutcome>, RunError> {
    let body = api
        .query(
            "ec2",
            "DescribeVolumes",
            json!({ "Filters": [{ "Name": "status", "Values": ["available"] }] }),
        )
        .await
        .map_err(RunError::Listing)?;

    let listing: VolumeList = serde_json::from_value(body).map_err(|e| {
        RunError::Listing(ApiError::MalformedResponse {
            message: format!("failed to parse DescribeVolumes response: {}", e),
        })
    })?;

    if listing.volumes.is_empty() {
        tracing::info!("no available volumes to delete");
        return Ok(Vec::new());
    }

    let mut outcomes = Vec::with_capacity(listing.volumes.len());
    for volume in &listing.volumes {
        let locator = volume_locator(&volume.volume_id);

        if !mode.is_destructive() {
            tracing::info!(volume_id = %volume.volume_id, "preview: would delete volume");
            outcomes.push(DeletionOutcome::skipped(locator));
            continue;
        }

        tracing::info!(volume_id = %volume.volume_id, "deleting volume");
        match api
            .mutate("ec2", "DeleteVolume", json!({ "VolumeId": volume.volume_id }))
            .await
        {
            Ok(_) => outcomes.push(DeletionOutcome::succeeded(locator)),
            Err(e) => {
                tracing::warn!(volume_id = %volume.volume_id, error = %e, "volume deletion failed");
                outcomes.push(DeletionOutcome::failed(locator, e.to_string()));
            }
        }
    }

    Ok(outcomes)
}
