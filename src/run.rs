use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dispatch;
use crate::locator::ResourceLocator;
use crate::providers::{ApiError, CloudApi};

/// Execution mode for a whole run, threaded as a value through every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Compute and log intended actions; issue no mutating call at all.
    Preview,
    /// Perform real deletions.
    Destructive,
}

impl RunMode {
    pub fn from_delete_flag(delete: bool) -> Self {
        if delete { Self::Destructive } else { Self::Preview }
    }

    pub fn is_destructive(self) -> bool {
        matches!(self, Self::Destructive)
    }
}

/// The result of handling one resource. Produced once per resource per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DeletionOutcome {
    pub locator: ResourceLocator,
    pub attempted: bool,
    pub succeeded: bool,
    pub error: Option<String>,
}

impl DeletionOutcome {
    pub fn succeeded(locator: ResourceLocator) -> Self {
        Self {
            locator,
            attempted: true,
            succeeded: true,
            error: None,
        }
    }

    pub fn failed(locator: ResourceLocator, error: String) -> Self {
        Self {
            locator,
            attempted: true,
            succeeded: false,
            error: Some(error),
        }
    }

    /// Preview-mode outcome: nothing was attempted, nothing went wrong.
    pub fn skipped(locator: ResourceLocator) -> Self {
        Self {
            locator,
            attempted: false,
            succeeded: false,
            error: None,
        }
    }

    pub fn unsupported(locator: ResourceLocator) -> Self {
        Self {
            attempted: false,
            succeeded: false,
            error: Some(format!(
                "unsupported resource type: {}/{}",
                locator.service, locator.resource_type
            )),
            locator,
        }
    }

    pub fn is_unsupported(&self) -> bool {
        !self.attempted && self.error.is_some()
    }
}

/// Fatal, process-level run errors. Per-resource failures are never fatal and
/// live in the outcome list instead.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("resource listing failed: {0}")]
    Listing(#[source] ApiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub unsupported: usize,
}

impl RunSummary {
    pub fn from_outcomes(outcomes: &[DeletionOutcome]) -> Self {
        let mut summary = Self {
            total: outcomes.len(),
            attempted: 0,
            succeeded: 0,
            failed: 0,
            unsupported: 0,
        };
        for outcome in outcomes {
            if outcome.attempted {
                summary.attempted += 1;
                if outcome.succeeded {
                    summary.succeeded += 1;
                } else {
                    summary.failed += 1;
                }
            } else if outcome.is_unsupported() {
                summary.unsupported += 1;
            }
        }
        summary
    }
}

/// One full pass: list every tagged resource, push each through the
/// dispatcher in listing order, collect outcomes.
///
/// A listing failure is fatal and nothing is acted on; individual deletion
/// failures never are.
pub async fn run(api: &dyn CloudApi, mode: RunMode) -> Result<Vec<DeletionOutcome>, RunError> {
    let arns = api.list_tagged_resources().await.map_err(RunError::Listing)?;

    if arns.is_empty() {
        tracing::info!("no tagged resources found; nothing to do");
        return Ok(Vec::new());
    }

    tracing::info!(
        count = arns.len(),
        destructive = mode.is_destructive(),
        "processing resources"
    );

    let mut outcomes = Vec::with_capacity(arns.len());
    for arn in &arns {
        let locator = match ResourceLocator::parse(arn) {
            Ok(locator) => locator,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unparseable locator");
                continue;
            }
        };
        outcomes.push(dispatch::dispatch(api, &locator, mode).await);
    }

    let summary = RunSummary::from_outcomes(&outcomes);
    tracing::info!(
        total = summary.total,
        attempted = summary.attempted,
        succeeded = summary.succeeded,
        failed = summary.failed,
        unsupported = summary.unsupported,
        "run complete"
    );

    Ok(outcomes)
}

/// The full cleanup: the tagged-resource pass first, then the volume sweep.
/// Terminating instances is what frees their volumes into the "available"
/// state the volume sweep targets.
pub async fn run_all(api: &dyn CloudApi, mode: RunMode) -> Result<Vec<DeletionOutcome>, RunError> {
    let mut outcomes = run(api, mode).await?;
    outcomes.extend(crate::volumes::sweep_available_volumes(api, mode).await?);
    Ok(outcomes)
}
