//! awsweep - AWS account sweeper
//!
//! A library for enumerating tagged AWS resources in a region and deleting
//! them, with a preview mode that issues no mutating call by construction.

pub mod cli;
pub mod dispatch;
pub mod error;
pub mod locator;
pub mod network;
pub mod output;
pub mod providers;
pub mod run;
pub mod volumes;

#[cfg(test)]
mod testutil;

pub use locator::{LocatorError, ResourceLocator};
pub use providers::aws::{AwsClient, Credentials};
pub use providers::{ApiError, CloudApi};
pub use run::{DeletionOutcome, RunMode, RunSummary};
