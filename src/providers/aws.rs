mod client;
mod types;

pub use client::{AwsClient, Credentials};
