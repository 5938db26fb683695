use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A parsed resource locator (ARN).
///
/// Grammar: `arn:partition:service:region:account:resourcepart` with
/// `resourcepart := type SEP id | id`, where SEP is the first `/` or `:` in
/// the resource part. The `:` form covers CloudWatch Logs locators such as
/// `arn:aws:logs:us-east-1:123456789012:log-group:/aws/lambda/fn`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ResourceLocator {
    pub service: String,
    pub resource_type: String,
    pub resource_id: String,
    pub raw: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocatorError {
    #[error("empty resource locator")]
    Empty,
}

impl ResourceLocator {
    /// Parses an ARN-shaped string.
    ///
    /// Malformed but non-empty input degrades to a locator with an empty
    /// `resource_type` and whatever trails the last colon as the id; only
    /// empty input is rejected.
    pub fn parse(raw: &str) -> Result<Self, LocatorError> {
        if raw.is_empty() {
            return Err(LocatorError::Empty);
        }

        let segments: Vec<&str> = raw.splitn(6, ':').collect();
        let service = segments.get(2).copied().unwrap_or("").to_string();

        if segments.len() < 6 {
            return Ok(Self {
                service,
                resource_type: String::new(),
                resource_id: segments.last().copied().unwrap_or("").to_string(),
                raw: raw.to_string(),
            });
        }

        let (resource_type, resource_id) = split_resource_part(segments[5]);

        Ok(Self {
            service,
            resource_type: resource_type.to_string(),
            resource_id: resource_id.to_string(),
            raw: raw.to_string(),
        })
    }
}

impl std::fmt::Display for ResourceLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

fn split_resource_part(part: &str) -> (&str, &str) {
    match part.find(['/', ':']) {
        Some(idx) => (&part[..idx], &part[idx + 1..]),
        None => ("", part),
    }
}
