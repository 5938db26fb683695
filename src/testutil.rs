//! In-memory `CloudApi` double for unit tests: records every call in order
//! and serves canned query responses keyed by (service, action).

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::providers::{ApiError, CloudApi};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Query,
    Mutate,
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub kind: CallKind,
    pub service: String,
    pub action: String,
    pub params: Value,
}

pub struct MockApi {
    region: String,
    listing: Vec<String>,
    queries: HashMap<(String, String), Value>,
    failing_mutations: HashMap<(String, String), String>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self {
            region: "us-east-1".to_string(),
            listing: Vec::new(),
            queries: HashMap::new(),
            failing_mutations: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_listing(mut self, arns: &[&str]) -> Self {
        self.listing = arns.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_query(mut self, service: &str, action: &str, response: Value) -> Self {
        self.queries
            .insert((service.to_string(), action.to_string()), response);
        self
    }

    pub fn with_failing_mutation(mut self, service: &str, action: &str, message: &str) -> Self {
        self.failing_mutations
            .insert((service.to_string(), action.to_string()), message.to_string());
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Mutating action names, in call order.
    pub fn mutations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.kind == CallKind::Mutate)
            .map(|c| c.action)
            .collect()
    }

    /// Query action names, in call order.
    pub fn queries(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.kind == CallKind::Query)
            .map(|c| c.action)
            .collect()
    }

    /// Params of every mutating call with the given action, in call order.
    pub fn mutation_params(&self, action: &str) -> Vec<Value> {
        self.calls()
            .into_iter()
            .filter(|c| c.kind == CallKind::Mutate && c.action == action)
            .map(|c| c.params)
            .collect()
    }

    fn record(&self, kind: CallKind, service: &str, action: &str, params: &Value) {
        self.calls.lock().unwrap().push(RecordedCall {
            kind,
            service: service.to_string(),
            action: action.to_string(),
            params: params.clone(),
        });
    }
}

#[async_trait]
impl CloudApi for MockApi {
    async fn list_tagged_resources(&self) -> Result<Vec<String>, ApiError> {
        Ok(self.listing.clone())
    }

    async fn query(&self, service: &str, action: &str, params: Value) -> Result<Value, ApiError> {
        self.record(CallKind::Query, service, action, &params);
        Ok(self
            .queries
            .get(&(service.to_string(), action.to_string()))
            .cloned()
            .unwrap_or_else(|| serde_json::json!({})))
    }

    async fn mutate(&self, service: &str, action: &str, params: Value) -> Result<Value, ApiError> {
        self.record(CallKind::Mutate, service, action, &params);
        match self
            .failing_mutations
            .get(&(service.to_string(), action.to_string()))
        {
            Some(message) => Err(ApiError::Api {
                status: 400,
                message: message.clone(),
            }),
            None => Ok(Value::Null),
        }
    }

    fn region(&self) -> &str {
        &self.region
    }
}
