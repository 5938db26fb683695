use serde_json::json;

use crate::locator::ResourceLocator;
use crate::network;
use crate::providers::{ApiError, CloudApi};
use crate::run::{DeletionOutcome, RunMode};

/// Deletion behavior for one (service, resource type) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    TerminateInstance,
    TeardownVpc,
    EmptyAndDeleteBucket,
    DeleteFunction,
    DeleteDbInstance,
    DeleteTable,
    DeleteCluster,
    DeleteQueue,
    DeleteLogGroup,
    DeleteTopic,
}

impl Handler {
    /// The dispatch table. Total over the input domain: every pair resolves
    /// to exactly one handler or to `None`, the explicit unsupported
    /// fallback.
    pub fn resolve(service: &str, resource_type: &str) -> Option<Self> {
        match (service, resource_type) {
            ("ec2", "instance") => Some(Self::TerminateInstance),
            ("ec2", "vpc") => Some(Self::TeardownVpc),
            ("s3", "") => Some(Self::EmptyAndDeleteBucket),
            ("lambda", "function") => Some(Self::DeleteFunction),
            ("rds", "db") => Some(Self::DeleteDbInstance),
            ("dynamodb", "table") => Some(Self::DeleteTable),
            ("eks", "cluster") => Some(Self::DeleteCluster),
            ("sqs", "") => Some(Self::DeleteQueue),
            ("logs", "log-group") => Some(Self::DeleteLogGroup),
            ("sns", "") => Some(Self::DeleteTopic),
            _ => None,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Self::TerminateInstance => "terminate instance",
            Self::TeardownVpc => "tear down VPC and its dependents",
            Self::EmptyAndDeleteBucket => "empty and delete bucket",
            Self::DeleteFunction => "delete function",
            Self::DeleteDbInstance => "delete DB instance without final snapshot",
            Self::DeleteTable => "delete table",
            Self::DeleteCluster => "delete cluster",
            Self::DeleteQueue => "delete queue",
            Self::DeleteLogGroup => "delete log group",
            Self::DeleteTopic => "delete topic",
        }
    }
}

/// Handles a single resource. Never fails the run: handler errors are caught
/// and recorded in the outcome, unsupported pairs get the explicit fallback.
///
/// In preview mode this returns before the API handle is touched, so preview
/// purity holds by construction.
pub async fn dispatch(
    api: &dyn CloudApi,
    locator: &ResourceLocator,
    mode: RunMode,
) -> DeletionOutcome {
    let handler = Handler::resolve(&locator.service, &locator.resource_type);

    if !mode.is_destructive() {
        return match handler {
            Some(handler) => {
                tracing::info!(arn = %locator.raw, action = handler.describe(), "preview: would delete");
                DeletionOutcome::skipped(locator.clone())
            }
            None => {
                tracing::info!(arn = %locator.raw, service = %locator.service, "preview: no deletion handler");
                DeletionOutcome::unsupported(locator.clone())
            }
        };
    }

    let Some(handler) = handler else {
        tracing::warn!(
            arn = %locator.raw,
            service = %locator.service,
            resource_type = %locator.resource_type,
            "no deletion handler"
        );
        return DeletionOutcome::unsupported(locator.clone());
    };

    tracing::info!(arn = %locator.raw, action = handler.describe(), "deleting");

    match invoke(api, handler, locator).await {
        Ok(()) => DeletionOutcome::succeeded(locator.clone()),
        Err(e) => {
            tracing::warn!(arn = %locator.raw, error = %e, "deletion failed");
            DeletionOutcome::failed(locator.clone(), e.to_string())
        }
    }
}

async fn invoke(
    api: &dyn CloudApi,
    handler: Handler,
    locator: &ResourceLocator,
) -> Result<(), ApiError> {
    let id = locator.resource_id.as_str();

    match handler {
        Handler::TerminateInstance => {
            api.mutate("ec2", "TerminateInstances", json!({ "InstanceIds": [id] }))
                .await?;
        }
        Handler::TeardownVpc => network::teardown_vpc(api, id).await?,
        Handler::EmptyAndDeleteBucket => empty_and_delete_bucket(api, id).await?,
        Handler::DeleteFunction => {
            api.mutate("lambda", "DeleteFunction", json!({ "FunctionName": id }))
                .await?;
        }
        Handler::DeleteDbInstance => {
            api.mutate(
                "rds",
                "DeleteDBInstance",
                json!({ "DBInstanceIdentifier": id, "SkipFinalSnapshot": true }),
            )
            .await?;
        }
        Handler::DeleteTable => {
            api.mutate("dynamodb", "DeleteTable", json!({ "TableName": id }))
                .await?;
        }
        Handler::DeleteCluster => {
            api.mutate("eks", "DeleteCluster", json!({ "name": id })).await?;
        }
        Handler::DeleteQueue => delete_queue(api, id).await?,
        Handler::DeleteLogGroup => {
            api.mutate("logs", "DeleteLogGroup", json!({ "logGroupName": id }))
                .await?;
        }
        Handler::DeleteTopic => {
            // SNS deletes by full ARN, not by the trailing name.
            api.mutate("sns", "DeleteTopic", json!({ "TopicArn": locator.raw }))
                .await?;
        }
    }

    Ok(())
}

/// Buckets must be empty before DeleteBucket succeeds, so every object is
/// deleted first, draining the listing page by page.
async fn empty_and_delete_bucket(api: &dyn CloudApi, bucket: &str) -> Result<(), ApiError> {
    let mut token: Option<String> = None;

    loop {
        let mut params = json!({ "Bucket": bucket });
        if let Some(t) = &token {
            params["ContinuationToken"] = json!(t);
        }

        let listing = api.query("s3", "ListObjectsV2", params).await?;

        let keys: Vec<String> = listing
            .get("Contents")
            .and_then(|c| c.as_array())
            .map(|objects| {
                objects
                    .iter()
                    .filter_map(|o| o.get("Key").and_then(|k| k.as_str()))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        for key in keys {
            api.mutate("s3", "DeleteObject", json!({ "Bucket": bucket, "Key": key }))
                .await?;
        }

        token = listing
            .get("NextContinuationToken")
            .and_then(|t| t.as_str())
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        if token.is_none() {
            break;
        }
    }

    api.mutate("s3", "DeleteBucket", json!({ "Bucket": bucket })).await?;
    Ok(())
}

/// Queue deletion goes through the queue URL, which embeds the account id
/// from the caller identity.
async fn delete_queue(api: &dyn CloudApi, name: &str) -> Result<(), ApiError> {
    let identity = api.query("sts", "GetCallerIdentity", json!({})).await?;

    let account = identity
        .get("Account")
        .and_then(|a| a.as_str())
        .ok_or_else(|| ApiError::MalformedResponse {
            message: "GetCallerIdentity response missing Account".to_string(),
        })?;

    let queue_url = format!(
        "https://sqs.{}.amazonaws.com/{}/{}",
        api.region(),
        account,
        name
    );

    api.mutate("sqs", "DeleteQueue", json!({ "QueueUrl": queue_url }))
        .await?;
    Ok(())
}
