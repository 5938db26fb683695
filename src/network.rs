use serde::Deserialize;
use serde_json::json;

use crate::providers::{ApiError, CloudApi};

/// One step of the VPC teardown plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownStep {
    ReleaseAddresses,
    DeleteNatGateways,
    DetachInternetGateways,
    DeleteSubnets,
    DeleteRouteTables,
    DeleteSecurityGroups,
    DeleteVpc,
}

/// Fixed teardown order. The provider rejects VPC deletion while addresses,
/// gateways, subnets, non-default route tables, or security groups still
/// reference it, so this is a topological sort of that dependency graph.
pub const TEARDOWN_ORDER: [TeardownStep; 7] = [
    TeardownStep::ReleaseAddresses,
    TeardownStep::DeleteNatGateways,
    TeardownStep::DetachInternetGateways,
    TeardownStep::DeleteSubnets,
    TeardownStep::DeleteRouteTables,
    TeardownStep::DeleteSecurityGroups,
    TeardownStep::DeleteVpc,
];

/// Deletes a VPC and everything that would block its deletion.
///
/// Every step before the final one is best-effort: failures are logged and
/// the teardown moves on, since a later full run picks up whatever is left.
/// Only the final VPC deletion decides the overall result.
pub async fn teardown_vpc(api: &dyn CloudApi, vpc_id: &str) -> Result<(), ApiError> {
    for step in TEARDOWN_ORDER {
        match run_step(api, vpc_id, step).await {
            Ok(count) => {
                tracing::info!(?step, count, vpc_id, "teardown step complete");
            }
            Err(e) if step == TeardownStep::DeleteVpc => return Err(e),
            Err(e) => {
                tracing::warn!(?step, vpc_id, error = %e, "teardown step failed; continuing");
            }
        }
    }
    Ok(())
}

async fn run_step(
    api: &dyn CloudApi,
    vpc_id: &str,
    step: TeardownStep,
) -> Result<usize, ApiError> {
    match step {
        TeardownStep::ReleaseAddresses => release_addresses(api).await,
        TeardownStep::DeleteNatGateways => delete_nat_gateways(api, vpc_id).await,
        TeardownStep::DetachInternetGateways => detach_internet_gateways(api, vpc_id).await,
        TeardownStep::DeleteSubnets => delete_subnets(api, vpc_id).await,
        TeardownStep::DeleteRouteTables => delete_route_tables(api, vpc_id).await,
        TeardownStep::DeleteSecurityGroups => delete_security_groups(api, vpc_id).await,
        TeardownStep::DeleteVpc => {
            api.mutate("ec2", "DeleteVpc", json!({ "VpcId": vpc_id })).await?;
            Ok(1)
        }
    }
}

fn vpc_filter(vpc_id: &str) -> serde_json::Value {
    json!({ "Filters": [{ "Name": "vpc-id", "Values": [vpc_id] }] })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AddressList {
    #[serde(default)]
    addresses: Vec<Address>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Address {
    allocation_id: String,
    #[serde(default)]
    association_id: Option<String>,
}

async fn release_addresses(api: &dyn CloudApi) -> Result<usize, ApiError> {
    let body = api
        .query(
            "ec2",
            "DescribeAddresses",
            json!({ "Filters": [{ "Name": "domain", "Values": ["vpc"] }] }),
        )
        .await?;
    let listing: AddressList = parse_listing(body, "DescribeAddresses")?;

    let mut released = 0;
    for address in listing.addresses {
        // Unassociated addresses are left allocated.
        let Some(association_id) = address.association_id else {
            continue;
        };

        let disassociated = api
            .mutate(
                "ec2",
                "DisassociateAddress",
                json!({ "AssociationId": association_id }),
            )
            .await;
        if let Err(e) = disassociated {
            tracing::warn!(allocation_id = %address.allocation_id, error = %e, "failed to disassociate address");
            continue;
        }

        match api
            .mutate(
                "ec2",
                "ReleaseAddress",
                json!({ "AllocationId": address.allocation_id }),
            )
            .await
        {
            Ok(_) => released += 1,
            Err(e) => {
                tracing::warn!(allocation_id = %address.allocation_id, error = %e, "failed to release address");
            }
        }
    }
    Ok(released)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NatGatewayList {
    #[serde(default)]
    nat_gateways: Vec<NatGateway>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NatGateway {
    nat_gateway_id: String,
}

async fn delete_nat_gateways(api: &dyn CloudApi, vpc_id: &str) -> Result<usize, ApiError> {
    let body = api
        .query("ec2", "DescribeNatGateways", vpc_filter(vpc_id))
        .await?;
    let listing: NatGatewayList = parse_listing(body, "DescribeNatGateways")?;

    let mut deleted = 0;
    for gateway in listing.nat_gateways {
        match api
            .mutate(
                "ec2",
                "DeleteNatGateway",
                json!({ "NatGatewayId": gateway.nat_gateway_id }),
            )
            .await
        {
            Ok(_) => deleted += 1,
            Err(e) => {
                tracing::warn!(nat_gateway_id = %gateway.nat_gateway_id, error = %e, "failed to delete NAT gateway");
            }
        }
    }
    Ok(deleted)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InternetGatewayList {
    #[serde(default)]
    internet_gateways: Vec<InternetGateway>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InternetGateway {
    internet_gateway_id: String,
}

async fn detach_internet_gateways(api: &dyn CloudApi, vpc_id: &str) -> Result<usize, ApiError> {
    let body = api
        .query(
            "ec2",
            "DescribeInternetGateways",
            json!({ "Filters": [{ "Name": "attachment.vpc-id", "Values": [vpc_id] }] }),
        )
        .await?;
    let listing: InternetGatewayList = parse_listing(body, "DescribeInternetGateways")?;

    let mut deleted = 0;
    for gateway in listing.internet_gateways {
        let id = &gateway.internet_gateway_id;

        let detached = api
            .mutate(
                "ec2",
                "DetachInternetGateway",
                json!({ "InternetGatewayId": id, "VpcId": vpc_id }),
            )
            .await;
        if let Err(e) = detached {
            tracing::warn!(internet_gateway_id = %id, error = %e, "failed to detach internet gateway");
            continue;
        }

        match api
            .mutate(
                "ec2",
                "DeleteInternetGateway",
                json!({ "InternetGatewayId": id }),
            )
            .await
        {
            Ok(_) => deleted += 1,
            Err(e) => {
                tracing::warn!(internet_gateway_id = %id, error = %e, "failed to delete internet gateway");
            }
        }
    }
    Ok(deleted)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SubnetList {
    #[serde(default)]
    subnets: Vec<Subnet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Subnet {
    subnet_id: String,
}

async fn delete_subnets(api: &dyn CloudApi, vpc_id: &str) -> Result<usize, ApiError> {
    let body = api.query("ec2", "DescribeSubnets", vpc_filter(vpc_id)).await?;
    let listing: SubnetList = parse_listing(body, "DescribeSubnets")?;

    let mut deleted = 0;
    for subnet in listing.subnets {
        match api
            .mutate("ec2", "DeleteSubnet", json!({ "SubnetId": subnet.subnet_id }))
            .await
        {
            Ok(_) => deleted += 1,
            Err(e) => {
                tracing::warn!(subnet_id = %subnet.subnet_id, error = %e, "failed to delete subnet");
            }
        }
    }
    Ok(deleted)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RouteTableList {
    #[serde(default)]
    route_tables: Vec<RouteTable>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RouteTable {
    route_table_id: String,
    #[serde(default)]
    associations: Vec<RouteTableAssociation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RouteTableAssociation {
    route_table_association_id: String,
    #[serde(default)]
    main: bool,
}

/// Non-main associations are removed, then each table without a main
/// association is deleted. The main route table is never deleted directly;
/// it goes away with the VPC.
async fn delete_route_tables(api: &dyn CloudApi, vpc_id: &str) -> Result<usize, ApiError> {
    let body = api
        .query("ec2", "DescribeRouteTables", vpc_filter(vpc_id))
        .await?;
    let listing: RouteTableList = parse_listing(body, "DescribeRouteTables")?;

    let mut operations = 0;
    for table in listing.route_tables {
        let mut has_main = false;
        for association in &table.associations {
            if association.main {
                has_main = true;
                continue;
            }
            match api
                .mutate(
                    "ec2",
                    "DisassociateRouteTable",
                    json!({ "AssociationId": association.route_table_association_id }),
                )
                .await
            {
                Ok(_) => operations += 1,
                Err(e) => {
                    tracing::warn!(
                        association_id = %association.route_table_association_id,
                        error = %e,
                        "failed to disassociate route table"
                    );
                }
            }
        }

        if has_main {
            continue;
        }

        match api
            .mutate(
                "ec2",
                "DeleteRouteTable",
                json!({ "RouteTableId": table.route_table_id }),
            )
            .await
        {
            Ok(_) => operations += 1,
            Err(e) => {
                tracing::warn!(route_table_id = %table.route_table_id, error = %e, "failed to delete route table");
            }
        }
    }
    Ok(operations)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SecurityGroupList {
    #[serde(default)]
    security_groups: Vec<SecurityGroup>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SecurityGroup {
    group_id: String,
    group_name: String,
}

/// The group named "default" cannot be deleted explicitly; the provider
/// removes it with the VPC.
async fn delete_security_groups(api: &dyn CloudApi, vpc_id: &str) -> Result<usize, ApiError> {
    let body = api
        .query("ec2", "DescribeSecurityGroups", vpc_filter(vpc_id))
        .await?;
    let listing: SecurityGroupList = parse_listing(body, "DescribeSecurityGroups")?;

    let mut deleted = 0;
    for group in listing.security_groups {
        if group.group_name == "default" {
            continue;
        }
        match api
            .mutate(
                "ec2",
                "DeleteSecurityGroup",
                json!({ "GroupId": group.group_id }),
            )
            .await
        {
            Ok(_) => deleted += 1,
            Err(e) => {
                tracing::warn!(group_id = %group.group_id, error = %e, "failed to delete security group");
            }
        }
    }
    Ok(deleted)
}

fn parse_listing<T: serde::de::DeserializeOwned>(
    body: serde_json::Value,
    action: &str,
) -> Result<T, ApiError> {
    serde_json::from_value(body).map_err(|e| ApiError::MalformedResponse {
        message: format!("failed to parse {} response: {}", action, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MockApi;

    fn populated_vpc_api() -> MockApi {
        MockApi::new()
            .with_query(
                "ec2",
                "DescribeAddresses",
                json!({ "Addresses": [
                    { "AllocationId": "eipalloc-1", "AssociationId": "eipassoc-1" },
                    { "AllocationId": "eipalloc-2", "AssociationId": "eipassoc-2" }
                ]}),
            )
            .with_query(
                "ec2",
                "DescribeInternetGateways",
                json!({ "InternetGateways": [{ "InternetGatewayId": "igw-1" }] }),
            )
            .with_query(
                "ec2",
                "DescribeSubnets",
                json!({ "Subnets": [{ "SubnetId": "subnet-1" }, { "SubnetId": "subnet-2" }] }),
            )
            .with_query(
                "ec2",
                "DescribeRouteTables",
                json!({ "RouteTables": [
                    {
                        "RouteTableId": "rtb-custom",
                        "Associations": [
                            { "RouteTableAssociationId": "rtbassoc-1", "Main": false }
                        ]
                    },
                    {
                        "RouteTableId": "rtb-main",
                        "Associations": [
                            { "RouteTableAssociationId": "rtbassoc-main", "Main": true }
                        ]
                    }
                ]}),
            )
            .with_query(
                "ec2",
                "DescribeSecurityGroups",
                json!({ "SecurityGroups": [
                    { "GroupId": "sg-app", "GroupName": "app" },
                    { "GroupId": "sg-default", "GroupName": "default" }
                ]}),
            )
    }

    #[tokio::test]
    async fn test_teardown_order_and_sub_operations() {
        let api = populated_vpc_api();

        teardown_vpc(&api, "vpc-1").await.unwrap();

        assert_eq!(
            api.mutations(),
            vec![
                "DisassociateAddress".to_string(),
                "ReleaseAddress".to_string(),
                "DisassociateAddress".to_string(),
                "ReleaseAddress".to_string(),
                "DetachInternetGateway".to_string(),
                "DeleteInternetGateway".to_string(),
                "DeleteSubnet".to_string(),
                "DeleteSubnet".to_string(),
                "DisassociateRouteTable".to_string(),
                "DeleteRouteTable".to_string(),
                "DeleteSecurityGroup".to_string(),
                "DeleteVpc".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_nat_gateways_deleted_between_addresses_and_internet_gateways() {
        let api = MockApi::new()
            .with_query(
                "ec2",
                "DescribeAddresses",
                json!({ "Addresses": [
                    { "AllocationId": "eipalloc-1", "AssociationId": "eipassoc-1" }
                ]}),
            )
            .with_query(
                "ec2",
                "DescribeNatGateways",
                json!({ "NatGateways": [
                    { "NatGatewayId": "nat-1" },
                    { "NatGatewayId": "nat-2" }
                ]}),
            )
            .with_query(
                "ec2",
                "DescribeInternetGateways",
                json!({ "InternetGateways": [{ "InternetGatewayId": "igw-1" }] }),
            );

        teardown_vpc(&api, "vpc-1").await.unwrap();

        assert_eq!(
            api.mutations(),
            vec![
                "DisassociateAddress".to_string(),
                "ReleaseAddress".to_string(),
                "DeleteNatGateway".to_string(),
                "DeleteNatGateway".to_string(),
                "DetachInternetGateway".to_string(),
                "DeleteInternetGateway".to_string(),
                "DeleteVpc".to_string(),
            ]
        );

        let deleted_gateways = api.mutation_params("DeleteNatGateway");
        assert_eq!(deleted_gateways[0]["NatGatewayId"], "nat-1");
        assert_eq!(deleted_gateways[1]["NatGatewayId"], "nat-2");
    }

    #[tokio::test]
    async fn test_main_route_table_is_not_deleted() {
        let api = populated_vpc_api();

        teardown_vpc(&api, "vpc-1").await.unwrap();

        let deleted_tables = api.mutation_params("DeleteRouteTable");
        assert_eq!(deleted_tables.len(), 1);
        assert_eq!(deleted_tables[0]["RouteTableId"], "rtb-custom");
    }

    #[tokio::test]
    async fn test_only_default_security_groups_still_reaches_vpc_deletion() {
        let api = MockApi::new().with_query(
            "ec2",
            "DescribeSecurityGroups",
            json!({ "SecurityGroups": [
                { "GroupId": "sg-1", "GroupName": "default" },
                { "GroupId": "sg-2", "GroupName": "default" }
            ]}),
        );

        teardown_vpc(&api, "vpc-1").await.unwrap();

        assert!(api.mutation_params("DeleteSecurityGroup").is_empty());
        assert_eq!(api.mutation_params("DeleteVpc").len(), 1);
    }

    #[tokio::test]
    async fn test_unassociated_addresses_are_left_alone() {
        let api = MockApi::new().with_query(
            "ec2",
            "DescribeAddresses",
            json!({ "Addresses": [{ "AllocationId": "eipalloc-1" }] }),
        );

        teardown_vpc(&api, "vpc-1").await.unwrap();

        assert!(api.mutation_params("DisassociateAddress").is_empty());
        assert!(api.mutation_params("ReleaseAddress").is_empty());
    }

    #[tokio::test]
    async fn test_sub_step_failure_does_not_block_later_steps() {
        let api = populated_vpc_api()
            .with_failing_mutation("ec2", "DeleteSubnet", "DependencyViolation");

        teardown_vpc(&api, "vpc-1").await.unwrap();

        assert_eq!(api.mutation_params("DeleteSecurityGroup").len(), 1);
        assert_eq!(api.mutation_params("DeleteVpc").len(), 1);
    }

    #[tokio::test]
    async fn test_teardown_is_idempotent_on_already_deleted_vpc() {
        let api = MockApi::new().with_failing_mutation(
            "ec2",
            "DeleteVpc",
            "InvalidVpcID.NotFound: The vpc ID 'vpc-1' does not exist",
        );

        // All sub-resources gone; both passes see empty listings and the
        // final deletion fails with a not-found class error, never a crash.
        for _ in 0..2 {
            let result = teardown_vpc(&api, "vpc-1").await;
            let err = result.unwrap_err();
            assert!(err.to_string().contains("InvalidVpcID.NotFound"));
        }

        assert_eq!(api.mutations().len(), 2);
    }
}
