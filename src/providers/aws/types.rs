use serde::Deserialize;

pub const TAGGING_PAGE_SIZE: u32 = 100;

pub const TAGGING_TARGET: &str = "ResourceGroupsTaggingAPI_20170126.GetResources";

/// One page of the tagging enumeration.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetResourcesPage {
    #[serde(default)]
    pub resource_tag_mapping_list: Vec<ResourceTagMapping>,
    // Empty string means last page, same as absent.
    #[serde(default)]
    pub pagination_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResourceTagMapping {
    #[serde(rename = "ResourceARN")]
    pub resource_arn: String,
}
