//! Data models for the Asset Registry

use asset_common::{Error, Result};
use serde::{Deserialize, Serialize};

/// Mutable fields of an asset, as accepted on create and update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetFields {
    /// Inventory tag, unique across assets at creation time
    pub asset_tag: String,

    pub host_name: String,

    pub asset_type: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub serial_no: Option<String>,
    pub processor: Option<String>,
    pub os: Option<String>,
    pub os_version: Option<String>,
    pub ram: Option<String>,
    pub storage: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
    pub remark: Option<String>,
    pub warranty_status: Option<String>,

    /// ISO-8601 date, kept as given
    pub warranty_expiration_date: Option<String>,
}

impl AssetFields {
    /// Fields with only the required values set
    pub fn new(asset_tag: impl Into<String>, host_name: impl Into<String>) -> Self {
        Self {
            asset_tag: asset_tag.into(),
            host_name: host_name.into(),
            ..Default::default()
        }
    }

    /// Check that the required fields are non-empty
    pub fn validate(&self) -> Result<()> {
        if self.asset_tag.is_empty() {
            return Err(Error::Validation("asset_tag must not be empty".into()));
        }
        if self.host_name.is_empty() {
            return Err(Error::Validation("host_name must not be empty".into()));
        }
        Ok(())
    }

    /// Case-insensitive substring match over the searchable fields
    ///
    /// `needle` must already be lowercase.
    pub fn matches_search(&self, needle: &str) -> bool {
        let contains = |value: &str| value.to_lowercase().contains(needle);

        contains(&self.asset_tag)
            || contains(&self.host_name)
            || self.make.as_deref().is_some_and(contains)
            || self.model.as_deref().is_some_and(contains)
    }
}

/// Stored asset record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Store-assigned identifier
    #[serde(rename = "_id", alias = "id")]
    pub id: String,

    #[serde(flatten)]
    pub fields: AssetFields,
}

impl Asset {
    pub fn new(id: impl Into<String>, fields: AssetFields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

/// Query parameters for listing assets
#[derive(Debug, Clone, Deserialize)]
pub struct ListParams {
    /// Search text
    pub q: Option<String>,

    #[serde(default)]
    pub skip: u64,

    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_limit() -> u64 {
    25
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            q: None,
            skip: 0,
            limit: default_limit(),
        }
    }
}
