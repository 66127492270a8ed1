//! Data-source schema metadata and the lookup collaborator.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Field types relevant to aggregation queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    GeoPoint,
    Number,
    Date,
    Keyword,
    Text,
}

/// Schema information for one field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldInfo {
    #[serde(rename = "type")]
    pub field_type: FieldType,

    pub display_name: String,
}

impl FieldInfo {
    pub fn new(field_type: FieldType, display_name: impl Into<String>) -> Self {
        Self {
            field_type,
            display_name: display_name.into(),
        }
    }
}

/// Schema of a queryable data source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSource {
    pub id: String,
    pub title: String,

    /// Field name to schema info.
    pub fields: HashMap<String, FieldInfo>,

    /// Name of the source's primary time field, if it has one.
    pub time_field: Option<String>,
}

impl DataSource {
    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.get(name)
    }
}

/// Collaborator that resolves a data-source reference to its schema.
///
/// Fails with `NotFound` when the referenced source no longer exists.
#[async_trait]
pub trait SchemaProvider: Send + Sync {
    async fn data_source(&self, id: &str) -> Result<DataSource>;
}
