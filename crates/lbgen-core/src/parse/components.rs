use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::Extensions;
use super::content::{ParameterOrRef, RequestBodyOrRef, ResponseOrRef};
use super::schema::SchemaOrRef;

/// Components object holding reusable definitions. Sections that never hold
/// schema names (security schemes, examples, headers, links) stay raw in
/// `extensions`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Components {
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub schemas: IndexMap<String, SchemaOrRef>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub responses: IndexMap<String, ResponseOrRef>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: IndexMap<String, ParameterOrRef>,

    #[serde(
        rename = "requestBodies",
        default,
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub request_bodies: IndexMap<String, RequestBodyOrRef>,

    #[serde(flatten)]
    pub extensions: Extensions,
}
