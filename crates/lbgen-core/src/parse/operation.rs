use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use super::Extensions;
use super::content::{ParameterOrRef, RequestBodyOrRef, ResponseOrRef};
use super::spec::Server;
use crate::error::FilterError;

/// HTTP method, as used for path item keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 8] = [
        HttpMethod::Get,
        HttpMethod::Put,
        HttpMethod::Post,
        HttpMethod::Delete,
        HttpMethod::Options,
        HttpMethod::Head,
        HttpMethod::Patch,
        HttpMethod::Trace,
    ];

    /// The lowercase key used in a path item.
    pub fn as_key(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Put => "put",
            HttpMethod::Post => "post",
            HttpMethod::Delete => "delete",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
            HttpMethod::Patch => "patch",
            HttpMethod::Trace => "trace",
        }
    }

    /// Match a path item key exactly. Path item keys are case-sensitive.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_key() == key)
    }

    /// `post`, `put`, `patch` and `delete`.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch | HttpMethod::Delete
        )
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

impl FromStr for HttpMethod {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::from_key(&lower).ok_or_else(|| FilterError::UnknownVerb(s.to_string()))
    }
}

/// An API operation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Operation {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "operationId", skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterOrRef>,

    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBodyOrRef>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub responses: IndexMap<String, ResponseOrRef>,

    /// LoopBack's explicit controller grouping.
    #[serde(rename = "x-controller-name", skip_serializing_if = "Option::is_none")]
    pub controller_name: Option<String>,

    #[serde(flatten)]
    pub extensions: Extensions,
}

/// A path item. Operations are kept in declaration order, so the first
/// entry of `operations` is the first verb written in the source document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathItem {
    pub ref_path: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub operations: IndexMap<HttpMethod, Operation>,
    pub servers: Vec<Server>,
    pub parameters: Vec<ParameterOrRef>,
    pub extensions: Extensions,
}

impl PathItem {
    /// The first declared operation, if any.
    pub fn first_operation(&self) -> Option<(HttpMethod, &Operation)> {
        self.operations.first().map(|(m, op)| (*m, op))
    }

    fn from_raw(raw: IndexMap<String, serde_json::Value>) -> Result<Self, serde_json::Error> {
        let mut item = PathItem::default();
        for (key, value) in raw {
            if let Some(method) = HttpMethod::from_key(&key) {
                item.operations.insert(method, serde_json::from_value(value)?);
                continue;
            }
            match key.as_str() {
                "$ref" => item.ref_path = Some(serde_json::from_value(value)?),
                "summary" => item.summary = Some(serde_json::from_value(value)?),
                "description" => item.description = Some(serde_json::from_value(value)?),
                "servers" => item.servers = serde_json::from_value(value)?,
                "parameters" => item.parameters = serde_json::from_value(value)?,
                _ => {
                    item.extensions.insert(key, value);
                }
            }
        }
        Ok(item)
    }
}

impl<'de> Deserialize<'de> for PathItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = IndexMap::<String, serde_json::Value>::deserialize(deserializer)?;
        PathItem::from_raw(raw).map_err(de::Error::custom)
    }
}

impl Serialize for PathItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(ref r) = self.ref_path {
            map.serialize_entry("$ref", r)?;
        }
        if let Some(ref summary) = self.summary {
            map.serialize_entry("summary", summary)?;
        }
        if let Some(ref description) = self.description {
            map.serialize_entry("description", description)?;
        }
        for (method, op) in &self.operations {
            map.serialize_entry(method.as_key(), op)?;
        }
        if !self.servers.is_empty() {
            map.serialize_entry("servers", &self.servers)?;
        }
        if !self.parameters.is_empty() {
            map.serialize_entry("parameters", &self.parameters)?;
        }
        for (key, value) in &self.extensions {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
