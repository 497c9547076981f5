pub mod components;
pub mod content;
pub mod operation;
pub mod schema;
pub mod spec;

use indexmap::IndexMap;

use crate::error::ParseError;
use spec::Document;

/// Keys not modelled by a struct, including `x-*` vendor extensions.
pub type Extensions = IndexMap<String, serde_json::Value>;

/// Parse an OpenAPI document from YAML.
pub fn from_yaml(input: &str) -> Result<Document, ParseError> {
    let value: serde_json::Value = serde_yaml_ng::from_str(input)?;
    from_value(value)
}

/// Parse an OpenAPI document from JSON.
pub fn from_json(input: &str) -> Result<Document, ParseError> {
    let value: serde_json::Value = serde_json::from_str(input)?;
    from_value(value)
}

/// Serialize a document to YAML.
pub fn to_yaml(document: &Document) -> Result<String, ParseError> {
    Ok(serde_yaml_ng::to_string(document)?)
}

/// Serialize a document to pretty-printed JSON.
pub fn to_json(document: &Document) -> Result<String, ParseError> {
    Ok(serde_json::to_string_pretty(document)?)
}

// Going through `Value` first lets us report a 2.0 document as such rather
// than as a missing `openapi` field, and normalizes non-string YAML keys
// (`200:`) before the untagged enums see them.
fn from_value(value: serde_json::Value) -> Result<Document, ParseError> {
    validate_version(&value)?;
    Ok(serde_json::from_value(value)?)
}

fn validate_version(value: &serde_json::Value) -> Result<(), ParseError> {
    if let Some(swagger) = value.get("swagger") {
        return Err(ParseError::UnsupportedVersion(format!(
            "swagger {}",
            swagger.as_str().unwrap_or_default()
        )));
    }
    let version = value
        .get("openapi")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| ParseError::MissingField("openapi".to_string()))?;
    if !version.starts_with("3.") {
        return Err(ParseError::UnsupportedVersion(version.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_swagger_2() {
        let yaml = r#"
swagger: "2.0"
info:
  title: Legacy
  version: "1.0"
paths: {}
"#;
        let err = from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedVersion(v) if v == "swagger 2.0"));
    }

    #[test]
    fn rejects_missing_version() {
        let err = from_json(r#"{"paths": {}}"#).unwrap_err();
        assert!(matches!(err, ParseError::MissingField(f) if f == "openapi"));
    }

    #[test]
    fn numeric_response_keys_become_strings() {
        let yaml = r#"
openapi: 3.0.0
info:
  title: T
  version: "1"
paths:
  /ping:
    get:
      responses:
        200:
          description: ok
"#;
        let doc = from_yaml(yaml).unwrap();
        let get = &doc.paths["/ping"].operations[&operation::HttpMethod::Get];
        assert!(get.responses.contains_key("200"));
    }

    #[test]
    fn yaml_round_trip_preserves_extensions() {
        let yaml = r#"
openapi: 3.0.3
info:
  title: T
  version: "1"
  x-logo: logo.png
paths:
  /widgets:
    get:
      x-operation-name: find
      responses:
        "200":
          description: ok
x-generator: loopback
"#;
        let doc = from_yaml(yaml).unwrap();
        let again = from_yaml(&to_yaml(&doc).unwrap()).unwrap();
        assert_eq!(doc, again);
        assert_eq!(again.extensions["x-generator"], "loopback");
        assert_eq!(again.info.extensions["x-logo"], "logo.png");
    }
}
