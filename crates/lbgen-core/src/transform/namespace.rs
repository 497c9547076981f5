use std::collections::HashMap;

use indexmap::IndexMap;
use log::{debug, trace};

use crate::error::RewriteError;
use crate::parse::schema::Schema;
use crate::parse::spec::Document;

use super::visit::{VisitMut, walk_document, walk_schema};

const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Which schema names and path templates the namespace rewrite leaves alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespacePolicy {
    /// Framework-internal name prefixes that are never renamed.
    pub reserved_prefixes: Vec<String>,
    pub excluded_prefixes: Vec<String>,
    pub excluded_suffixes: Vec<String>,
    pub excluded_substrings: Vec<String>,
    /// Substrings that get the prefix spliced in front of every occurrence
    /// instead of the whole name being prefixed.
    pub expanded_substrings: Vec<String>,
    /// Marker of LoopBack's composite relation types. Prefixed in place,
    /// before any other rule is applied.
    pub relation_marker: String,
    /// Path templates containing any of these keep their original form.
    pub path_exemptions: Vec<String>,
}

impl Default for NamespacePolicy {
    fn default() -> Self {
        Self {
            reserved_prefixes: vec!["loopback".to_string()],
            excluded_prefixes: vec!["New".to_string()],
            excluded_suffixes: vec!["Relations".to_string(), "Partial".to_string()],
            excluded_substrings: vec!["Through".to_string(), ".".to_string()],
            expanded_substrings: vec!["Ping".to_string()],
            relation_marker: "WithRelations".to_string(),
            path_exemptions: vec!["{id}".to_string(), "count".to_string()],
        }
    }
}

impl NamespacePolicy {
    /// Whether `name` gets the prefix prepended as a whole.
    pub fn qualifies(&self, name: &str) -> bool {
        !(self.reserved_prefixes.iter().any(|p| name.starts_with(p.as_str()))
            || self.excluded_prefixes.iter().any(|p| name.starts_with(p.as_str()))
            || self.excluded_suffixes.iter().any(|s| name.ends_with(s.as_str()))
            || self.excluded_substrings.iter().any(|s| name.contains(s.as_str()))
            || self.expanded_substrings.iter().any(|s| name.contains(s.as_str())))
    }

    /// The new name for a schema, or `None` if it stays as it is.
    pub fn rename_schema(&self, name: &str, prefix: &str) -> Option<String> {
        let mut renamed = splice(name, &self.relation_marker, prefix);

        let expanded: Vec<&String> = self
            .expanded_substrings
            .iter()
            .filter(|s| name.contains(s.as_str()))
            .collect();
        if !expanded.is_empty() {
            for s in expanded {
                renamed = splice(&renamed, s, prefix);
            }
        } else if self.qualifies(name) {
            renamed = format!("{prefix}{renamed}");
        }

        (renamed != name).then_some(renamed)
    }

    /// The new path template, or `None` if the template is exempt.
    pub fn rewrite_path(&self, template: &str, prefix: &str) -> Option<String> {
        if self
            .path_exemptions
            .iter()
            .any(|marker| template.contains(marker.as_str()))
        {
            return None;
        }
        let segment = prefix.to_lowercase();
        let rewritten = match template {
            "" | "/" => format!("/{segment}"),
            t if t.starts_with('/') => format!("/{segment}{t}"),
            t => format!("/{segment}/{t}"),
        };
        Some(rewritten)
    }
}

/// Prefix every schema and path identifier in `document` with `prefix`.
///
/// Schemas are renamed by identity: the component key, every `$ref` to it,
/// discriminator mappings naming it, and a `title` equal to the old name.
/// Applying the rewrite to its own output prefixes again.
pub fn rewrite_namespace(
    document: &Document,
    prefix: &str,
    policy: &NamespacePolicy,
) -> Result<Document, RewriteError> {
    if prefix.trim().is_empty() {
        return Err(RewriteError::EmptyPrefix);
    }

    let schema_renames = plan_schema_renames(document, prefix, policy)?;
    let path_renames = plan_path_renames(document, prefix, policy)?;
    debug!(
        "namespace '{}': renaming {} schemas and {} paths",
        prefix,
        schema_renames.len(),
        path_renames.len()
    );

    let mut rewritten = document.clone();

    rewritten.paths = document
        .paths
        .iter()
        .map(|(template, item)| {
            let key = path_renames.get(template).unwrap_or(template).clone();
            (key, item.clone())
        })
        .collect();

    if let Some(ref mut components) = rewritten.components {
        components.schemas = std::mem::take(&mut components.schemas)
            .into_iter()
            .map(|(name, schema)| match schema_renames.get(&name) {
                Some(new_name) => (new_name.clone(), schema),
                None => (name, schema),
            })
            .collect();
    }

    let mut renamer = SchemaRenamer {
        renames: &schema_renames,
    };
    walk_document(&mut renamer, &mut rewritten);

    Ok(rewritten)
}

fn plan_schema_renames(
    document: &Document,
    prefix: &str,
    policy: &NamespacePolicy,
) -> Result<IndexMap<String, String>, RewriteError> {
    let names = document.schema_names();
    let mut renames = IndexMap::new();
    for &name in &names {
        if let Some(new_name) = policy.rename_schema(name, prefix) {
            trace!("schema {name} -> {new_name}");
            renames.insert(name.to_string(), new_name);
        }
    }

    let mut seen: HashMap<&str, &str> = HashMap::new();
    for &name in &names {
        let target = renames.get(name).map(String::as_str).unwrap_or(name);
        if let Some(first) = seen.insert(target, name) {
            return Err(RewriteError::SchemaCollision {
                name: target.to_string(),
                first: first.to_string(),
                second: name.to_string(),
            });
        }
    }
    Ok(renames)
}

fn plan_path_renames(
    document: &Document,
    prefix: &str,
    policy: &NamespacePolicy,
) -> Result<IndexMap<String, String>, RewriteError> {
    let mut renames = IndexMap::new();
    let mut seen: HashMap<String, &str> = HashMap::new();
    for template in document.paths.keys() {
        let target = match policy.rewrite_path(template, prefix) {
            Some(rewritten) => {
                trace!("path {template} -> {rewritten}");
                renames.insert(template.clone(), rewritten.clone());
                rewritten
            }
            None => template.clone(),
        };
        if let Some(first) = seen.insert(target.clone(), template) {
            return Err(RewriteError::PathCollision {
                template: target,
                first: first.to_string(),
                second: template.clone(),
            });
        }
    }
    Ok(renames)
}

/// Insert `prefix` before every occurrence of `marker` in `text`.
fn splice(text: &str, marker: &str, prefix: &str) -> String {
    if marker.is_empty() {
        return text.to_string();
    }
    text.replace(marker, &format!("{prefix}{marker}"))
}

struct SchemaRenamer<'a> {
    renames: &'a IndexMap<String, String>,
}

impl SchemaRenamer<'_> {
    fn rename_ref(&self, ref_path: &str) -> Option<String> {
        let local = ref_path.strip_prefix(SCHEMA_REF_PREFIX)?;
        let (encoded, rest) = match local.split_once('/') {
            Some((name, rest)) => (name, Some(rest)),
            None => (local, None),
        };
        let new_name = self.renames.get(&unescape_pointer(encoded))?;
        let mut renamed = format!("{SCHEMA_REF_PREFIX}{}", escape_pointer(new_name));
        if let Some(rest) = rest {
            renamed.push('/');
            renamed.push_str(rest);
        }
        Some(renamed)
    }
}

impl VisitMut for SchemaRenamer<'_> {
    fn visit_ref(&mut self, ref_path: &mut String) {
        if let Some(renamed) = self.rename_ref(ref_path) {
            *ref_path = renamed;
        }
    }

    fn visit_schema(&mut self, schema: &mut Schema) {
        if let Some(new_title) = schema.title.as_ref().and_then(|t| self.renames.get(t)) {
            schema.title = Some(new_title.clone());
        }
        if let Some(ref mut discriminator) = schema.discriminator {
            for target in discriminator.mapping.values_mut() {
                let renamed = if target.starts_with('#') {
                    self.rename_ref(target)
                } else {
                    self.renames.get(target.as_str()).cloned()
                };
                if let Some(renamed) = renamed {
                    *target = renamed;
                }
            }
        }
        walk_schema(self, schema);
    }
}

// RFC 6901 escaping for a single reference token.
fn unescape_pointer(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

fn escape_pointer(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> NamespacePolicy {
        NamespacePolicy::default()
    }

    #[test]
    fn plain_names_get_prefixed() {
        assert_eq!(
            policy().rename_schema("Widget", "Api"),
            Some("ApiWidget".into())
        );
    }

    #[test]
    fn excluded_names_stay() {
        let p = policy();
        for name in [
            "NewWidget",
            "WidgetPartial",
            "WidgetThroughGadget",
            "loopback.Count",
            "loopbackInternal",
            "Widget.Filter",
        ] {
            assert_eq!(p.rename_schema(name, "Api"), None, "{name}");
        }
    }

    #[test]
    fn relation_marker_is_spliced_not_prefixed() {
        assert_eq!(
            policy().rename_schema("WidgetWithRelations", "Api"),
            Some("WidgetApiWithRelations".into())
        );
    }

    #[test]
    fn plain_relations_suffix_is_excluded() {
        assert_eq!(policy().rename_schema("WidgetRelations", "Api"), None);
    }

    #[test]
    fn ping_occurrences_are_spliced() {
        let p = policy();
        assert_eq!(
            p.rename_schema("PingResponse", "Api"),
            Some("ApiPingResponse".into())
        );
        assert_eq!(
            p.rename_schema("PingPongPing", "Api"),
            Some("ApiPingPongApiPing".into())
        );
        assert_eq!(p.rename_schema("NewPing", "Api"), Some("NewApiPing".into()));
    }

    #[test]
    fn path_rewrite_inserts_lowercase_segment() {
        let p = policy();
        assert_eq!(p.rewrite_path("/widgets", "Api"), Some("/api/widgets".into()));
        assert_eq!(p.rewrite_path("/", "Api"), Some("/api".into()));
        assert_eq!(
            p.rewrite_path("widgets", "MyApi"),
            Some("/myapi/widgets".into())
        );
    }

    #[test]
    fn id_and_count_paths_are_exempt() {
        let p = policy();
        assert_eq!(p.rewrite_path("/widgets/{id}", "Api"), None);
        assert_eq!(p.rewrite_path("/widgets/{id}/gadgets", "Api"), None);
        assert_eq!(p.rewrite_path("/widgets/count", "Api"), None);
        assert_eq!(
            p.rewrite_path("/widgets/{widgetId}", "Api"),
            Some("/api/widgets/{widgetId}".into())
        );
    }

    #[test]
    fn ref_rename_handles_pointer_escapes_and_tails() {
        let renames: IndexMap<String, String> = [
            ("a/b".to_string(), "Apia/b".to_string()),
            ("Widget".to_string(), "ApiWidget".to_string()),
        ]
        .into_iter()
        .collect();
        let renamer = SchemaRenamer { renames: &renames };
        assert_eq!(
            renamer.rename_ref("#/components/schemas/a~1b"),
            Some("#/components/schemas/Apia~1b".into())
        );
        assert_eq!(
            renamer.rename_ref("#/components/schemas/Widget/properties/id"),
            Some("#/components/schemas/ApiWidget/properties/id".into())
        );
        assert_eq!(renamer.rename_ref("#/components/responses/Widget"), None);
        assert_eq!(renamer.rename_ref("other.yaml#/components/schemas/Widget"), None);
    }
}
