use std::collections::BTreeSet;
use std::fmt;

use heck::ToKebabCase;
use log::{debug, trace};
use serde::{Serialize, Serializer};

use crate::error::ResolveError;
use crate::parse::operation::Operation;
use crate::parse::spec::Document;

/// Name used until the first path yields one of its own.
pub const DEFAULT_CONTROLLER_NAME: &str = "OpenApi";

const CONTROLLER_SUFFIX: &str = "Controller";

/// A generated controller's identifier: a kebab-case name, optionally under
/// a lowercase namespace (`api.widget`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ControllerId {
    namespace: Option<String>,
    name: String,
}

impl ControllerId {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            name: name.into(),
        }
    }

    pub fn with_namespace(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// File that `lb4 openapi` writes for this controller.
    pub fn file_name(&self) -> String {
        format!("openapi.{self}.controller.ts")
    }
}

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.namespace {
            Some(ref ns) => write!(f, "{}.{}", ns, self.name),
            None => f.write_str(&self.name),
        }
    }
}

impl Serialize for ControllerId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Inputs to controller naming besides the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerNaming {
    /// Namespace prefix; stripped from tags and re-applied, lowercased, as
    /// the id's namespace.
    pub prefix: Option<String>,
    pub default_name: String,
}

impl Default for ControllerNaming {
    fn default() -> Self {
        Self {
            prefix: None,
            default_name: DEFAULT_CONTROLLER_NAME.to_string(),
        }
    }
}

impl ControllerNaming {
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            ..Self::default()
        }
    }
}

/// Derive the set of controller ids the generator produces for `document`.
///
/// Only the first declared operation of each path is consulted. A path whose
/// operation names no controller reuses the name resolved for the path before
/// it, starting from `naming.default_name`.
pub fn resolve_controller_ids(
    document: &Document,
    naming: &ControllerNaming,
) -> Result<BTreeSet<ControllerId>, ResolveError> {
    if document.paths.is_empty() {
        return Err(ResolveError::NoPaths);
    }

    let prefix = naming.prefix.as_deref().filter(|p| !p.is_empty());
    let namespace = prefix.map(str::to_lowercase);
    let mut current = naming.default_name.clone();
    let mut ids = BTreeSet::new();

    for (template, item) in &document.paths {
        let (method, op) = item
            .first_operation()
            .ok_or_else(|| ResolveError::NoOperations {
                path: template.clone(),
            })?;

        if let Some(name) = raw_controller_name(op, prefix) {
            current = name;
        }
        let kebab = current.to_kebab_case();
        trace!("{method} {template} -> {kebab}");

        let id = match namespace {
            Some(ref ns) => ControllerId::with_namespace(ns.clone(), kebab),
            None => ControllerId::new(kebab),
        };
        ids.insert(id);
    }

    debug!(
        "resolved {} controller ids from {} paths",
        ids.len(),
        document.paths.len()
    );
    Ok(ids)
}

/// The controller name an operation declares, before kebab-casing.
fn raw_controller_name(op: &Operation, prefix: Option<&str>) -> Option<String> {
    let name = if let Some(tag) = op.tags.first() {
        let tag = match prefix {
            Some(p) if tag.contains(p) => tag.replacen(p, "", 1),
            _ => tag.clone(),
        };
        strip_controller_suffix(&tag).to_string()
    } else if let Some(ref explicit) = op.controller_name {
        strip_controller_suffix(explicit).to_string()
    } else {
        return None;
    };
    (!name.is_empty()).then_some(name)
}

fn strip_controller_suffix(name: &str) -> &str {
    name.strip_suffix(CONTROLLER_SUFFIX).unwrap_or(name)
}
