use std::collections::BTreeSet;

use log::info;

use crate::error::PipelineError;
use crate::parse::spec::Document;
use crate::transform::{
    ControllerId, ControllerNaming, FilterOptions, NamespacePolicy, filter_document,
    resolve_controller_ids, rewrite_namespace,
};

/// Options for a full run: namespace rewrite, filter, controller naming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Namespace prefix. `None` skips the rewrite and leaves controller ids
    /// without a namespace.
    pub namespace: Option<String>,
    pub policy: NamespacePolicy,
    pub filter: FilterOptions,
    pub default_controller: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            namespace: None,
            policy: NamespacePolicy::default(),
            filter: FilterOptions::default(),
            default_controller: ControllerNaming::default().default_name,
        }
    }
}

impl PipelineOptions {
    pub fn naming(&self) -> ControllerNaming {
        ControllerNaming {
            prefix: self.namespace.clone(),
            default_name: self.default_controller.clone(),
        }
    }
}

/// The transformed document and the controllers derived from it.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub document: Document,
    pub controllers: BTreeSet<ControllerId>,
}

/// Apply the namespace rewrite and the filter, in that order. Either stage
/// is skipped when its options ask for nothing.
pub fn transform(
    document: &Document,
    options: &PipelineOptions,
) -> Result<Document, PipelineError> {
    let rewritten = match options.namespace {
        Some(ref prefix) => {
            info!("rewriting namespace with prefix '{prefix}'");
            rewrite_namespace(document, prefix, &options.policy)?
        }
        None => document.clone(),
    };

    if options.filter.is_noop() {
        return Ok(rewritten);
    }
    info!("filtering operations");
    Ok(filter_document(&rewritten, &options.filter)?)
}

/// [`transform`] followed by controller id resolution on the result.
pub fn run(
    document: &Document,
    options: &PipelineOptions,
) -> Result<PipelineOutput, PipelineError> {
    let document = transform(document, options)?;
    let controllers = resolve_controller_ids(&document, &options.naming())?;
    info!("{} controllers", controllers.len());
    Ok(PipelineOutput {
        document,
        controllers,
    })
}
