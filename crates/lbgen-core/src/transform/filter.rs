use std::str::FromStr;

use indexmap::IndexMap;
use log::{debug, trace};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::FilterError;
use crate::parse::operation::{HttpMethod, PathItem};
use crate::parse::spec::Document;

/// Selects the listed verbs on every path template the pattern matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRule {
    /// Regex searched (unanchored) against the path template.
    pub pattern: String,
    #[serde(default)]
    pub verbs: Vec<HttpMethod>,
}

pub type RuleSet = Vec<FilterRule>;

impl FilterRule {
    pub fn new(pattern: impl Into<String>, verbs: impl IntoIterator<Item = HttpMethod>) -> Self {
        Self {
            pattern: pattern.into(),
            verbs: verbs.into_iter().collect(),
        }
    }
}

/// Parses `<pattern>=<verb>[,<verb>...]`. The split is on the last `=`, so
/// patterns may contain `=` themselves.
impl FromStr for FilterRule {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (pattern, verbs) = s
            .rsplit_once('=')
            .ok_or_else(|| FilterError::MalformedRule(s.to_string()))?;
        if pattern.is_empty() {
            return Err(FilterError::MalformedRule(s.to_string()));
        }
        let verbs = verbs
            .split(',')
            .filter(|v| !v.trim().is_empty())
            .map(HttpMethod::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FilterRule::new(pattern, verbs))
    }
}

/// Which operations survive [`filter_document`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterOptions {
    /// Drop every `post`, `put`, `patch` and `delete`.
    pub readonly: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<RuleSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include: Option<RuleSet>,
}

impl FilterOptions {
    pub fn is_noop(&self) -> bool {
        !self.readonly && self.exclude.is_none() && self.include.is_none()
    }
}

struct CompiledRule {
    pattern: Regex,
    verbs: Vec<HttpMethod>,
}

impl CompiledRule {
    fn selects(&self, template: &str, method: HttpMethod) -> bool {
        self.verbs.contains(&method) && self.pattern.is_match(template)
    }
}

enum Selection {
    All,
    Exclude(Vec<CompiledRule>),
    Include(Vec<CompiledRule>),
}

/// The (path, verb) predicate built from validated [`FilterOptions`].
struct Predicate {
    readonly: bool,
    selection: Selection,
}

impl Predicate {
    fn compile(options: &FilterOptions) -> Result<Self, FilterError> {
        let selection = match (&options.exclude, &options.include) {
            (Some(_), Some(_)) => return Err(FilterError::ConflictingRules),
            (Some(rules), None) => Selection::Exclude(compile_rules(rules)?),
            (None, Some(rules)) => Selection::Include(compile_rules(rules)?),
            (None, None) => Selection::All,
        };
        Ok(Self {
            readonly: options.readonly,
            selection,
        })
    }

    fn keeps(&self, template: &str, method: HttpMethod) -> bool {
        if self.readonly && method.is_mutating() {
            return false;
        }
        match &self.selection {
            Selection::All => true,
            Selection::Exclude(rules) => !rules.iter().any(|r| r.selects(template, method)),
            Selection::Include(rules) => rules.iter().any(|r| r.selects(template, method)),
        }
    }
}

fn compile_rules(rules: &[FilterRule]) -> Result<Vec<CompiledRule>, FilterError> {
    rules
        .iter()
        .map(|rule| {
            let pattern =
                Regex::new(&rule.pattern).map_err(|source| FilterError::InvalidPattern {
                    pattern: rule.pattern.clone(),
                    source,
                })?;
            Ok(CompiledRule {
                pattern,
                verbs: rule.verbs.clone(),
            })
        })
        .collect()
}

/// Copy `document`, keeping only the operations `options` lets through.
///
/// Options are validated before anything is copied. Path items whose every
/// operation was filtered out are dropped; every other section is carried
/// over unchanged.
pub fn filter_document(
    document: &Document,
    options: &FilterOptions,
) -> Result<Document, FilterError> {
    let predicate = Predicate::compile(options)?;

    let mut paths: IndexMap<String, PathItem> = IndexMap::with_capacity(document.paths.len());
    let mut dropped = 0usize;
    for (template, item) in &document.paths {
        let mut kept = item.clone();
        kept.operations = item
            .operations
            .iter()
            .filter(|(method, _)| {
                let keep = predicate.keeps(template, **method);
                if !keep {
                    trace!("dropping {} {}", method, template);
                }
                keep
            })
            .map(|(method, op)| (*method, op.clone()))
            .collect();
        dropped += item.operations.len() - kept.operations.len();
        // Items that started without operations pass through untouched.
        if item.operations.is_empty() || !kept.operations.is_empty() {
            paths.insert(template.clone(), kept);
        }
    }

    debug!(
        "filter dropped {} operations, {} of {} paths remain",
        dropped,
        paths.len(),
        document.paths.len()
    );

    Ok(Document {
        paths,
        ..document.clone()
    })
}
