use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;

use lbgen_core::ControllerId;

const CACHE_PACKAGE: &str = "loopback-api-cache";
const COMPONENT_IMPORT: &str = "import {CacheBindings, CacheComponent} from 'loopback-api-cache';";
const PROVIDER_IMPORT: &str =
    "import {CacheStrategyProvider} from './providers/cache-strategy.provider';";
const PROVIDER_FILE: &str = "cache-strategy.provider.ts";
const CONTROLLER_IMPORT: &str = "import {cache} from 'loopback-api-cache';";
const SUPER_CALL: &str = "super(options);";
const COMPONENT_LINE: &str = "this.component(CacheComponent);";
const BIND_LINE: &str = "this.bind(CacheBindings.CACHE_STRATEGY).toProvider(CacheStrategyProvider);";
const GET_OPERATION: &str = "@operation('get'";

/// Caching scaffold for a LoopBack 4 project whose controllers were
/// generated by `lb4 openapi`.
pub struct CacheScaffold<'a> {
    pub project: &'a Path,
    pub ttl: u64,
    pub datasource: Option<&'a str>,
}

/// What [`CacheScaffold::apply`] changed, plus the steps left for the user.
#[derive(Debug, Default)]
pub struct ScaffoldReport {
    pub patched: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
    pub commands: Vec<String>,
}

impl CacheScaffold<'_> {
    pub fn apply(&self, controllers: &BTreeSet<ControllerId>) -> Result<ScaffoldReport> {
        let package = self.read_package_json()?;
        if !is_loopback_app(&package) {
            anyhow::bail!(
                "{} is not a LoopBack project (no @loopback/core dependency)",
                self.project.display()
            );
        }

        let controller_files = self.controller_files(controllers)?;

        let mut report = ScaffoldReport::default();
        // The provider binding only goes in once the provider module exists,
        // otherwise the application would not compile.
        let has_provider = self.provider_path().exists();
        let application = self.project.join("src").join("application.ts");
        let changed = update_file(&application, |content| {
            let mut next = content.to_string();
            if has_provider {
                next = add_import(&next, PROVIDER_IMPORT);
            }
            next = add_import(&next, COMPONENT_IMPORT);
            next = insert_after(&next, SUPER_CALL, COMPONENT_LINE);
            if has_provider {
                next = insert_after(&next, COMPONENT_LINE, BIND_LINE);
            }
            next
        })?;
        report.record(application, changed);

        let decorator = format!("@cache({})", self.ttl);
        for path in controller_files {
            let changed = update_file(&path, |content| {
                let next = add_import(content, CONTROLLER_IMPORT);
                if next.contains("@cache(") {
                    return next;
                }
                insert_before_all(&next, GET_OPERATION, &decorator)
            })?;
            report.record(path, changed);
        }

        report.commands = self.follow_up_commands(&package);
        Ok(report)
    }

    fn provider_path(&self) -> PathBuf {
        self.project.join("src").join("providers").join(PROVIDER_FILE)
    }

    fn read_package_json(&self) -> Result<serde_json::Value> {
        let path = self.project.join("package.json");
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("invalid JSON in {}", path.display()))
    }

    fn controller_files(&self, controllers: &BTreeSet<ControllerId>) -> Result<Vec<PathBuf>> {
        let dir = self.project.join("src").join("controllers");
        let mut files = Vec::with_capacity(controllers.len());
        for id in controllers {
            let path = dir.join(id.file_name());
            if !path.exists() {
                anyhow::bail!(
                    "{} not found; run `lb4 openapi` before adding the cache",
                    path.display()
                );
            }
            debug!("controller {id} at {}", path.display());
            files.push(path);
        }
        Ok(files)
    }

    fn follow_up_commands(&self, package: &serde_json::Value) -> Vec<String> {
        let mut commands = Vec::new();
        if !has_dependency(package, CACHE_PACKAGE) {
            commands.push(format!("npm i {CACHE_PACKAGE}"));
        }
        let src = self.project.join("src");
        if !src.join("models").join("cache.model.ts").exists() {
            commands.push("lb4 model Cache --base Model --yes".to_string());
        }
        if !src.join("repositories").join("cache.repository.ts").exists() {
            let datasource = self.datasource.unwrap_or("<datasource>");
            commands.push(format!(
                r#"lb4 repository -c '{{"name":"Cache","datasource":"{datasource}","model":"Cache","repositoryBaseClass":"DefaultKeyValueRepository"}}' --yes"#
            ));
        }
        if !self.provider_path().exists() {
            commands.push(format!(
                "create src/providers/{PROVIDER_FILE} exporting CacheStrategyProvider \
                 (a Provider<CacheStrategy> backed by CacheRepository), then re-run `lbgen cache`"
            ));
        }
        let sequence = src.join("sequence.ts");
        let sequence_ready = fs::read_to_string(&sequence)
            .map(|content| content.contains(CACHE_PACKAGE))
            .unwrap_or(false);
        if !sequence_ready {
            commands.push(format!(
                "update src/sequence.ts to run the {CACHE_PACKAGE} check and set actions \
                 (CacheBindings.CACHE_CHECK_ACTION, CacheBindings.CACHE_SET_ACTION)"
            ));
        }
        commands
    }
}

impl ScaffoldReport {
    fn record(&mut self, path: PathBuf, changed: bool) {
        if changed {
            self.patched.push(path);
        } else {
            self.unchanged.push(path);
        }
    }
}

fn has_dependency(package: &serde_json::Value, name: &str) -> bool {
    package
        .get("dependencies")
        .and_then(|deps| deps.get(name))
        .is_some()
}

/// A `package.json` that depends on `@loopback/core`.
pub fn is_loopback_app(package: &serde_json::Value) -> bool {
    has_dependency(package, "@loopback/core")
}

/// Rewrite `path` through `edit`. Returns whether the file changed.
fn update_file(path: &Path, edit: impl FnOnce(&str) -> String) -> Result<bool> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let updated = edit(&content);
    if updated == content {
        return Ok(false);
    }
    fs::write(path, updated).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(true)
}

/// Put `import` above the first existing import, or at the top.
fn add_import(content: &str, import: &str) -> String {
    if content.contains(import) {
        return content.to_string();
    }
    match content.find("import") {
        Some(idx) => format!("{}{import}\n{}", &content[..idx], &content[idx..]),
        None => format!("{import}\n{content}"),
    }
}

/// Add `line` on its own line after the first `anchor`, at the anchor's
/// indentation. No-op when `line` is already present or `anchor` is not.
fn insert_after(content: &str, anchor: &str, line: &str) -> String {
    if content.contains(line) {
        return content.to_string();
    }
    let Some(idx) = content.find(anchor) else {
        return content.to_string();
    };
    let end = idx + anchor.len();
    let indent = indentation_at(content, idx);
    format!("{}\n{indent}{line}{}", &content[..end], &content[end..])
}

/// Add `line` before every `anchor`, at the anchor's indentation.
fn insert_before_all(content: &str, anchor: &str, line: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut rest = 0;
    for (idx, _) in content.match_indices(anchor) {
        let indent = indentation_at(content, idx);
        out.push_str(&content[rest..idx]);
        out.push_str(line);
        out.push('\n');
        out.push_str(indent);
        rest = idx;
    }
    out.push_str(&content[rest..]);
    out
}

fn indentation_at(content: &str, idx: usize) -> &str {
    let line_start = content[..idx].rfind('\n').map_or(0, |n| n + 1);
    let prefix = &content[line_start..idx];
    if prefix.chars().all(char::is_whitespace) {
        prefix
    } else {
        ""
    }
}
