mod scaffold;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use lbgen_core::config::{self, CONFIG_FILE_NAME, LbgenConfig};
use lbgen_core::error::ResolveError;
use lbgen_core::parse;
use lbgen_core::pipeline::{self, PipelineOptions};
use lbgen_core::transform::{ControllerNaming, FilterRule, resolve_controller_ids};
use lbgen_core::Document;

use scaffold::CacheScaffold;

#[derive(Parser)]
#[command(
    name = "lbgen",
    about = "Prepare OpenAPI 3.x documents for LoopBack 4 code generation",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite and filter an OpenAPI document
    Transform {
        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (defaults to the output file's extension, then YAML)
        #[arg(long)]
        format: Option<Format>,
    },

    /// List the controller ids `lb4 openapi` will generate
    Controllers {
        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Summarize an OpenAPI document
    Inspect {
        /// Path to the OpenAPI spec file
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "yaml")]
        format: Format,
    },

    /// Add response caching to a LoopBack project's generated controllers
    Cache {
        #[command(flatten)]
        pipeline: PipelineArgs,

        /// LoopBack project root
        #[arg(long)]
        project: Option<PathBuf>,

        /// Cache time-to-live in seconds
        #[arg(long)]
        ttl: Option<u64>,

        /// Key-value datasource for the cache repository
        #[arg(long)]
        datasource: Option<String>,
    },

    /// Initialize a new lbgen configuration
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Input, namespace and filter flags shared by the document commands.
/// Each one overrides the matching `.lbgen.yaml` value.
#[derive(Args)]
struct PipelineArgs {
    /// Path to the OpenAPI spec file (YAML or JSON)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Namespace prefix for schemas, paths and controller ids
    #[arg(long)]
    prefix: Option<String>,

    /// Drop every post, put, patch and delete operation
    #[arg(long)]
    readonly: bool,

    /// Remove matching operations, as `<regex>=<verb>[,<verb>...]`
    #[arg(long, value_name = "RULE", conflicts_with = "include")]
    exclude: Vec<FilterRule>,

    /// Keep only matching operations, as `<regex>=<verb>[,<verb>...]`
    #[arg(long, value_name = "RULE")]
    include: Vec<FilterRule>,
}

impl PipelineArgs {
    fn input(&self, cfg: &LbgenConfig) -> PathBuf {
        self.input
            .clone()
            .unwrap_or_else(|| PathBuf::from(&cfg.input))
    }

    fn options(&self, cfg: &LbgenConfig) -> PipelineOptions {
        let mut options = cfg.pipeline_options();
        if let Some(ref prefix) = self.prefix {
            options.namespace = Some(prefix.clone());
        }
        options.filter.readonly |= self.readonly;
        if !self.exclude.is_empty() {
            options.filter.exclude = Some(self.exclude.clone());
            options.filter.include = None;
        }
        if !self.include.is_empty() {
            options.filter.include = Some(self.include.clone());
            options.filter.exclude = None;
        }
        options
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Yaml,
    Json,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Transform {
            pipeline,
            output,
            format,
        } => cmd_transform(pipeline, output, format),

        Commands::Controllers { pipeline } => cmd_controllers(pipeline),

        Commands::Inspect { input, format } => cmd_inspect(input, format),

        Commands::Cache {
            pipeline,
            project,
            ttl,
            datasource,
        } => cmd_cache(pipeline, project, ttl, datasource),

        Commands::Init { force } => cmd_init(force),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "lbgen", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Try to load the project config file from the current directory.
fn try_load_config() -> Result<Option<LbgenConfig>> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);
    config::load_config(&config_path).map_err(|e| anyhow::anyhow!(e))
}

fn load_spec(path: &Path) -> Result<Document> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("yaml");

    let parsed = match ext {
        "json" => parse::from_json(&content)?,
        _ => parse::from_yaml(&content)?,
    };
    Ok(parsed)
}

fn cmd_transform(
    args: PipelineArgs,
    output: Option<PathBuf>,
    format: Option<Format>,
) -> Result<()> {
    let cfg = try_load_config()?.unwrap_or_default();
    let input = args.input(&cfg);
    let document = load_spec(&input)?;
    let transformed = pipeline::transform(&document, &args.options(&cfg))?;

    let output = output.or_else(|| cfg.output.as_ref().map(PathBuf::from));
    let format = format.unwrap_or_else(|| match output {
        Some(ref path) if path.extension().is_some_and(|e| e == "json") => Format::Json,
        _ => Format::Yaml,
    });
    let rendered = match format {
        Format::Yaml => parse::to_yaml(&transformed)?,
        Format::Json => parse::to_json(&transformed)? + "\n",
    };

    match output {
        Some(path) => {
            fs::write(&path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!(
                "Wrote {} ({} paths, {} operations)",
                path.display(),
                transformed.paths.len(),
                transformed.operation_count()
            );
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

fn cmd_controllers(args: PipelineArgs) -> Result<()> {
    let cfg = try_load_config()?.unwrap_or_default();
    let document = load_spec(&args.input(&cfg))?;
    let output = pipeline::run(&document, &args.options(&cfg))?;
    for id in &output.controllers {
        println!("{}", id);
    }
    Ok(())
}

fn cmd_inspect(input: Option<PathBuf>, format: Format) -> Result<()> {
    let cfg = try_load_config()?.unwrap_or_default();
    let input = input.unwrap_or_else(|| PathBuf::from(&cfg.input));
    let document = load_spec(&input)?;

    let summary = build_inspect_summary(&document, &cfg.pipeline_options().naming())?;

    match format {
        Format::Yaml => {
            let yaml = serde_yaml_ng::to_string(&summary)?;
            print!("{}", yaml);
        }
        Format::Json => {
            let json = serde_json::to_string_pretty(&summary)?;
            println!("{}", json);
        }
    }

    Ok(())
}

fn build_inspect_summary(
    document: &Document,
    naming: &ControllerNaming,
) -> Result<serde_json::Value, ResolveError> {
    let controllers = resolve_controller_ids(document, naming)?;

    Ok(serde_json::json!({
        "openapi": document.openapi,
        "info": {
            "title": document.info.title,
            "version": document.info.version,
        },
        "paths": document.paths.len(),
        "operations": document.operation_count(),
        "schemas": document.schema_names(),
        "controllers": controllers,
    }))
}

fn cmd_cache(
    args: PipelineArgs,
    project: Option<PathBuf>,
    ttl: Option<u64>,
    datasource: Option<String>,
) -> Result<()> {
    let cfg = try_load_config()?.unwrap_or_default();
    let project = project.unwrap_or_else(|| PathBuf::from(&cfg.cache.project));
    let ttl = ttl.unwrap_or(cfg.cache.ttl);
    let datasource = datasource.or_else(|| cfg.cache.datasource.clone());

    let document = load_spec(&args.input(&cfg))?;
    let output = pipeline::run(&document, &args.options(&cfg))?;

    eprintln!("Adding @cache({}) to {} controllers", ttl, output.controllers.len());
    let scaffold = CacheScaffold {
        project: &project,
        ttl,
        datasource: datasource.as_deref(),
    };
    let report = scaffold.apply(&output.controllers)?;

    for path in &report.patched {
        eprintln!("  patched {}", path.display());
    }
    for path in &report.unchanged {
        eprintln!("  unchanged {}", path.display());
    }

    if !report.commands.is_empty() {
        eprintln!("\nTo finish, in {}:", project.display());
        for command in &report.commands {
            println!("{}", command);
        }
    }
    if datasource.is_none() {
        eprintln!("note: no datasource given; pass --datasource or set cache.datasource");
    }
    Ok(())
}

fn cmd_init(force: bool) -> Result<()> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, config::default_config_content())?;
    eprintln!("Created {}", config_path.display());
    Ok(())
}
