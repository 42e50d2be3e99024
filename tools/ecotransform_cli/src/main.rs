use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use ecotransform::{
    parser, CancelToken, EngineOptions, EntityRegistry, PluginRegistry, RunReport, TransformConfig,
    TransformEngine,
};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ecotransform")]
#[command(about = "Compute per-group widget statistics from ecological field data")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a transform configuration without running it
    Validate {
        /// Transform configuration (YAML)
        #[arg(long)]
        config: PathBuf,

        /// Entity records (JSON); also checks entity schemas and relations
        #[arg(long)]
        data: Option<PathBuf>,
    },
    /// Run every dimension and write one JSON file per group
    Run {
        /// Transform configuration (YAML)
        #[arg(long)]
        config: PathBuf,

        /// Entity records (JSON)
        #[arg(long)]
        data: PathBuf,

        /// Output directory
        #[arg(long)]
        out: PathBuf,

        /// Worker threads (overrides the config)
        #[arg(long)]
        threads: Option<usize>,

        /// Process groups one at a time
        #[arg(long)]
        sequential: bool,

        /// Run only this dimension
        #[arg(long)]
        dimension: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = Args::parse();
    match args.command {
        Commands::Validate { config, data } => handle_validate(&config, data.as_deref()),
        Commands::Run { config, data, out, threads, sequential, dimension } => {
            handle_run(&config, &data, &out, threads, sequential, dimension.as_deref())
        }
    }
}

fn load_config(path: &Path) -> anyhow::Result<TransformConfig> {
    parser::parse_file(path).with_context(|| format!("loading config {}", path.display()))
}

fn load_entities(config: &TransformConfig, path: &Path) -> anyhow::Result<EntityRegistry> {
    let data = parser::parse_data_file(path).with_context(|| format!("loading data {}", path.display()))?;
    EntityRegistry::from_specs(&config.entities, &data).context("registering entities")
}

/// Handle the 'validate' subcommand
fn handle_validate(config_path: &Path, data_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    println!(
        "{}: {} entities, {} dimensions",
        config_path.display(),
        config.entities.len(),
        config.transforms.len()
    );

    let Some(data_path) = data_path else {
        // without records only the plugin names can be checked
        let plugins = PluginRegistry::with_builtins();
        for block in &config.transforms {
            for (key, widget) in &block.widgets_data {
                plugins
                    .check(&widget.plugin, &widget.params)
                    .with_context(|| format!("dimension '{}', widget '{}'", block.group_by, key))?;
            }
        }
        println!("ok");
        return Ok(());
    };

    let entities = load_entities(&config, data_path)?;
    let plugins = PluginRegistry::with_builtins();
    TransformEngine::from_config(&config, &entities, &plugins).context("validating transforms")?;
    println!("ok");
    Ok(())
}

/// Handle the 'run' subcommand
fn handle_run(
    config_path: &Path,
    data_path: &Path,
    out: &Path,
    threads: Option<usize>,
    sequential: bool,
    dimension: Option<&str>,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let entities = load_entities(&config, data_path)?;
    let plugins = PluginRegistry::with_builtins();

    let mut options = EngineOptions::from(&config.engine);
    if threads.is_some() {
        options.threads = threads;
    }
    if sequential {
        options.parallel = false;
    }
    let engine = TransformEngine::from_config(&config, &entities, &plugins)
        .context("validating transforms")?
        .with_options(options);

    let cancel = CancelToken::new();
    let report = match dimension {
        Some(name) => match engine.run_dimension(name, &cancel) {
            Some(report) => report,
            None => bail!("dimension '{}' is not configured", name),
        },
        None => engine.run_with(&cancel),
    };

    let files = report
        .outputs
        .write_dir(out)
        .with_context(|| format!("writing outputs to {}", out.display()))?;
    info!(files, groups = report.groups_processed, "outputs written");
    print_summary(&report);
    Ok(())
}

fn print_summary(report: &RunReport) {
    println!(
        "{} groups processed, {} failures{}",
        report.groups_processed,
        report.failures.len(),
        if report.cancelled { " (cancelled)" } else { "" }
    );
    for failure in &report.failures {
        println!(
            "  [{}] {} / {} / {}: {}",
            failure.kind,
            failure.dimension,
            failure.group_id.as_deref().unwrap_or("-"),
            failure.widget.as_deref().unwrap_or("-"),
            failure.message
        );
    }
    if let Ok(json) = serde_json::to_string(&report.failures) {
        tracing::debug!(failures = %json, "failure records");
    }
}
