mod cli;
mod core;
mod engine;
mod steps;
mod store;

use anyhow::{Context, Result};
use cli::commands::{RunCommand, ValidateCommand};
use cli::{Cli, Command};
use console::{style, Emoji};
use engine::PipelineEngine;
use std::sync::Arc;
use steps::{Services, StepRegistry};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    init_logging(&cli)?;

    match &cli.command {
        Command::Run(cmd) => run_schedule(cmd).await?,
        Command::Validate(cmd) => validate_schedule(cmd)?,
    }

    Ok(())
}

fn init_logging(cli: &Cli) -> Result<()> {
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let builder = FmtSubscriber::builder().with_max_level(log_level);

    match &cli.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path))?;
            let subscriber = builder.with_ansi(false).with_writer(Arc::new(file)).finish();
            tracing::subscriber::set_global_default(subscriber)
                .context("Failed to set logging subscriber")?;
        }
        None => {
            let subscriber = builder.finish();
            tracing::subscriber::set_global_default(subscriber)
                .context("Failed to set logging subscriber")?;
        }
    }

    Ok(())
}

async fn run_schedule(cmd: &RunCommand) -> Result<()> {
    // Config-parse failure is fatal before any step runs
    let config = crate::core::ScheduleConfig::from_file(&cmd.schedule)
        .context("Failed to load schedule config")?;

    println!("{} Loaded schedule: {}", INFO, style(&config.name).bold());

    let store = open_store(cmd).await?;
    let services = Services::new(store);
    let registry = StepRegistry::with_builtin_steps();
    let engine = PipelineEngine::new(registry, services);

    println!();
    // Watermark-resolution failure aborts here; step failures do not
    let record = engine
        .run(&config, cmd.first_run)
        .await
        .context("Schedule run aborted")?;

    println!(
        "\n{} {} finalized {} ({} steps, watermark {})",
        CHECK,
        style(&config.name).bold(),
        style(format!("run {}", &record.run_id.to_string()[..8])).dim(),
        record.total_steps,
        record.watermark,
    );

    Ok(())
}

#[cfg(feature = "sqlite")]
async fn open_store(cmd: &RunCommand) -> Result<Arc<dyn store::StateStore>> {
    let store = match &cmd.database {
        Some(path) => store::SqliteStateStore::new(path).await?,
        None => store::SqliteStateStore::with_default_path().await?,
    };
    Ok(Arc::new(store))
}

#[cfg(not(feature = "sqlite"))]
async fn open_store(_cmd: &RunCommand) -> Result<Arc<dyn store::StateStore>> {
    Ok(Arc::new(store::MemoryStateStore::new()))
}

fn validate_schedule(cmd: &ValidateCommand) -> Result<()> {
    println!("{} Validating schedule...", INFO);

    let config = match crate::core::ScheduleConfig::from_file(&cmd.schedule) {
        Ok(config) => config,
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(e).red());
            anyhow::bail!("schedule validation failed");
        }
    };

    println!("  Name: {}", style(&config.name).bold());
    println!("  Steps: {}", style(config.steps.len()).cyan());

    let registry = StepRegistry::with_builtin_steps();
    let mut unknown_kinds = Vec::new();
    for step in &config.steps {
        let known = if registry.knows(&step.kind) {
            style("registered").green()
        } else {
            unknown_kinds.push(step.kind.clone());
            style("unknown kind").red()
        };
        println!("    {}. {} ({})", step.ordinal, style(&step.kind).bold(), known);
    }

    // an unresolvable kind makes the schedule unrunnable, same as load_steps
    if !unknown_kinds.is_empty() {
        println!("{} Validation failed:", CROSS);
        println!(
            "  {}",
            style(format!("unknown step kinds: {}", unknown_kinds.join(", "))).red()
        );
        anyhow::bail!("schedule validation failed");
    }

    println!("{} Schedule configuration is valid!", CHECK);

    if cmd.json {
        let json = serde_json::to_string_pretty(&config)?;
        println!("\n{}", json);
    }
    Ok(())
}
