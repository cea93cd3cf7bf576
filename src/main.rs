// Tue Jan 13 2026 - Alex

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use zonal_batch::{
    config::Config,
    features::{FeatureSource, MemoryFeatureSource},
    orchestrator::{FailurePolicy, RunConfig, RunController, RunObserver},
    stats::{plugins, MemorySampler, StatRegistry},
    ui::{self, ProgressManager},
    utils::{format_duration, logging, pluralize, LoggingUtils},
};

#[derive(Parser, Debug)]
#[command(name = "zonal-batch")]
#[command(author = "Alex")]
#[command(version = "1.0.0")]
#[command(about = "Batched zonal statistics over polygon features", long_about = None)]
struct Args {
    /// Feature collection (JSON)
    #[arg(long)]
    features: PathBuf,

    /// Precomputed raster samples (JSON)
    #[arg(long)]
    samples: PathBuf,

    /// Raster reference; repeat for several rasters
    #[arg(short, long = "raster", required = true)]
    rasters: Vec<String>,

    #[arg(short, long)]
    weights: Option<String>,

    #[arg(long)]
    id_field: Option<String>,

    #[arg(short, long, default_value = "1")]
    jobs: usize,

    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, value_delimiter = ',')]
    aggregates: Vec<String>,

    #[arg(long, value_delimiter = ',')]
    arrays: Vec<String>,

    /// Named custom statistics (range, cv, max_coverage)
    #[arg(long, value_delimiter = ',')]
    custom: Vec<String>,

    #[arg(long, default_value = "")]
    prefix: String,

    #[arg(long)]
    threads: Option<usize>,

    #[arg(long)]
    config: Option<PathBuf>,

    /// Merge whatever batches finished instead of failing the run
    #[arg(long)]
    allow_partial: bool,

    /// Repeat for more detail
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// error, warn, info, debug or trace; overrides -v
    #[arg(long)]
    log_level: Option<String>,

    /// Append log lines to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[arg(long)]
    no_progress: bool,
}

fn main() {
    let args = Args::parse();

    if let Err(err) = run(args) {
        ui::print_error(&format!("{:#}", err));
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let start_time = Instant::now();
    let config = load_config(&args)?;
    let level = match &args.log_level {
        Some(level) => LoggingUtils::level_from_str(level),
        None => config.log_level(usize::from(args.verbose)),
    };
    logging::init_for_run(level, args.log_file.as_deref())
        .context("Failed to open log file")?;

    let source = MemoryFeatureSource::load(&args.features)
        .with_context(|| format!("Failed to load features from {}", args.features.display()))?;
    let sampler = MemorySampler::load(&args.samples)
        .with_context(|| format!("Failed to load samples from {}", args.samples.display()))?;
    ui::print_info(&format!(
        "Loaded {} from {}",
        pluralize(source.feature_count(), "feature", "features"),
        source.name()
    ));

    let mut builder = RunConfig::builder()
        .with_rasters(args.rasters.iter().cloned())
        .with_features(Arc::new(source))
        .with_parallelism(args.jobs)
        .with_aggregates(args.aggregates.iter().cloned())
        .with_arrays(args.arrays.iter().cloned())
        .with_custom(args.custom.iter().cloned())
        .with_prefix(&args.prefix);
    if let Some(weights) = &args.weights {
        builder = builder.with_weights(weights);
    }
    if let Some(id_field) = &args.id_field {
        builder = builder.with_id_field(id_field);
    }
    if let Some(output) = &args.output {
        builder = builder.with_output(output.clone());
    }
    let run_config = builder.build();

    let show_progress = config.enable_progress_bars;
    let registry = StatRegistry::new()
        .with_plugins(&args.custom)
        .with_context(|| format!("Available custom statistics: {}", plugins::names().join(", ")))?;
    let controller = RunController::with_sampler(config, Arc::new(sampler), Arc::new(registry))?;
    let plan = controller.plan(&run_config)?;
    ui::print_info(&format!(
        "Split into {} of up to {} features",
        pluralize(plan.unit_count(), "batch", "batches"),
        plan.batch_size
    ));

    let progress = if show_progress { ProgressManager::new() } else { ProgressManager::hidden() };
    let observer: Arc<dyn RunObserver> = progress.run_observer(plan.unit_count());

    let outcome = controller.execute(&run_config, Some(observer))?;

    if !outcome.missing_units.is_empty() {
        ui::print_warning(&format!("Merged without: {}", outcome.missing_units.join(", ")));
    }
    if let Some(err) = &outcome.output_error {
        bail!("Computed {} rows but could not write output: {}", outcome.table.row_count(), err);
    }

    let (rows, cols) = outcome.table.shape();
    let written = outcome.written
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "-".to_string());
    ui::print_summary("Run summary", &[
        ("Rows", rows.to_string()),
        ("Columns", cols.to_string()),
        ("Batches completed", outcome.summary.completed.to_string()),
        ("Output", written),
        ("Elapsed", format_duration(start_time.elapsed())),
    ]);
    ui::print_success(&format!("{}", "Zonal statistics complete".green().bold()));

    Ok(())
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(threads) = args.threads {
        config = config.with_worker_threads(threads);
    }
    if args.allow_partial {
        config = config.with_failure_policy(FailurePolicy::MergeAvailable);
    }
    if args.no_progress {
        config = config.with_progress_bars(false);
    }
    if args.verbose > 0 {
        config = config.with_verbose(true);
    }

    config.validate()?;
    Ok(config)
}
