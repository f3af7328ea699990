//! ρ-eval CLI
//!
//! # Commands
//!
//! - `rho eval` - Measure holdout accuracy under attack over an epsilon schedule
//! - `rho datasets` - List built-in datasets and their default schedules
//! - `rho models` - List registered classifiers and attacks
//! - `rho show <report>` - Print a saved report

mod config;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use config::RunConfig;
use rho_core::{Norm, RobustnessReport};
use rho_data::{prepare, BuiltinProvider, Dataset, DatasetFile, DatasetProvider, SetupConfig};
use rho_eval::{Evaluator, RunContext, TrainingRegime};
use rho_models::{build_classifier, AttackParams, ModelParams, RegisteredAttack, ATTACKS, MODELS};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "rho")]
#[command(about = "Adversarial robustness evaluation over epsilon schedules")]
#[command(version)]
struct Cli {
    /// Debug-level logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a classifier against an attack over an epsilon schedule
    Eval(EvalArgs),
    /// List built-in datasets
    Datasets,
    /// List registered classifiers and attacks
    Models,
    /// Print a saved robustness report
    Show {
        /// Report file written by `rho eval --output`
        report: PathBuf,
    },
}

#[derive(Args, Debug, Default)]
struct EvalArgs {
    /// JSON run configuration; flags below override its fields
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Built-in dataset name or path to a JSON dataset file
    #[arg(long)]
    dataset: Option<String>,
    /// Sample count for built-in datasets
    #[arg(long)]
    samples: Option<usize>,
    /// Registered classifier name
    #[arg(long)]
    model: Option<String>,
    /// Registered attack name
    #[arg(long)]
    attack: Option<String>,
    /// Perturbation norm: 1, 2 or inf
    #[arg(long)]
    ord: Option<Norm>,
    /// Random seed
    #[arg(long)]
    seed: Option<u64>,
    /// Holdout size
    #[arg(long)]
    holdout: Option<usize>,
    /// Comma-separated epsilon schedule, replacing the dataset default
    #[arg(long, value_delimiter = ',')]
    eps: Option<Vec<f64>>,
    /// Expected training regime of the model
    #[arg(long)]
    regime: Option<TrainingRegime>,
    /// Neighbours for k-NN models
    #[arg(short, long)]
    k: Option<usize>,
    /// Restarts for random attacks
    #[arg(long)]
    restarts: Option<usize>,
    /// Score budgets serially
    #[arg(long)]
    serial: bool,
    /// Write the report to this file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Load the config file (if any) and apply flag overrides.
fn resolve_config(args: &EvalArgs) -> anyhow::Result<RunConfig> {
    let mut cfg = match &args.config {
        Some(path) => RunConfig::load(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => RunConfig::default(),
    };
    if let Some(dataset) = &args.dataset {
        cfg.dataset = dataset.clone();
    }
    if let Some(samples) = args.samples {
        cfg.samples = samples;
    }
    if let Some(model) = &args.model {
        cfg.model = model.clone();
    }
    if let Some(attack) = &args.attack {
        cfg.attack = attack.clone();
    }
    if let Some(ord) = args.ord {
        cfg.ord = ord;
    }
    if let Some(seed) = args.seed {
        cfg.random_seed = seed;
    }
    if let Some(holdout) = args.holdout {
        cfg.holdout_size = holdout;
    }
    if let Some(eps) = &args.eps {
        cfg.eps = Some(eps.clone());
    }
    if let Some(regime) = args.regime {
        cfg.regime = Some(regime);
    }
    if let Some(k) = args.k {
        cfg.k = k;
    }
    if let Some(restarts) = args.restarts {
        cfg.restarts = restarts;
    }
    if args.serial {
        cfg.eval.parallel = false;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn load_dataset(cfg: &RunConfig) -> anyhow::Result<Dataset> {
    if cfg.dataset_is_file() {
        let path = Path::new(&cfg.dataset);
        DatasetFile::load(path)
            .with_context(|| format!("Failed to load dataset file {}", path.display()))
    } else {
        Ok(BuiltinProvider::new(cfg.samples, cfg.random_seed).load(&cfg.dataset)?)
    }
}

/// Run one evaluation end to end.
fn run_eval(cfg: &RunConfig) -> anyhow::Result<RobustnessReport> {
    let dataset = load_dataset(cfg)?;
    let prepared = prepare(
        &dataset,
        &SetupConfig {
            seed: cfg.random_seed,
            holdout_size: cfg.holdout_size,
        },
    )?;
    let schedule = cfg.schedule(&prepared.schedule)?;

    let mut model = build_classifier(
        &cfg.model,
        &ModelParams {
            k: cfg.k,
            metric: cfg.ord,
            regime: cfg.regime,
        },
    )?;
    let attack = RegisteredAttack::new(
        &cfg.attack,
        &AttackParams {
            metric: cfg.ord,
            seed: cfg.random_seed,
            restarts: cfg.restarts,
        },
    )?;

    info!(
        dataset = %dataset.name,
        model = %cfg.model,
        attack = %cfg.attack,
        regime = %model.regime(),
        metric = %cfg.ord,
        budgets = schedule.len(),
        "Starting evaluation"
    );
    let ctx = RunContext::new(cfg.random_seed, cfg.ord, schedule).with_config(cfg.eval.clone());
    let report = Evaluator::new(ctx).evaluate(&mut model, &attack, &prepared.split)?;
    Ok(report)
}

fn eval_command(args: &EvalArgs) -> anyhow::Result<()> {
    let cfg = resolve_config(args)?;
    let report = run_eval(&cfg)?;
    if let Some(path) = &args.output {
        report
            .save(path)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        info!(path = %path.display(), "Report saved");
    }
    let out = json!({ "config": cfg, "report": report });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn datasets_command() -> anyhow::Result<()> {
    let provider = BuiltinProvider::default();
    let mut entries = Vec::new();
    for name in provider.available() {
        let dataset = provider.load(&name)?;
        entries.push(json!({
            "name": name,
            "features": dataset.n_features(),
            "eps_list": dataset.default_schedule,
        }));
    }
    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}

fn models_command() -> anyhow::Result<()> {
    let out = json!({ "models": MODELS, "attacks": ATTACKS });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn show_command(path: &Path) -> anyhow::Result<()> {
    let report = RobustnessReport::load(path)
        .with_context(|| format!("Failed to read report {}", path.display()))?;
    println!("{}", report.to_json_pretty()?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Eval(args) => eval_command(&args)?,
        Commands::Datasets => datasets_command()?,
        Commands::Models => models_command()?,
        Commands::Show { report } => show_command(&report)?,
    }
    Ok(())
}
