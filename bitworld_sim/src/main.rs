//! bitworld simulator CLI
//!
//! Run single simulations or whole parameter grids.

use anyhow::{bail, Context, Result};
use bitworld_core::{
    DeterministicRule, ExhaustionPolicy, ProductionModel, SimulationConfig, SimulationRunner,
};
use bitworld_sim::scenarios::ScenarioId;
use bitworld_sim::{run_batch, BatchSettings, BatchSummary, CsvExporter, RunSink, RunSummary, RunTask};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

/// bitworld: co-evolution of technological systems and search spaces
#[derive(Parser, Debug)]
#[command(name = "bitworld-sim")]
#[command(about = "Run bitworld simulations", long_about = None)]
struct Cli {
    /// Verbose output (per-generation logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a single simulation
    Run(RunArgs),

    /// Run a grid of simulations on a worker pool
    Batch(BatchArgs),

    /// List the counterfactual scenarios
    Scenarios,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Run seed (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Chance that a tech edit is deterministic
    #[arg(long, default_value = "0.5")]
    eta: f64,

    /// Chance that a search space edit is deterministic
    #[arg(long, default_value = "0.5")]
    lambda: f64,

    /// Initial tech length
    #[arg(long, default_value = "2")]
    t_length: usize,

    /// Probability of a 1 in the initial tech (default 0.5)
    #[arg(long)]
    t_prob: Option<f64>,

    /// Initial search space length
    #[arg(long, default_value = "2")]
    s_length: usize,

    /// Probability of a 1 in the initial search space (default 0.5)
    #[arg(long)]
    s_prob: Option<f64>,

    /// Initial resource endowment
    #[arg(long, default_value = "100")]
    endowment: f64,

    /// Chance that an edit slot goes to the tech rather than the search space
    #[arg(long, default_value = "0.5")]
    tradeoff: f64,

    /// Generation cap
    #[arg(short, long, default_value = "10000")]
    generations: u64,

    /// Tech complexity limit
    #[arg(short, long, default_value = "10000")]
    limit: usize,

    /// Budget per unit of effectiveness
    #[arg(long, default_value = "10")]
    base_rate: f64,

    /// Minimum budget per generation
    #[arg(long, default_value = "1")]
    baseline: f64,

    /// Cost of one edit
    #[arg(long, default_value = "1")]
    edit_cost: f64,

    /// Produce resources as |S|·e − |T|·(1 − e) instead of base_rate·e
    #[arg(long)]
    net_yield: bool,

    /// Deterministic edits are random edits kept only if they improve
    #[arg(long)]
    hillclimb: bool,

    /// Stop the run once the store can no longer pay for an edit
    #[arg(long)]
    halt_on_exhaustion: bool,

    /// Counterfactual scenario (overrides --endowment)
    #[arg(long)]
    scenario: Option<String>,

    /// Directory to write the run's CSV into
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the outcome as JSON
    #[arg(long)]
    json: bool,
}

impl RunArgs {
    fn config(&self, seed: u64) -> SimulationConfig {
        SimulationConfig::new(seed)
            .with_rates(self.eta, self.lambda)
            .with_tech(self.t_length, self.t_prob)
            .with_space(self.s_length, self.s_prob)
            .with_endowment(self.endowment)
            .with_tradeoff(self.tradeoff)
            .with_generations(self.generations)
            .with_limit(self.limit)
            .with_ledger(self.base_rate, self.baseline, self.edit_cost)
            .with_production(if self.net_yield {
                ProductionModel::NetYield
            } else {
                ProductionModel::Linear
            })
            .with_deterministic_rule(if self.hillclimb {
                DeterministicRule::Hillclimb
            } else {
                DeterministicRule::Greedy
            })
            .with_exhaustion(if self.halt_on_exhaustion {
                ExhaustionPolicy::Halt
            } else {
                ExhaustionPolicy::Continue
            })
    }
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// TOML batch settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seeds per grid cell
    #[arg(long)]
    samples: Option<usize>,

    /// Worker threads (0 = one per core)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Output directory for per-run CSVs
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Counterfactual scenario, repeatable
    #[arg(long = "scenario")]
    scenarios: Vec<String>,

    /// Write a JSON summary of the batch
    #[arg(long)]
    summary: Option<PathBuf>,
}

fn time_seed() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(1, |d| d.as_nanos() as u64)
}

fn run_single(args: RunArgs) -> Result<()> {
    let seed = if args.seed == 0 { time_seed() } else { args.seed };
    let mut config = args.config(seed);

    let scenario = args
        .scenario
        .as_deref()
        .map(str::parse::<ScenarioId>)
        .transpose()?;
    if let Some(s) = scenario {
        config = config.with_endowment(s.initial_resource());
    }

    let runner = SimulationRunner::new(config.clone()).context("invalid run configuration")?;
    let outcome = runner.run();
    let task = RunTask {
        index: 0,
        config,
        scenario,
    };

    let output = match &args.output {
        Some(dir) => CsvExporter::new(dir)?.commit(&task, &outcome)?,
        None => None,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    let summary = RunSummary::new(&task, &outcome, output);
    info!(
        "✓ seed={} {} at generation {} | tech={} space={} effectiveness={:.3} store={:.2}",
        summary.seed,
        summary.status,
        summary.generations,
        summary.tech_complexity,
        summary.space_complexity,
        summary.effectiveness,
        summary.resource_store
    );
    if let Some(path) = &summary.output {
        info!("Wrote {}", path.display());
    }
    Ok(())
}

fn run_grid(args: BatchArgs) -> Result<()> {
    let mut settings = match &args.config {
        Some(path) => BatchSettings::load(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => BatchSettings::default(),
    };
    if let Some(samples) = args.samples {
        settings.samples = samples;
    }
    if let Some(workers) = args.workers {
        settings.workers = workers;
    }
    if let Some(output) = args.output {
        settings.output_dir = output;
    }
    if !args.scenarios.is_empty() {
        settings.scenarios = args
            .scenarios
            .iter()
            .map(|s| s.parse::<ScenarioId>())
            .collect::<Result<_, _>>()?;
    }

    let grid = settings.grid();
    if grid.is_empty() {
        bail!("the parameter grid is empty");
    }
    info!("Batch: {} runs into {}", grid.len(), settings.output_dir.display());

    let sink = Arc::new(CsvExporter::new(&settings.output_dir)?);
    let reports = run_batch(grid.tasks(), &settings.pool_config(), sink)?;

    let mut summary = BatchSummary::default();
    for report in &reports {
        match &report.result {
            Ok(run) => summary.add_run(run.clone()),
            Err(e) => {
                error!("✗ task {} (seed={}) failed: {}", report.task.index, report.task.config.seed, e);
                summary.add_failure(&report.task, e);
            }
        }
    }

    if let Some(path) = &args.summary {
        summary.write_to_file(path)?;
        info!("Summary written to {}", path.display());
    }

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    if summary.failed == 0 {
        info!("✅ All {} runs completed", summary.total);
        Ok(())
    } else {
        bail!("{}/{} runs failed", summary.failed, summary.total)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Command::Run(args) => run_single(args),
        Command::Batch(args) => run_grid(args),
        Command::Scenarios => {
            for scenario in ScenarioId::all() {
                println!(
                    "{:<10} endowment={:<6} {}",
                    scenario.name(),
                    scenario.initial_resource(),
                    scenario.description()
                );
            }
            Ok(())
        }
    }
}
