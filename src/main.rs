use anyhow::{Context, Result};
use barrierlab::config::{AppConfig, ConfigManager, TiePolicy};
use barrierlab::pipeline::{run_backtest, run_labeling, run_split};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "barrierlab", about = "Triple-barrier labeling, leakage-aware splits and long-only backtests")]
struct Cli {
    /// TOML config file; defaults plus BARRIERLAB_* overrides when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Label a price CSV with triple-barrier outcomes.
    Label {
        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        output: PathBuf,

        /// Override the configured tie policy (ambiguous, tp, sl, closest).
        #[arg(long)]
        tie_policy: Option<String>,
    },
    /// Build a cross-validation plan over a labeled CSV.
    Split {
        #[arg(long)]
        input: PathBuf,

        /// Directory to write split_plan.json into.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Simulate trades from class probabilities and write the results.
    Backtest {
        /// Test rows (ticker, timestamp, close, features).
        #[arg(long)]
        input: PathBuf,

        /// prob_sell, prob_hold, prob_buy per test row.
        #[arg(long)]
        predictions: PathBuf,

        /// Benchmark price CSV with a close column.
        #[arg(long)]
        benchmark: Option<PathBuf>,

        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_level.as_str())).init();

    let mut config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Label {
            input,
            output,
            tie_policy,
        } => {
            if let Some(policy) = tie_policy {
                config.labeling.tie_policy = policy.parse::<TiePolicy>()?;
            }
            let stats = run_labeling(&config, &input, &output)
                .with_context(|| format!("Labeling {} failed", input.display()))?;
            println!(
                "Labeled {} bars: {} buy, {} hold, {} sell",
                stats.total_count, stats.buy_count, stats.hold_count, stats.sell_count
            );
        }
        Commands::Split { input, output_dir } => {
            let plan = run_split(&config, &input, output_dir.as_deref())
                .with_context(|| format!("Splitting {} failed", input.display()))?;
            for split in plan.iter() {
                println!(
                    "fold {}: train {} rows, test {} rows ({} .. {})",
                    split.fold,
                    split.train.len(),
                    split.test.len(),
                    split.test_start_time,
                    split.test_end_time
                );
            }
        }
        Commands::Backtest {
            input,
            predictions,
            benchmark,
            output_dir,
        } => {
            let result = run_backtest(&config, &input, &predictions, benchmark.as_deref(), &output_dir)
                .with_context(|| format!("Backtest of {} failed", input.display()))?;
            let s = &result.summary;
            println!(
                "{} trades, total return {:.2}%, sharpe {:.3}, max drawdown {:.2}%",
                s.total_trades,
                s.total_return * 100.0,
                s.sharpe_ratio,
                s.max_drawdown * 100.0
            );
        }
    }

    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => ConfigManager::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ConfigManager::load_defaults().context("Failed to build default config")?,
    };
    Ok(config)
}
