//! preptime - prep-time prediction CLI.
//!
//! ```bash
//! # Write the synthetic training set
//! preptime synthesize --out data/vendor_orders.csv
//!
//! # Persist the bootstrap model as an artifact
//! preptime bootstrap --out model.json
//!
//! # Score one request against PREPTIME_MODEL_PATH (bootstraps if absent)
//! preptime predict '{"vendor_id":12345,"order_hour":19,"day_of_week":4,"item_count":3,"is_peak_hour":true,"historical_delay_avg":5.2}'
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use preptime::common::{log, AppCfg};
use preptime::data::{self, SynthConfig};
use preptime::training::{repo_fs, service as lifecycle};
use preptime::PredictionService;

#[derive(Parser, Debug)]
#[command(name = "preptime")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Optional JSON config file; environment variables override it
    #[arg(long, global = true, env = "PREPTIME_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate the synthetic labelled order dataset
    Synthesize(SynthesizeCommand),

    /// Train the bootstrap model and save it as an artifact
    Bootstrap(BootstrapCommand),

    /// Score a single request and print the response
    Predict(PredictCommand),
}

#[derive(Args, Debug)]
struct SynthesizeCommand {
    /// Output CSV path
    #[arg(long, default_value = "data/vendor_orders.csv")]
    out: PathBuf,

    #[arg(long, default_value_t = 10_000)]
    orders: usize,

    #[arg(long, default_value_t = 200)]
    vendors: u64,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(Args, Debug)]
struct BootstrapCommand {
    /// Artifact path; defaults to the configured model path
    #[arg(long)]
    out: Option<PathBuf>,

    /// Overrides the configured bootstrap seed
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args, Debug)]
struct PredictCommand {
    /// Request body as JSON
    request: String,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let cfg = match &cli.config {
        Some(path) => AppCfg::load_with_file(path),
        None => AppCfg::load(),
    }
    .context("loading configuration")?;
    log::init(&cfg.log_filter);

    match cli.command {
        Commands::Synthesize(cmd) => {
            let synth = SynthConfig {
                n_orders: cmd.orders,
                n_vendors: cmd.vendors,
                seed: cmd.seed,
                ..SynthConfig::default()
            };
            let summary = data::synthesize(&synth, &cmd.out)
                .with_context(|| format!("writing {}", cmd.out.display()))?;
            println!(
                "Generated {} orders across {} vendors (mean prep time {:.2} min)",
                summary.rows, summary.vendors_seen, summary.mean_prep_time
            );
            println!("Saved to: {}", cmd.out.display());
        }
        Commands::Bootstrap(cmd) => {
            let out = cmd.out.unwrap_or_else(|| cfg.model_path.clone());
            let seed = cmd.seed.unwrap_or(cfg.bootstrap_seed);
            let model = lifecycle::train_bootstrap(seed).context("training bootstrap model")?;
            let fingerprint = repo_fs::save_model(&out, &model)
                .with_context(|| format!("saving {}", out.display()))?;
            println!("Saved bootstrap model {fingerprint} to {}", out.display());
        }
        Commands::Predict(cmd) => {
            let service = PredictionService::from_cfg(&cfg);
            service.warm_up().context("model failed to load")?;
            let path = service.engine().cell().model_path();
            info!(path = %path.display(), "model ready");

            let resp = service.handle_predict(&cmd.request);
            println!("{}", resp.status);
            println!("{}", serde_json::to_string_pretty(&resp.body)?);
            if !resp.is_success() {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
