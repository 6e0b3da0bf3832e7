//! FXLab CLI — backtest, label, and service commands.
//!
//! Commands:
//! - `backtest` — run the full pipeline over three CSV timeframes
//! - `label` — build the walk-forward training dataset as JSONL
//! - `service` — loop the live signal pass at a fixed interval

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use fxlab_core::backtest::FillPolicy;
use fxlab_core::domain::Timeframe;
use fxlab_core::features::{build_feature_rows, ProbabilityModel};
use fxlab_core::labeler::{label_candidates, LabelConfig};
use fxlab_core::strategy::{generate_candidates, GeneratorInputs, GeneratorMode};
use fxlab_runner::{
    export_trades_csv, load_bars_csv, load_pipeline_config, run_once, BacktestPipeline,
    ConstantModel, CsvBarSource, LinearModel, PipelineConfig, ServiceConfig, ServiceStatus,
    SignalMode,
};

#[derive(Parser)]
#[command(name = "fxlab", about = "FXLab CLI — session-aware FX signal engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum FillPolicyArg {
    SlFirst,
    TpFirst,
    OhlcPath,
}

impl From<FillPolicyArg> for FillPolicy {
    fn from(arg: FillPolicyArg) -> Self {
        match arg {
            FillPolicyArg::SlFirst => FillPolicy::SlFirst,
            FillPolicyArg::TpFirst => FillPolicy::TpFirst,
            FillPolicyArg::OhlcPath => FillPolicy::OhlcPath,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Live,
    Paper,
    Visual,
}

impl From<ModeArg> for SignalMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Live => SignalMode::Live,
            ModeArg::Paper => SignalMode::Paper,
            ModeArg::Visual => SignalMode::Visual,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full backtest pipeline over three CSV timeframes.
    Backtest {
        #[arg(long)]
        h4: PathBuf,

        #[arg(long)]
        h1: PathBuf,

        #[arg(long)]
        m15: PathBuf,

        /// Pipeline TOML config; compiled defaults when absent.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Logistic model artifact (JSON weights + bias). Without it a
        /// constant 0.5 stands in and quality rides on confluence alone.
        #[arg(long)]
        model: Option<PathBuf>,

        /// Override the simulated spread.
        #[arg(long)]
        spread_pips: Option<f64>,

        /// Override the same-bar double-touch tie-break.
        #[arg(long, value_enum)]
        fill_policy: Option<FillPolicyArg>,

        /// Override the holding window.
        #[arg(long)]
        max_hold_bars: Option<usize>,

        /// Override the probability floor.
        #[arg(long)]
        min_prob: Option<f64>,

        /// Also export the trade tape as CSV.
        #[arg(long)]
        out_trades: Option<PathBuf>,
    },
    /// Build the walk-forward training dataset (JSONL: features + label).
    Label {
        #[arg(long)]
        h4: PathBuf,

        #[arg(long)]
        h1: PathBuf,

        #[arg(long)]
        m15: PathBuf,

        /// Output JSONL path.
        #[arg(long)]
        out: PathBuf,

        /// Forward-walk window in M15 bars.
        #[arg(long, default_value_t = 48)]
        max_lookahead_bars: usize,
    },
    /// Loop the live signal pass at a fixed interval.
    Service {
        #[arg(long)]
        h4: PathBuf,

        #[arg(long)]
        h1: PathBuf,

        #[arg(long)]
        m15: PathBuf,

        #[arg(long)]
        model: Option<PathBuf>,

        #[arg(long, default_value = "signals")]
        out_dir: PathBuf,

        #[arg(long, default_value = "service_state.json")]
        state_file: PathBuf,

        #[arg(long, default_value = "service_status.json")]
        status_file: PathBuf,

        #[arg(long, default_value_t = 60)]
        interval_seconds: u64,

        #[arg(long, default_value_t = 0.60)]
        min_prob: f64,

        #[arg(long, value_enum, default_value = "paper")]
        mode: ModeArg,
    },
}

fn load_model(path: Option<&PathBuf>) -> Result<Box<dyn ProbabilityModel + Sync>> {
    match path {
        Some(p) => {
            let model = LinearModel::load(p)
                .with_context(|| format!("loading model {}", p.display()))?;
            Ok(Box::new(model))
        }
        None => Ok(Box::new(ConstantModel(0.5))),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_backtest(
    h4: &PathBuf,
    h1: &PathBuf,
    m15: &PathBuf,
    config: Option<&PathBuf>,
    model: Option<&PathBuf>,
    spread_pips: Option<f64>,
    fill_policy: Option<FillPolicyArg>,
    max_hold_bars: Option<usize>,
    min_prob: Option<f64>,
    out_trades: Option<&PathBuf>,
) -> Result<()> {
    let mut cfg = match config {
        Some(p) => load_pipeline_config(p)?,
        None => PipelineConfig::default(),
    };
    if let Some(s) = spread_pips {
        if s < 0.0 {
            bail!("--spread-pips must be non-negative");
        }
        cfg.backtest.spread_pips = s;
    }
    if let Some(p) = fill_policy {
        cfg.backtest.fill_policy = p.into();
    }
    if let Some(n) = max_hold_bars {
        cfg.backtest.max_hold_bars = n;
    }
    if let Some(p) = min_prob {
        cfg.min_probability = p;
    }

    let model = load_model(model)?;
    let pipeline = BacktestPipeline::new(cfg, model.as_ref());
    let report = pipeline.run_from_csv(h4, h1, m15)?;

    if let Some(path) = out_trades {
        export_trades_csv(&report.trades, path)?;
    }

    println!("{}", serde_json::to_string_pretty(&report.summary)?);
    println!(
        "candidates={} tradeable={} fingerprint={}",
        report.candidates, report.tradeable, report.fingerprint
    );
    Ok(())
}

fn cmd_label(
    h4: &PathBuf,
    h1: &PathBuf,
    m15: &PathBuf,
    out: &PathBuf,
    max_lookahead_bars: usize,
) -> Result<()> {
    let cfg = PipelineConfig::default().trading;
    let inputs = GeneratorInputs {
        h4: load_bars_csv(h4, Timeframe::H4)?,
        h1: load_bars_csv(h1, Timeframe::H1)?,
        m15: load_bars_csv(m15, Timeframe::M15)?,
    };

    let candidates = generate_candidates(&inputs, &cfg, GeneratorMode::default());
    let rows = build_feature_rows(&cfg, &inputs.h4, &inputs.h1, &inputs.m15, &candidates);
    let label_cfg = LabelConfig {
        max_lookahead_bars,
        ..LabelConfig::default()
    };
    let result = label_candidates(&cfg, &inputs.m15, &candidates, &label_cfg);

    // Inner join of feature rows and labels on signal time.
    let features_by_time: std::collections::BTreeMap<_, _> =
        rows.iter().map(|r| (r.time, r)).collect();
    let mut lines = Vec::new();
    for lt in &result.labeled {
        let Some(row) = features_by_time.get(&lt.candidate.time) else {
            continue;
        };
        lines.push(serde_json::to_string(&serde_json::json!({
            "time": lt.candidate.time,
            "features": row.features,
            "label": lt.label,
            "mfe_pips": lt.mfe_pips,
            "mae_pips": lt.mae_pips,
            "minutes_to_outcome": lt.minutes_to_outcome,
        }))?);
    }

    std::fs::write(out, lines.join("\n") + "\n")
        .with_context(|| format!("writing dataset to {}", out.display()))?;
    tracing::info!(
        candidates = candidates.len(),
        labeled = result.labeled.len(),
        dropped = result.dropped,
        rows = lines.len(),
        path = %out.display(),
        "wrote training dataset"
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_service(
    h4: PathBuf,
    h1: PathBuf,
    m15: PathBuf,
    model: Option<&PathBuf>,
    out_dir: PathBuf,
    state_file: PathBuf,
    status_file: PathBuf,
    interval_seconds: u64,
    min_prob: f64,
    mode: ModeArg,
) -> Result<()> {
    let cfg = ServiceConfig {
        min_probability: min_prob,
        mode: mode.into(),
        out_dir,
        state_file,
        ..ServiceConfig::default()
    };
    let source = CsvBarSource { h4, h1, m15 };
    let model = load_model(model)?;
    let interval = std::time::Duration::from_secs(interval_seconds.max(1));

    loop {
        let now = chrono::Utc::now();
        let status = match run_once(&cfg, &source, model.as_ref(), now) {
            Ok(status) => status,
            Err(e) => {
                tracing::error!(error = %e, "service pass failed");
                ServiceStatus {
                    time_utc: now,
                    session_state: fxlab_core::session::SessionState::Blocked,
                    candidates: 0,
                    wrote_signal: false,
                    last_signal_id: None,
                    signals_today: 0,
                    spread_pips: None,
                    last_error: Some(e.to_string()),
                }
            }
        };
        if let Err(e) = status.write(&status_file) {
            tracing::error!(error = %e, "failed to write status file");
        }
        std::thread::sleep(interval);
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Backtest {
            h4,
            h1,
            m15,
            config,
            model,
            spread_pips,
            fill_policy,
            max_hold_bars,
            min_prob,
            out_trades,
        } => cmd_backtest(
            &h4,
            &h1,
            &m15,
            config.as_ref(),
            model.as_ref(),
            spread_pips,
            fill_policy,
            max_hold_bars,
            min_prob,
            out_trades.as_ref(),
        ),
        Commands::Label {
            h4,
            h1,
            m15,
            out,
            max_lookahead_bars,
        } => cmd_label(&h4, &h1, &m15, &out, max_lookahead_bars),
        Commands::Service {
            h4,
            h1,
            m15,
            model,
            out_dir,
            state_file,
            status_file,
            interval_seconds,
            min_prob,
            mode,
        } => cmd_service(
            h4,
            h1,
            m15,
            model.as_ref(),
            out_dir,
            state_file,
            status_file,
            interval_seconds,
            min_prob,
            mode,
        ),
    }
}
