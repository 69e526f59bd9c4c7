//! obscan: detect order blocks in an OHLCV JSON file.
//!
//! Loads daily bars, optionally resamples them, runs the detector and prints
//! the resulting order blocks as a text table or JSON.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use ob_core::{format_date, Bias, DetectorConfig, OrderBlock, Scope};
use ob_detector::OrderBlockDetector;
use ob_ingestion::{load_bars, Timeframe};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "obscan", about = "Detect order blocks in OHLCV data")]
struct Cli {
    /// JSON file with date/open/high/low/close/volume records.
    data_file: PathBuf,

    /// Bar timeframe: 1D, 1W or 1M.
    #[arg(long, default_value = "1D")]
    timeframe: String,

    /// Swing structure lookback (overrides the config file).
    #[arg(long)]
    swing_length: Option<usize>,

    /// Internal structure lookback (overrides the config file).
    #[arg(long)]
    internal_length: Option<usize>,

    /// ATR window (overrides the config file).
    #[arg(long)]
    atr_period: Option<usize>,

    /// Cap on active blocks per scope (overrides the config file).
    #[arg(long)]
    max_active: Option<usize>,

    /// JSON detector config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only show blocks of this bias.
    #[arg(long, value_enum)]
    bias: Option<BiasArg>,

    /// Only show blocks that are still active.
    #[arg(long, default_value_t = false)]
    active_only: bool,

    /// Hide internal blocks.
    #[arg(long, default_value_t = false)]
    hide_internal: bool,

    /// Hide swing blocks.
    #[arg(long, default_value_t = false)]
    hide_swing: bool,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum BiasArg {
    Bull,
    Bear,
}

impl From<BiasArg> for Bias {
    fn from(arg: BiasArg) -> Self {
        match arg {
            BiasArg::Bull => Bias::Bullish,
            BiasArg::Bear => Bias::Bearish,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Which blocks to print.
#[derive(Debug, Clone, Default)]
struct BlockFilter {
    bias: Option<Bias>,
    active_only: bool,
    show_internal: bool,
    show_swing: bool,
}

impl BlockFilter {
    fn from_cli(cli: &Cli) -> Self {
        Self {
            bias: cli.bias.map(Bias::from),
            active_only: cli.active_only,
            show_internal: !cli.hide_internal,
            show_swing: !cli.hide_swing,
        }
    }

    fn accepts(&self, block: &OrderBlock) -> bool {
        let scope_shown = match block.scope() {
            Scope::Internal => self.show_internal,
            Scope::Swing => self.show_swing,
        };
        scope_shown && self.bias.map_or(true, |bias| block.bias == bias)
    }

    /// Blocks to report, in detection order. Active-only selects the current
    /// contents of the active containers.
    fn select<'a>(&self, detector: &'a OrderBlockDetector) -> Vec<&'a OrderBlock> {
        let mut blocks: Vec<&OrderBlock> = if self.active_only {
            detector.active_order_blocks_all()
        } else {
            detector.order_blocks().iter().collect()
        };
        blocks.retain(|b| self.accepts(b));
        blocks.sort_by_key(|b| (b.created_index, !b.internal));
        blocks
    }
}

#[derive(Serialize)]
struct Report<'a> {
    data_file: String,
    timeframe: String,
    bars: usize,
    config: &'a DetectorConfig,
    order_blocks: Vec<&'a OrderBlock>,
}

fn build_config(cli: &Cli) -> Result<DetectorConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str::<DetectorConfig>(&json)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => DetectorConfig::default(),
    };

    if let Some(n) = cli.swing_length {
        config.swing_length = n;
    }
    if let Some(n) = cli.internal_length {
        config.internal_length = n;
    }
    if let Some(n) = cli.atr_period {
        config.atr_period = n;
    }
    if let Some(n) = cli.max_active {
        config.max_active_order_blocks = n;
    }

    config.validate()?;
    Ok(config)
}

fn print_text(blocks: &[&OrderBlock]) {
    if blocks.is_empty() {
        println!("No order blocks found.");
        return;
    }

    println!(
        "{:<18} {:>10} {:>10} {:>12} {:>12} {:>12}  {}",
        "label", "origin", "created", "high", "low", "pivot", "status"
    );
    for block in blocks {
        let status = match block.mitigated_time {
            Some(ts) => format!("mitigated {}", format_date(ts)),
            None if block.mitigated => "mitigated".to_string(),
            None => "active".to_string(),
        };
        println!(
            "{:<18} {:>10} {:>10} {:>12.4} {:>12.4} {:>12}  {}",
            block.label(),
            format_date(block.start_time),
            format_date(block.created_time),
            block.high,
            block.low,
            format_date(block.pivot_time),
            status
        );
    }
}

fn main() -> Result<()> {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    let cli = Cli::parse();
    if cli.hide_internal && cli.hide_swing {
        bail!("--hide-internal and --hide-swing together hide every block");
    }

    let timeframe: Timeframe = cli.timeframe.parse()?;
    let config = build_config(&cli)?;

    let bars = load_bars(&cli.data_file, timeframe)
        .with_context(|| format!("loading {}", cli.data_file.display()))?;

    let mut detector = OrderBlockDetector::new(config)?;
    detector.process(&bars).context("running detector")?;
    info!(
        bars = detector.bar_count(),
        order_blocks = detector.order_blocks().len(),
        "detection complete"
    );

    let blocks = BlockFilter::from_cli(&cli).select(&detector);

    match cli.format {
        OutputFormat::Text => print_text(&blocks),
        OutputFormat::Json => {
            let report = Report {
                data_file: cli.data_file.display().to_string(),
                timeframe: timeframe.to_string(),
                bars: detector.bar_count(),
                config: detector.config(),
                order_blocks: blocks,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
