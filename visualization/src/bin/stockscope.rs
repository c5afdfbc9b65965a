//! Interactive stock analyzer
//!
//! Reads `<data-dir>/<SYMBOL>.csv`, prints a summary table and writes four
//! chart pages per run to the output directory. Without `--symbol` it keeps
//! prompting for symbols until told to stop.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use stockscope::{report_json, AppConfig, CsvSeriesSource, Period, Session};
use stockscope_visualization::{ColorScheme, PageLayout, PageStyle, PngPageRenderer};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 📈 StockScope - OHLCV analytics with chart pages
#[derive(Debug, Parser)]
#[command(name = "stockscope", author, version, about)]
struct Cli {
    /// Analyze this symbol once and exit instead of prompting
    #[arg(long)]
    symbol: Option<String>,

    /// Lookback period: 1W, 1M, 3M, 6M, 1Y, 2Y, 3Y, 4Y, 5Y or MAX
    #[arg(long)]
    period: Option<String>,

    /// Directory holding <SYMBOL>.csv files
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Directory receiving the PNG pages
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Configuration file (defaults to ./stockscope.toml when present)
    #[arg(long, env = "STOCKSCOPE_CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Also print the full report as JSON (single-run mode)
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }

    init_tracing(&config.log_level);

    if let Some(token) = cli.period.as_deref() {
        config.default_period = Period::parse_or(token, config.default_period);
    }
    info!(
        data_dir = %config.data_dir.display(),
        output_dir = %config.output_dir.display(),
        period = %config.default_period,
        "starting stockscope"
    );

    let layout = PageLayout::from_config(&config.page)?;
    let style = PageStyle::with_colors(ColorScheme::from_kind(config.page.color_scheme));
    let renderer = PngPageRenderer::new(&config.output_dir, layout, style)
        .with_context(|| format!("preparing {}", config.output_dir.display()))?;
    let source = CsvSeriesSource::new(&config.data_dir);
    let mut session = Session::with_config(source, renderer, &config);

    match cli.symbol {
        Some(symbol) => {
            let mut stdout = io::stdout().lock();
            let summary = session.analyze_once(&symbol, config.default_period, &mut stdout)?;
            if cli.json {
                writeln!(stdout, "{}", report_json(&summary.report)?)?;
            }
            writeln!(
                stdout,
                "\n✅ {} pages generated for {}",
                summary.pages_rendered, summary.symbol
            )?;
            for path in session.sink().written() {
                writeln!(stdout, "   📄 {}", path.display())?;
            }
        }
        None => {
            let mut input = io::stdin().lock();
            let mut output = io::stdout().lock();
            session.run(&mut input, &mut output)?;
        }
    }

    Ok(())
}
