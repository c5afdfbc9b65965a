//! Interactive analysis loop
//!
//! [`Session`] is an explicit state machine over any `BufRead`/`Write` pair:
//!
//! ```text
//! Prompting -> Fetching -> Analyzing -> Rendering -> AskContinue -> Prompting
//!                 |            |            |             |
//!                 v            +------------+---> AskContinue
//!             Prompting                                   +-> Finished
//! ```
//!
//! End of input at any prompt finishes the session. Failures never end the
//! loop: retrieval failures re-prompt, analysis and rendering failures go to
//! the continue question.

use crate::analytics::{AnalyticsEngine, AnalyticsReport};
use crate::charts::{ChartPage, ChartPageComposer};
use crate::config::AppConfig;
use crate::errors::AnalysisError;
use crate::normalizer::SeriesNormalizer;
use crate::period::Period;
use crate::source::SeriesSource;
use crate::summary::render_summary;
use crate::types::{PriceSeries, RawTable};
use std::io::{self, BufRead, Write};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Destination of composed chart pages
pub trait ChartSink {
    type Error: std::error::Error + Send + Sync + 'static;

    fn render_page(&mut self, symbol: &str, page: &ChartPage) -> Result<(), Self::Error>;
}

/// Errors of a single non-interactive run
#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("Chart rendering failed on page {page}: {source}")]
    Render {
        page: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Console I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Where the loop currently is, with the data carried between steps
#[derive(Debug, Clone)]
pub enum SessionState {
    Prompting,
    Fetching {
        symbol: String,
        period: Period,
    },
    Analyzing {
        symbol: String,
        period: Period,
        table: RawTable,
    },
    Rendering {
        symbol: String,
        series: PriceSeries,
        report: Box<AnalyticsReport>,
    },
    AskContinue,
    Finished,
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Prompting => "prompting",
            SessionState::Fetching { .. } => "fetching",
            SessionState::Analyzing { .. } => "analyzing",
            SessionState::Rendering { .. } => "rendering",
            SessionState::AskContinue => "ask_continue",
            SessionState::Finished => "finished",
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, SessionState::Finished)
    }
}

/// Outcome of one completed analysis pass
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub symbol: String,
    pub period: Period,
    pub pages_rendered: usize,
    pub report: AnalyticsReport,
}

pub struct Session<S, K> {
    source: S,
    sink: K,
    normalizer: SeriesNormalizer,
    engine: AnalyticsEngine,
    composer: ChartPageComposer,
    default_symbol: String,
    default_period: Period,
    state: SessionState,
}

impl<S: SeriesSource, K: ChartSink> Session<S, K> {
    pub fn new(source: S, sink: K) -> Self {
        Self::with_config(source, sink, &AppConfig::default())
    }

    pub fn with_config(source: S, sink: K, config: &AppConfig) -> Self {
        Self {
            source,
            sink,
            normalizer: SeriesNormalizer::new(),
            engine: AnalyticsEngine::new(),
            composer: ChartPageComposer::with_histogram_buckets(config.histogram_buckets),
            default_symbol: config.default_symbol.trim().to_ascii_uppercase(),
            default_period: config.default_period,
            state: SessionState::Prompting,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn into_sink(self) -> K {
        self.sink
    }

    /// Drive the loop until it finishes
    pub fn run<R: BufRead, W: Write>(&mut self, input: &mut R, output: &mut W) -> io::Result<()> {
        writeln!(output, "STOCKSCOPE ANALYZER")?;
        while !self.state.is_finished() {
            self.step(input, output)?;
        }
        output.flush()
    }

    /// Advance exactly one transition
    pub fn step<R: BufRead, W: Write>(&mut self, input: &mut R, output: &mut W) -> io::Result<()> {
        let current = std::mem::replace(&mut self.state, SessionState::Finished);
        debug!(state = current.name(), "session step");

        self.state = match current {
            SessionState::Prompting => self.prompt(input, output)?,
            SessionState::Fetching { symbol, period } => {
                writeln!(output, "\nLoading {} data for {}...", symbol, period)?;
                match self.fetch(&symbol, period) {
                    Ok(table) => {
                        writeln!(output, "Loaded {} trading days", table.rows.len())?;
                        SessionState::Analyzing {
                            symbol,
                            period,
                            table,
                        }
                    }
                    Err(err) => {
                        warn!(%symbol, %period, error = %err, "retrieval failed");
                        if err.is_no_data() {
                            writeln!(output, "No data found! Check symbol format. ({})", err)?;
                        } else {
                            writeln!(output, "Error: {}", err)?;
                        }
                        SessionState::Prompting
                    }
                }
            }
            SessionState::Analyzing {
                symbol,
                period,
                table,
            } => match self.analyze(&table) {
                Ok((series, report)) => {
                    writeln!(output, "\n{}", render_summary(&symbol, period, &report))?;
                    SessionState::Rendering {
                        symbol,
                        series,
                        report: Box::new(report),
                    }
                }
                Err(err) => {
                    error!(%symbol, error = %err, "analysis failed");
                    writeln!(output, "Analysis failed: {}", err)?;
                    SessionState::AskContinue
                }
            },
            SessionState::Rendering {
                symbol,
                series,
                report,
            } => {
                writeln!(output, "\nGenerating 8 charts (2 per page)...")?;
                match self.render(&symbol, &series, &report) {
                    Ok(pages) => {
                        writeln!(
                            output,
                            "{} charts generated on {} pages for {}",
                            pages * 2,
                            pages,
                            symbol
                        )?;
                    }
                    Err(err) => {
                        error!(%symbol, error = %err, "rendering failed");
                        writeln!(output, "{}", err)?;
                    }
                }
                SessionState::AskContinue
            }
            SessionState::AskContinue => {
                write!(output, "\nAnalyze another stock? (y/n): ")?;
                output.flush()?;
                match read_line(input)? {
                    Some(answer) if is_yes(&answer) => SessionState::Prompting,
                    _ => {
                        writeln!(output, "\nThanks for using StockScope!")?;
                        SessionState::Finished
                    }
                }
            }
            SessionState::Finished => SessionState::Finished,
        };
        Ok(())
    }

    /// One full pass for `symbol`/`period` without any prompting
    pub fn analyze_once<W: Write>(
        &mut self,
        symbol: &str,
        period: Period,
        output: &mut W,
    ) -> Result<RunSummary, SessionError> {
        let symbol = self.resolve_symbol(symbol);
        let table = self.fetch(&symbol, period)?;
        let (series, report) = self.analyze(&table)?;
        writeln!(output, "{}", render_summary(&symbol, period, &report))?;
        let pages_rendered = self.render(&symbol, &series, &report)?;

        Ok(RunSummary {
            symbol,
            period,
            pages_rendered,
            report,
        })
    }

    fn prompt<R: BufRead, W: Write>(
        &mut self,
        input: &mut R,
        output: &mut W,
    ) -> io::Result<SessionState> {
        write!(output, "\nEnter stock symbol (e.g. {}): ", self.default_symbol)?;
        output.flush()?;
        let Some(symbol) = read_line(input)? else {
            return Ok(SessionState::Finished);
        };
        let symbol = self.resolve_symbol(&symbol);

        writeln!(output, "\nTIME PERIOD OPTIONS:\n{}", Period::options_line())?;
        write!(output, "Enter time period [{}]: ", self.default_period)?;
        output.flush()?;
        let Some(token) = read_line(input)? else {
            return Ok(SessionState::Finished);
        };
        let period = Period::parse_or(&token, self.default_period);

        Ok(SessionState::Fetching { symbol, period })
    }

    fn resolve_symbol(&self, raw: &str) -> String {
        let symbol = raw.trim().to_ascii_uppercase();
        if symbol.is_empty() {
            info!(default = %self.default_symbol, "blank symbol, using default");
            self.default_symbol.clone()
        } else {
            symbol
        }
    }

    fn fetch(&self, symbol: &str, period: Period) -> Result<RawTable, AnalysisError> {
        let table = self.source.fetch(symbol, period)?;
        if table.rows.is_empty() {
            return Err(AnalysisError::EmptySeries);
        }
        Ok(table)
    }

    fn analyze(&self, table: &RawTable) -> Result<(PriceSeries, AnalyticsReport), AnalysisError> {
        let series = self.normalizer.normalize(table)?;
        let report = self.engine.analyze(&series)?;
        Ok((series, report))
    }

    fn render(
        &mut self,
        symbol: &str,
        series: &PriceSeries,
        report: &AnalyticsReport,
    ) -> Result<usize, SessionError> {
        let pages = self.composer.compose(series, report);
        for page in &pages {
            self.sink
                .render_page(symbol, page)
                .map_err(|err| SessionError::Render {
                    page: page.number,
                    source: Box::new(err),
                })?;
        }
        info!(symbol, pages = pages.len(), "chart pages rendered");
        Ok(pages.len())
    }
}

/// `None` at end of input
fn read_line<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
