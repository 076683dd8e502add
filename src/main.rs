// ActionBoard - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. Config loading and logging initialisation (debug mode support)
// 3. One query pass (or a periodic pass in --watch mode)
// 4. Rendering metrics/rows to stdout and writing the export file

use actionboard::app::cache::Cache;
use actionboard::app::query::{run_query, QueryCondition, QueryView};
use actionboard::app::source::{DefaultFetcher, SourceId};
use actionboard::core::export::ExportFormat;
use actionboard::core::filter::{FilterState, Selection};
use actionboard::core::schema::Dimension;
use actionboard::platform;
use actionboard::util::{self, constants, error};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// ActionBoard - filtered view over the approved SMART actions sheet.
///
/// Fetches the published CSV (cached for 60 seconds), keeps approved rows,
/// applies the selected filters and search, prints live counts and the
/// matching rows, and optionally writes an export.
#[derive(Parser, Debug)]
#[command(name = "ActionBoard", version, about)]
struct Cli {
    /// Source URL or local CSV path (overrides [source] url).
    #[arg(short = 's', long = "source")]
    source: Option<String>,

    /// Account filter ("All" for no constraint).
    #[arg(long, default_value = constants::ALL_SENTINEL)]
    account: Selection,

    /// Theme filter ("All" for no constraint).
    #[arg(long, default_value = constants::ALL_SENTINEL)]
    theme: Selection,

    /// Project manager filter ("All" for no constraint).
    #[arg(long = "project-manager", default_value = constants::ALL_SENTINEL)]
    project_manager: Selection,

    /// Priority filter ("All" for no constraint).
    #[arg(long, default_value = constants::ALL_SENTINEL)]
    priority: Selection,

    /// Search in SMART Action / Feedback / FinalFeedback.
    #[arg(short = 'q', long = "search", default_value = "")]
    search: String,

    /// Write the filtered rows to this file.
    #[arg(short = 'o', long = "export")]
    export: Option<PathBuf>,

    /// Export format (overrides [export] format).
    #[arg(long = "format", value_enum)]
    format: Option<FormatArg>,

    /// Print the available options for each filter.
    #[arg(long = "list-options")]
    list_options: bool,

    /// Re-run the query every N seconds until interrupted.
    #[arg(short = 'w', long = "watch", value_name = "SECS")]
    watch: Option<u64>,

    /// Config file (defaults to the platform config directory).
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Csv,
    Json,
}

impl From<FormatArg> for ExportFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Csv => ExportFormat::Csv,
            FormatArg::Json => ExportFormat::Json,
        }
    }
}

impl Cli {
    fn filter_state(&self) -> FilterState {
        FilterState::default()
            .with(Dimension::Account, self.account.clone())
            .with(Dimension::Theme, self.theme.clone())
            .with(Dimension::ProjectManager, self.project_manager.clone())
            .with(Dimension::Priority, self.priority.clone())
            .with_search(self.search.clone())
    }
}

fn main() {
    let cli = Cli::parse();

    let (config_path, required) = match cli.config {
        Some(ref p) => (p.clone(), true),
        None => (platform::config::PlatformPaths::resolve().config_file(), false),
    };
    let (config, config_warnings) = platform::config::load_config(&config_path, required);

    util::logging::init(
        cli.debug,
        config.log_level.as_deref(),
        config.log_file.as_deref(),
    );

    tracing::info!(
        version = constants::APP_VERSION,
        debug = cli.debug,
        config = %config_path.display(),
        "ActionBoard starting"
    );
    for warning in &config_warnings {
        tracing::warn!(error = %warning, "Config warning");
    }

    match run(&cli, &config) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            tracing::error!(error = %e, "ActionBoard failed");
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Returns the process exit code.
fn run(cli: &Cli, config: &platform::config::AppConfig) -> error::Result<i32> {
    let source = SourceId::new(cli.source.clone().unwrap_or_else(|| config.source_url.clone()));
    let format = cli.format.map(ExportFormat::from).unwrap_or(config.export_format);
    let filter = cli.filter_state();

    let fetcher = DefaultFetcher::new(Duration::from_secs(config.fetch_timeout_secs))?;
    let cache = Cache::new(Arc::new(fetcher));

    let Some(interval) = cli.watch else {
        return query_once(cli, &cache, &source, &filter, format);
    };

    let interval = interval.clamp(
        constants::MIN_WATCH_INTERVAL_SECS,
        constants::MAX_WATCH_INTERVAL_SECS,
    );
    tracing::info!(interval_secs = interval, ttl_secs = cache.ttl().as_secs(), "Watch mode");
    loop {
        // Failures are reported and retried on the next tick.
        query_once(cli, &cache, &source, &filter, format)?;
        std::thread::sleep(Duration::from_secs(interval));
        println!();
    }
}

fn query_once(
    cli: &Cli,
    cache: &Cache,
    source: &SourceId,
    filter: &FilterState,
    format: ExportFormat,
) -> error::Result<i32> {
    match run_query(cache, source, filter, format) {
        Ok(view) => {
            render(&view, cli.list_options);
            if let Some(ref path) = cli.export {
                write_export(&view, path)?;
            }
            Ok(0)
        }
        Err(condition) if condition.is_soft() => {
            println!("{condition}");
            Ok(0)
        }
        Err(condition) => {
            tracing::error!(source = %source, error = %condition, "Query failed");
            eprintln!("Error: {condition}");
            Ok(1)
        }
    }
}

fn render(view: &QueryView, list_options: bool) {
    println!(
        "{} (refreshed {})",
        constants::APP_NAME,
        view.refreshed_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    for (label, value) in view.metrics.display_pairs() {
        println!("  {label}: {value}");
    }

    if list_options {
        println!();
        for facet in &view.facets {
            println!(
                "{} [{}]: {}, {}",
                facet.dimension,
                facet.selection,
                constants::ALL_SENTINEL,
                facet.options.join(", ")
            );
        }
    }

    println!();
    if view.is_empty() {
        println!("No data");
        return;
    }

    println!("{}", view.columns().join("\t"));
    for row in view.records.rows() {
        let cells: Vec<String> = row
            .values
            .iter()
            .map(|v| v.to_string().replace(['\t', '\n', '\r'], " "))
            .collect();
        println!("{}", cells.join("\t"));
    }
}

fn write_export(view: &QueryView, path: &std::path::Path) -> error::Result<()> {
    let Some(ref payload) = view.export else {
        tracing::info!(path = %path.display(), "Nothing to export");
        return Ok(());
    };
    platform::fs::write_atomic(path, &payload.bytes).map_err(|e| error::ExportError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    tracing::info!(
        path = %path.display(),
        rows = payload.rows,
        mime = payload.mime_type,
        suggested = payload.file_name,
        "Export written"
    );
    eprintln!("Exported {} rows to {}", payload.rows, path.display());
    Ok(())
}
