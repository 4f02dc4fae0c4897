// src/main.rs
use clap::Parser;
use log::{error, info, LevelFilter};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use sheet_plotter::{
    build_series, chart, export, load_config, AppConfig, ChartSurface, CloudHandler,
    CoercionPolicy, Error, ExportFormat, GraphType, RefreshScheduler, Result, Settings,
};

const SETTINGS_PATH: &str = "settings.json";

/// Charts data from Google Sheets.
#[derive(Debug, Parser)]
#[command(name = "sheet_plotter", version)]
struct Args {
    /// Configuration file (defaults to the last one used)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Worksheet names to fetch, comma-separated
    #[arg(long, value_delimiter = ',', required = true)]
    sheets: Vec<String>,

    /// X column positions within the retrieved columns, comma-separated
    #[arg(long, value_delimiter = ',', required = true)]
    x_columns: Vec<usize>,

    /// Y column positions within the retrieved columns, comma-separated
    #[arg(long, value_delimiter = ',', required = true)]
    y_columns: Vec<usize>,

    /// Label text added to every series legend entry
    #[arg(long, default_value = "")]
    label: String,

    /// Directory the chart is saved to (defaults to the last one used)
    #[arg(long)]
    directory: Option<PathBuf>,

    /// File name for the chart, without extension
    #[arg(long, default_value = "chart")]
    file_name: String,

    /// line, bar or scatter
    #[arg(long, default_value = "line")]
    graph_type: String,

    /// png, pdf or svg
    #[arg(long, default_value = "png")]
    format: String,

    /// Refresh the chart every N seconds until interrupted
    #[arg(long)]
    interval: Option<u64>,

    /// Fail on blank cells instead of silently dropping them
    #[arg(long)]
    strict_numbers: bool,

    /// Chart width in pixels
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Chart height in pixels
    #[arg(long, default_value_t = 600)]
    height: u32,
}

/// Everything one fetch, build, render and save cycle needs.
struct CycleParams {
    sheets: Vec<String>,
    x_columns: Vec<usize>,
    y_columns: Vec<usize>,
    label: String,
    directory: PathBuf,
    file_name: String,
    graph_type: GraphType,
    format: ExportFormat,
    policy: CoercionPolicy,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    if let Err(err) = run(args).await {
        error!("{err}");
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let mut settings = Settings::load(Path::new(SETTINGS_PATH));
    let config_path = args
        .config
        .clone()
        .or_else(|| settings.last_config_path.clone())
        .ok_or_else(|| {
            Error::Configuration(
                "no configuration file given and none remembered from a previous run".into(),
            )
        })?;
    let config = load_config(&config_path)?;
    init_logging(&config)?;
    info!("Starting the program");

    let directory = args
        .directory
        .clone()
        .or_else(|| settings.last_save_directory.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    settings.last_config_path = Some(config_path.clone());
    settings.last_save_directory = Some(directory.clone());
    settings.save(Path::new(SETTINGS_PATH))?;

    let params = Arc::new(CycleParams {
        sheets: args.sheets,
        x_columns: args.x_columns,
        y_columns: args.y_columns,
        label: args.label,
        directory,
        file_name: args.file_name,
        graph_type: args.graph_type.parse()?,
        format: args.format.parse()?,
        policy: if args.strict_numbers {
            CoercionPolicy::Strict
        } else {
            CoercionPolicy::SkipBlanks
        },
    });
    let config = Arc::new(config);
    let handler = Arc::new(CloudHandler::connect(&config.file_path).await?);
    let surface = Arc::new(Mutex::new(ChartSurface::new(args.width, args.height)));

    // The first cycle surfaces its error to the user; refresh ticks only log.
    run_cycle(&handler, &config, &params, &surface).await?;

    if let Some(interval) = args.interval {
        let mut scheduler = RefreshScheduler::new();
        let tick = {
            let handler = Arc::clone(&handler);
            let config = Arc::clone(&config);
            let params = Arc::clone(&params);
            let surface = Arc::clone(&surface);
            move || {
                let handler = Arc::clone(&handler);
                let config = Arc::clone(&config);
                let params = Arc::clone(&params);
                let surface = Arc::clone(&surface);
                async move { run_cycle(&handler, &config, &params, &surface).await }
            }
        };
        scheduler.start(interval, tick)?;
        info!("Auto-refresh every {interval} second(s), press Ctrl-C to stop");
        tokio::signal::ctrl_c()
            .await
            .map_err(|err| Error::Unexpected(err.to_string()))?;
        scheduler.stop();
    }

    settings.save(Path::new(SETTINGS_PATH))?;
    info!("Program completed successfully");
    Ok(())
}

/// One full pass: fetch, build, render, save.
///
/// Fetch and build run before the surface is locked, so any failure up to
/// there leaves the previous chart untouched; render itself only commits
/// completed frames.
async fn run_cycle(
    handler: &CloudHandler,
    config: &AppConfig,
    params: &CycleParams,
    surface: &Mutex<ChartSurface>,
) -> Result<()> {
    let data = handler
        .fetch_data(&config.sheet_id, &params.sheets, &config.columns)
        .await?;
    let series = build_series(
        &data,
        &params.x_columns,
        &params.y_columns,
        params.policy,
        &params.label,
    )?;
    let mut surface = surface
        .lock()
        .map_err(|_| Error::Unexpected("drawing surface lock poisoned".into()))?;
    chart::render(
        &mut surface,
        &series,
        params.graph_type,
        &config.plot_settings,
    )?;
    export::save(&surface, &params.directory, &params.file_name, params.format)?;
    Ok(())
}

fn init_logging(config: &AppConfig) -> Result<()> {
    std::fs::create_dir_all(&config.logs_directory).map_err(|err| {
        Error::Configuration(format!(
            "cannot create logs directory '{}': {err}",
            config.logs_directory.display()
        ))
    })?;
    let log_path = config.logs_directory.join("app.log");
    let file = std::fs::File::create(&log_path).map_err(|err| {
        Error::Configuration(format!(
            "cannot open log file '{}': {err}",
            log_path.display()
        ))
    })?;
    let level: LevelFilter = config.logging_level.parse().map_err(|_| {
        Error::Configuration(format!(
            "unrecognized logging_level '{}'",
            config.logging_level
        ))
    })?;
    // Ignore a second init, e.g. when RUST_LOG tooling got there first.
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init();
    Ok(())
}
