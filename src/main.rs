//! CLI entry point for the air-quality hotspot analysis.
//!
//! A bare invocation reads `data/`, queries OpenAQ for PM2.5, and writes the
//! map, CSV and GeoJSON into `outputs/`.

use air_hotspots::config::StudyConfig;
use air_hotspots::fetch::auth::UrlParam;
use air_hotspots::fetch::{BasicClient, HttpClient};
use air_hotspots::infra::openaq::OpenAqClient;
use air_hotspots::output::print_json;
use air_hotspots::pipeline;
use air_hotspots::services::air_quality::OfflineAirQuality;
use anyhow::Result;
use clap::Parser;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "air_hotspots")]
#[command(
    about = "Join PM2.5, CO2 and TRI facility data by city and map pollution hotspots",
    long_about = None
)]
struct Cli {
    /// Directory holding the input CSV/GeoJSON files
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Directory the map, CSV and GeoJSON are written to
    #[arg(short, long, default_value = "outputs")]
    output_dir: PathBuf,

    /// JSON study config (defaults to <data-dir>/config.json when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Skip OpenAQ and take PM2.5 from the fallback file only
    #[arg(long, default_value_t = false)]
    offline: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/air_hotspots.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("air_hotspots.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let config = StudyConfig::resolve(cli.config.as_deref(), &cli.data_dir)?;

    info!(
        cities = config.cities.len(),
        year = config.year,
        offline = cli.offline,
        "Starting hotspot analysis"
    );

    let summary = if cli.offline {
        pipeline::run(&OfflineAirQuality, &config, &cli.data_dir, &cli.output_dir).await?
    } else {
        let http: Box<dyn HttpClient> = match std::env::var("OPENAQ_KEY") {
            Ok(key) if !key.is_empty() => Box::new(UrlParam {
                inner: BasicClient::new()?,
                param_name: "api_key".to_string(),
                key,
            }),
            _ => {
                info!("OPENAQ_KEY not set, querying OpenAQ without a key");
                Box::new(BasicClient::new()?)
            }
        };
        let api = OpenAqClient::new(http, &config.openaq_base_url, config.radius_km);
        pipeline::run(&api, &config, &cli.data_dir, &cli.output_dir).await?
    };

    print_json(&summary)?;
    info!(
        matched = summary.matched,
        excluded = summary.excluded.len(),
        output_dir = %cli.output_dir.display(),
        "Completed"
    );

    Ok(())
}
