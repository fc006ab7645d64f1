use cashier_gate::config::GateConfig;
use cashier_gate::interfaces::json::scenario_reader::ScenarioReader;
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Scenario JSON file describing the client, page URL and API replies
    scenario: PathBuf,

    /// Gate configuration JSON file (optional). Unset fields use defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the site's own domain used to filter frame messages
    #[arg(long)]
    site_domain: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    let mut config = match cli.config {
        Some(path) => GateConfig::from_path(path).into_diagnostic()?,
        None => GateConfig::default(),
    };
    if let Some(domain) = cli.site_domain {
        config.site_domain = domain;
        config.validate().into_diagnostic()?;
    }

    let file = File::open(cli.scenario).into_diagnostic()?;
    let scenario = ScenarioReader::new(file).scenario().into_diagnostic()?;
    let report = scenario.play(config).await.into_diagnostic()?;

    let stdout = io::stdout();
    serde_json::to_writer_pretty(stdout.lock(), &report).into_diagnostic()?;
    println!();

    Ok(())
}
