use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use name_retention::cli;
use name_retention::config::Config;

#[derive(Parser)]
#[command(name = "name-retention", version)]
#[command(
    about = "Extract fields from a PEP 541 support issue and fill in the reply templates",
    long_about = None
)]
struct Cli {
    /// Issue number on the support repository
    issue_number: u64,

    /// Path to config file (defaults to ./name-retention.toml or ~/.config/name-retention/config.toml)
    #[arg(long)]
    config: Option<String>,

    /// Print every rendered section instead of starting the section picker
    #[arg(long)]
    print: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load_with_path(cli.config)?;

    // Logs go to stderr so the rendered reply on stdout stays clean
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    cli::reply::run(cli.issue_number, &config, cli.print).await
}
