use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use rxfan::config::Config;
use rxfan::log::{EventSink, FileSink, NullSink, StderrSink};
use rxfan::{Orchestrator, Result};

/// rxfan - concurrent fan-out engine for prescription benefit requests
#[derive(Parser, Debug)]
#[command(name = "rxfan")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Inbound benefit request, "::"-separated
    #[arg(default_value = "rtpbi_request::preferred")]
    pub request: String,

    /// Print workflow events to stderr as they occur
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit the response as JSON
    #[arg(long)]
    pub json: bool,

    /// Alternate config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let sink: Arc<dyn EventSink> = if cli.verbose {
        Arc::new(StderrSink)
    } else if let Some(path) = &config.log_file {
        Arc::new(FileSink::new(path))
    } else {
        Arc::new(NullSink)
    };

    let orchestrator = Orchestrator::from_config(&config, sink);

    let rt = tokio::runtime::Runtime::new()?;
    let response = rt.block_on(orchestrator.handle(&cli.request))?;

    if cli.json {
        let output = serde_json::json!({
            "request": cli.request,
            "response": response,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{response}");
    }

    Ok(())
}
