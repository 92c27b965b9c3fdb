mod config;
mod logs;
mod server;

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, error};

use crate::config::EdgeConfig;
use crate::server::factory::ServerFactory;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct EdgeArgs {
    /// Path to the TOML config file. Without it, `faasdash.toml` is used
    /// when present, built-in defaults otherwise.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the resolved configuration (JSON) and exit.
    #[arg(long)]
    pub print_config: bool,

    /// Log level: error, warn, info or debug.
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

async fn run(args: EdgeArgs) -> Result<()> {
    logs::init(&args.log_level)?;

    let cfg = EdgeConfig::load(args.config.as_deref())?;

    if args.print_config {
        let json = serde_json::to_string_pretty(&cfg).context("encode config")?;
        println!("{json}");
        return Ok(());
    }

    debug!("Use config: {:?}", cfg);

    let factory = ServerFactory::new(cfg);
    let srv = factory.build_server()?;
    srv.run().await
}

#[tokio::main]
async fn main() {
    let args = EdgeArgs::parse();
    match run(args).await {
        Ok(()) => {}
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Fatal: {:#}", e);
            process::exit(1);
        }
    }
}
