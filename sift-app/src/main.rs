use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sift_common::observability::{LogConfig, init_logging};
use sift_config::{SiftConfig, SiftConfigLoader};
use sift_server::{Extractor, HttpServer, ToolServer, tool::render_result};
use sift_web::Pipeline;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

const DEFAULT_CONFIG_FILE: &str = "sift.yaml";

#[derive(Parser, Debug)]
#[command(name = "sift", version, about = "Fetch web pages in a real browser and extract their article text")]
struct Cli {
    /// Configuration file (YAML/TOML/JSON). Defaults to ./sift.yaml when present.
    #[arg(long, global = true, env = "SIFT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract one URL and print the result.
    Extract {
        url: String,
        /// Print the full result as JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Serve `POST /extract` over HTTP.
    ServeHttp {
        /// Overrides `server.listen_addr`.
        #[arg(long)]
        addr: Option<String>,
    },
    /// Serve the extraction tool over newline-delimited JSON-RPC on stdio.
    ServeTool,
}

fn load_config(path: Option<&PathBuf>) -> Result<SiftConfig> {
    let loader = match path {
        Some(path) => SiftConfigLoader::new().with_file(path),
        None => SiftConfigLoader::new().with_optional_file(DEFAULT_CONFIG_FILE),
    };
    loader.load().context("failed to load configuration")
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown.requested");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = load_config(cli.config.as_ref())?;

    init_logging(LogConfig {
        app_name: "sift",
        log_dir: cfg.logging.dir.clone(),
        emit_stderr: cfg.logging.stderr,
        format: cfg.logging.format,
        default_filter: cfg.logging.filter.clone(),
    })?;

    let pipeline = Arc::new(Pipeline::with_webdriver(Arc::new(cfg.pipeline.clone())));

    match cli.command {
        Command::Extract { url, json } => {
            let result = pipeline.extract(&url).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", render_result(&result));
            }
        }
        Command::ServeHttp { addr } => {
            let mut server_cfg = cfg.server.clone();
            if let Some(addr) = addr {
                server_cfg.listen_addr = addr;
            }
            let extractor: Arc<dyn Extractor> = pipeline;
            HttpServer::new(server_cfg, extractor)
                .run(shutdown_signal())
                .await?;
        }
        Command::ServeTool => {
            let extractor: Arc<dyn Extractor> = pipeline;
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            ToolServer::new(extractor)
                .serve(stdin, tokio::io::stdout())
                .await?;
        }
    }
    Ok(())
}
