//! reqmeter CLI Tool
//!
//! Command line interface for reqmeter configuration and a demo server

mod server;

use anyhow::Result;
use clap::{Parser, Subcommand};
use reqmeter_core::config::loader::{get_config_path, load_config, load_config_from_path};
use reqmeter_core::Settings;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "reqmeter")]
#[command(about = "A CLI tool for the reqmeter HTTP metrics middleware")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a demo server instrumented with the metrics middleware
    Serve {
        /// Path to configuration file (defaults to CONFIG_PATH or config.toml)
        #[arg(short, long)]
        config: Option<String>,
        /// Address to bind, overrides server.bind_address
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Validate configuration file
    ValidateConfig {
        /// Path to configuration file (defaults to CONFIG_PATH or config.toml)
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Print the effective configuration as JSON
    ShowConfig {
        /// Path to configuration file (defaults to CONFIG_PATH or config.toml)
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Generate example configuration file
    GenerateConfig {
        /// Output path for configuration file
        #[arg(short, long, default_value = "config_example.toml")]
        output: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // 日志完全依赖RUST_LOG环境变量
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_file(true)
        .with_line_number(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, bind } => {
            let settings = load_serve_settings(config)?;
            server::serve(settings, bind).await?;
        }
        Commands::ValidateConfig { config } => {
            let config = config.unwrap_or_else(get_config_path);
            println!("Validating configuration file: {}", config);
            match load_config_from_path(&config) {
                Ok(settings) => {
                    println!("✅ Configuration is valid");
                    println!("  - server name: {}", settings.server.name);
                    println!("  - metrics path: {}", settings.metrics.path);
                    println!("  - {} metric option(s) applied", settings.metrics.options().len());
                }
                Err(e) => {
                    eprintln!("❌ Configuration validation failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::ShowConfig { config } => {
            let config = config.unwrap_or_else(get_config_path);
            let settings = load_config_from_path(&config)?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        Commands::GenerateConfig { output } => {
            println!("Generating configuration file: {}", output);
            std::fs::write(&output, EXAMPLE_CONFIG)?;
            println!("✅ Configuration file generated successfully");
        }
    }

    Ok(())
}

/// 显式指定的配置文件必须存在，默认路径缺失时使用默认配置
fn load_serve_settings(config: Option<String>) -> Result<Settings> {
    match config {
        Some(path) => load_config_from_path(&path),
        None => {
            let path = get_config_path();
            if std::path::Path::new(&path).exists() {
                info!("Configuration file: {}", path);
                load_config()
            } else {
                info!("Configuration file {} not found, using defaults", path);
                Ok(Settings::default())
            }
        }
    }
}

const EXAMPLE_CONFIG: &str = r#"# reqmeter Configuration File

[server]
name = "reqmeter"
bind_address = "127.0.0.1:3000"

[metrics]
# Track the number of requests being served
record_in_flight = true
# Record request latency
record_duration = true
# Record request and response sizes
record_size = true
# Record status classes (200, 300, ...) instead of exact codes
grouped_status = true
path = "/metrics"
namespace = "http_server"
"#;
