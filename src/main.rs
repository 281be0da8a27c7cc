// src/main.rs
//
// CLI entry point. Resolves settings, optionally enables file logging, and
// either lists serial ports or runs the TUI.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use hc05_console::app::{self, AppOptions};
use hc05_console::io::list_ports;
use hc05_console::logging::init_file_logging;
use hc05_console::settings::load_settings;

#[derive(Parser)]
#[command(name = "hc05-console", version, about)]
struct Cli {
    /// Serial port of the paired HC-05, e.g. /dev/rfcomm0 or COM5
    #[arg(long)]
    port: Option<String>,

    /// Baud rate (HC-05 default is 9600)
    #[arg(long)]
    baud: Option<u32>,

    /// Retained lines per sensor log
    #[arg(long)]
    log_limit: Option<usize>,

    /// Mirror stderr logging into a timestamped file in this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand)]
enum Cmd {
    /// List the serial ports visible on this machine
    ListPorts,
}

async fn run(cli: Cli) -> Result<(), String> {
    if let Some(dir) = &cli.log_dir {
        init_file_logging(dir)?;
    }

    if let Some(Cmd::ListPorts) = cli.command {
        let ports = list_ports()?;
        if ports.is_empty() {
            println!("No serial ports found.");
            return Ok(());
        }
        for port in ports {
            let detail = match (port.manufacturer, port.product) {
                (Some(manufacturer), Some(product)) => {
                    format!(" — {} {}", manufacturer, product)
                }
                (_, Some(product)) => format!(" — {}", product),
                (Some(manufacturer), _) => format!(" — {}", manufacturer),
                _ => String::new(),
            };
            println!("{:<24} {}{}", port.port_name, port.port_type, detail);
        }
        return Ok(());
    }

    let settings = load_settings()?;
    let options = AppOptions {
        port: cli.port.or(settings.default_port),
        baud_rate: cli.baud.unwrap_or(settings.baud_rate),
        log_limit: cli.log_limit.unwrap_or(settings.log_limit),
    };

    app::run(options).await
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
