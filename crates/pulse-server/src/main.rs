//! Pulse Server CLI
//!
//! Starts the HTTP server for the issue & inbox engine.

use anyhow::Context;
use pulse_server::{config::ServerConfig, start_server};
use std::env;
use std::process;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let args: Vec<String> = env::args().collect();

    let config = if args.len() > 2 && args[1] == "--config" {
        // Load from specified config file
        let config_path = &args[2];
        ServerConfig::from_file(config_path)
            .with_context(|| format!("loading config from {}", config_path))?
    } else if args.len() > 1 && args[1] == "--help" {
        print_help();
        process::exit(0);
    } else {
        // Use default test configuration
        eprintln!("Warning: No config file specified, using default test configuration");
        eprintln!("Usage: pulse-server --config <path-to-config.toml>");
        eprintln!();
        ServerConfig::default_test_config()
    };

    start_server(config).await.context("server failed")?;

    Ok(())
}

fn print_help() {
    println!("Pulse Server - Issue & Inbox Engine");
    println!();
    println!("USAGE:");
    println!("    pulse-server --config <path-to-config.toml>");
    println!();
    println!("OPTIONS:");
    println!("    --config <file>    Load configuration from TOML file");
    println!("    --help             Print this help message");
    println!();
    println!("EXAMPLE:");
    println!("    pulse-server --config config/pulse.toml");
    println!();
    println!("CONFIGURATION:");
    println!("    The TOML config file should contain:");
    println!("    - bind_address: IP address to bind (e.g., '127.0.0.1')");
    println!("    - bind_port: Port number (e.g., 8080)");
    println!("    - database_path: SQLite database file path");
    println!("    - [engine]: governance mode, penalty curve, timezone offset");
    println!();
}
