use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;

use custody_signer::config::load_config;

#[derive(Parser)]
#[command(name = "custody-cli")]
#[command(about = "Operator CLI for the custody signing provider", long_about = None)]
struct Cli {
    /// JSON-RPC endpoint of a running custody-signer
    #[arg(short, long, default_value = "http://127.0.0.1:8545")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the configuration guard over a config file
    CheckConfig {
        #[arg(short, long, default_value = "custody-signer.toml")]
        config: PathBuf,
    },
    /// List the accounts custody signs for
    Accounts,
    /// Send an arbitrary JSON-RPC request
    Request {
        method: String,
        /// Parameters as a JSON array
        #[arg(default_value = "[]")]
        params: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::CheckConfig { config } => {
            let (user, prepared) = load_config(&config)?;
            println!(
                "{}: {} network(s), custody enabled on {}",
                config.display(),
                user.networks.len(),
                prepared.network_names().collect::<Vec<_>>().join(", ")
            );
        }
        Commands::Accounts => {
            call(&cli.url, "eth_accounts", Value::Array(vec![])).await?;
        }
        Commands::Request { method, params } => {
            let params: Value = serde_json::from_str(&params)?;
            if !params.is_array() {
                return Err("params must be a JSON array".into());
            }
            call(&cli.url, &method, params).await?;
        }
    }

    Ok(())
}

async fn call(url: &str, method: &str, params: Value) -> Result<(), Box<dyn std::error::Error>> {
    let body = json!({ "jsonrpc": "2.0", "id": 1, "method": method, "params": params });
    let res = reqwest::Client::new().post(url).json(&body).send().await?;

    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: endpoint returned status {}", status);
    }
    let response: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    if response.get("error").is_some() {
        std::process::exit(1);
    }
    Ok(())
}
