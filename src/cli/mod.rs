pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "smarthome")]
#[command(about = "Smart-home device control plane: device RPC service and HTTP gateway")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP gateway in front of the device service")]
    Gateway {
        #[arg(long, env = "GATEWAY_ADDR", help = "Listen address (overrides config)")]
        addr: Option<String>,
    },

    #[command(about = "Run the device RPC service")]
    DeviceService {
        #[arg(long, env = "DEVICE_RPC_ADDR", help = "Listen address (overrides config)")]
        addr: Option<String>,
    },

    #[command(about = "Issue a bearer token signed with the configured secret")]
    Token {
        #[arg(long, help = "User id placed in the token subject")]
        user: String,
        #[arg(long, help = "Lifetime in hours (defaults to JWT_EXPIRY_HOURS)")]
        hours: Option<u64>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli, config: &AppConfig) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Gateway { addr } => commands::gateway::run(config, addr).await,
        Commands::DeviceService { addr } => commands::device_service::run(config, addr).await,
        Commands::Token { user, hours } => {
            commands::token::handle(config, &user, hours, output_format)
        }
    }
}
