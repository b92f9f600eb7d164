pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "expense-tracker-api")]
#[command(about = "Expense Tracker API - owner-scoped expense records over REST")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    /// Defaults to `serve` when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server")]
    Serve {
        #[arg(long, help = "Port to listen on (overrides EXPENSE_API_PORT / PORT)")]
        port: Option<u16>,
    },

    #[command(about = "Apply database migrations and exit")]
    Migrate,

    #[command(about = "Print a bearer token for local testing")]
    Token(commands::token::TokenArgs),
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

pub async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => commands::server::handle(config, port).await,
        Commands::Migrate => commands::migrate::handle(&config, output_format).await,
        Commands::Token(args) => commands::token::handle(args, &config, output_format),
    }
}
