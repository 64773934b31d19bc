pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "discipline")]
#[command(about = "Discipline CLI - account bootstrap and history tooling for the Campus Discipline API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, conflicts_with = "json", help = "Output in human-readable text format (default)")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Print a bcrypt hash for a password")]
    HashPassword {
        #[arg(help = "Plaintext password")]
        password: String,
    },

    #[command(about = "Create an account directly in the database")]
    CreateAccount(commands::account::CreateAccountArgs),

    #[command(about = "Show an account's change history, most recent first")]
    History {
        #[arg(help = "Account id")]
        account_id: String,
    },

    #[command(about = "Write the full change history as CSV")]
    ExportHistory {
        #[arg(long, help = "Output file (defaults to stdout)")]
        out: Option<std::path::PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        match (cli.text, cli.json) {
            (false, true) => OutputFormat::Json,
            _ => OutputFormat::Text,
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::HashPassword { password } => commands::account::hash_password(&password, output_format).await,
        Commands::CreateAccount(args) => commands::account::create_account(args, output_format).await,
        Commands::History { account_id } => commands::history::show(&account_id, output_format).await,
        Commands::ExportHistory { out } => commands::history::export(out, output_format).await,
    }
}
