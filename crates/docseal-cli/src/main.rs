//! Docseal CLI - sign documents and verify presented copies from the shell.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

/// Docseal - document integrity and verification engine
#[derive(Parser)]
#[command(name = "docseal")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, env = "DOCSEAL_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Directory holding the signing key pair (overrides the config file)
    #[arg(long, env = "DOCSEAL_KEY_DIR", global = true)]
    key_dir: Option<PathBuf>,

    /// SQLite database path (overrides the config file)
    #[arg(long, env = "DOCSEAL_DATABASE", global = true)]
    database: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a signing key pair unless one already exists
    Keygen {
        /// Key strength in RSA-equivalent bits
        #[arg(long)]
        bits: Option<u32>,
    },
    /// Replace the signing key pair, archiving the old one
    Rotate {
        /// Key strength in RSA-equivalent bits
        #[arg(long)]
        bits: Option<u32>,
    },
    /// Sign a document and record it
    Sign {
        /// Document to sign
        file: PathBuf,

        /// Issuer recorded in the verification payload
        #[arg(long)]
        issuer: Option<String>,

        /// Write the encoded verification payload to this file
        #[arg(long)]
        payload_out: Option<PathBuf>,
    },
    /// Verify a presented document against its record
    Verify {
        /// Document id from the verification payload
        id: String,

        /// Presented document
        file: PathBuf,

        /// Client address recorded in the audit trail
        #[arg(long)]
        client_ip: Option<String>,

        /// Client user agent recorded in the audit trail
        #[arg(long)]
        user_agent: Option<String>,
    },
    /// Withdraw a document so it never verifies again
    Withdraw {
        /// Document id
        id: String,
    },
    /// Show the verification audit trail for a document id
    Audit {
        /// Document id as presented by verifiers
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = commands::load_config(
        cli.config.as_deref(),
        cli.key_dir.clone(),
        cli.database.clone(),
    )?;

    match cli.command {
        Commands::Keygen { bits } => commands::keygen(&config, bits)?,
        Commands::Rotate { bits } => commands::rotate(&config, bits)?,
        Commands::Sign {
            file,
            issuer,
            payload_out,
        } => commands::sign(config, &file, issuer, payload_out).await?,
        Commands::Verify {
            id,
            file,
            client_ip,
            user_agent,
        } => {
            let valid = commands::verify(config, &id, &file, client_ip, user_agent).await?;
            if !valid {
                return Ok(ExitCode::from(2));
            }
        }
        Commands::Withdraw { id } => commands::withdraw(config, &id).await?,
        Commands::Audit { id } => commands::audit(config, &id).await?,
    }

    Ok(ExitCode::SUCCESS)
}
