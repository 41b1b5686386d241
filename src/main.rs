//! Anchor block CLI Application
//!
//! A command-line interface for decoding, verifying and building blocks.

use anchor_block::cli::{self, BuildArgs};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "anchor-block")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "Decode, verify and build anchored blocks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a block and print its fields
    Inspect {
        /// Block bytes as hex
        hex: Option<String>,

        /// Read the block from a file (hex text or raw bytes)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check timestamp drift and merkle root
    Verify {
        /// Block bytes as hex
        hex: Option<String>,

        /// Read the block from a file (hex text or raw bytes)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Current time in seconds (defaults to the system clock)
        #[arg(long)]
        now: Option<i64>,

        /// Block height, if known
        #[arg(long)]
        height: Option<u64>,
    },

    /// Compute the merkle root of transaction hashes
    Merkle {
        /// Transaction hashes in display order
        #[arg(required = true)]
        hashes: Vec<String>,
    },

    /// Build a block and print it as hex
    Build {
        #[arg(long)]
        version: Option<u32>,

        /// Compressed plan key as hex
        #[arg(long)]
        plan_key: Option<String>,

        /// Previous block hash
        #[arg(long)]
        prev: Option<String>,

        /// Previous anchor transaction hash
        #[arg(long)]
        prev_anchor: Option<String>,

        /// Use this merkle root instead of computing it
        #[arg(long)]
        merkle_root: Option<String>,

        /// Block time in seconds (defaults to now)
        #[arg(long)]
        time: Option<u32>,

        /// Transaction hash (repeatable)
        #[arg(long = "tx")]
        transactions: Vec<String>,

        /// Omit the transaction section
        #[arg(long)]
        header_only: bool,

        /// Private key (hex) to sign the block with
        #[arg(long)]
        sign_key: Option<String>,
    },

    /// Derive a key pair from an identity number
    Derive {
        #[arg(long)]
        id: String,

        #[arg(long)]
        salt: String,

        /// Plan key as hex, also used as the HMAC key
        #[arg(long)]
        plan_key: String,
    },

    /// Generate a random key pair
    Keygen,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { hex, file, json } => {
            let bytes = cli::read_block_input(hex.as_deref(), file.as_deref())?;
            cli::cmd_inspect(&bytes, json)?;
        }

        Commands::Verify {
            hex,
            file,
            now,
            height,
        } => {
            let bytes = cli::read_block_input(hex.as_deref(), file.as_deref())?;
            if !cli::cmd_verify(&bytes, now, height)? {
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::Merkle { hashes } => {
            cli::cmd_merkle(&hashes)?;
        }

        Commands::Build {
            version,
            plan_key,
            prev,
            prev_anchor,
            merkle_root,
            time,
            transactions,
            header_only,
            sign_key,
        } => {
            cli::cmd_build(&BuildArgs {
                version,
                plan_key,
                prev_block: prev,
                prev_anchor,
                merkle_root,
                time,
                transactions,
                header_only,
                sign_key,
            })?;
        }

        Commands::Derive { id, salt, plan_key } => {
            cli::cmd_derive(&id, &salt, &plan_key)?;
        }

        Commands::Keygen => {
            cli::cmd_keygen()?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
