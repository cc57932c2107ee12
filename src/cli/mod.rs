//! Command-line interface for the storefront-server binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Storefront - admin catalog API server
#[derive(Parser, Debug)]
#[command(
    name = "storefront-server",
    version,
    about = "Storefront - admin catalog API server",
    long_about = "Serves the admin catalog API (articles, categories, products, image sliders)\n\
                  with cookie sessions and Cloudinary image uploads.\n\n\
                  Configuration comes from the environment, optionally preloaded from a .env file.",
    after_help = "EXAMPLES:\n    \
                  storefront-server                         # Start the server (.env if present)\n    \
                  storefront-server --env-file prod.env     # Load a specific env file\n    \
                  storefront-server --port 8080             # Override PORT\n    \
                  storefront-server check-config            # Validate configuration and exit"
)]
pub struct Cli {
    /// Env file loaded before reading the environment
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,

    /// Override HOST
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Override PORT
    #[arg(short, long, global = true)]
    pub port: Option<u16>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Validate the configuration and exit
    CheckConfig,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
