//! CLI module - command-line interface for store-api.

mod commands;

use clap::{Parser, Subcommand};

/// store-api - storefront REST backend
#[derive(Parser)]
#[command(name = "store-api")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    #[command(alias = "web")]
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Recompute category product lists from the products table
    Reconcile {
        /// Category slug; all categories when omitted
        #[arg(long)]
        category: Option<String>,
    },
}

pub use commands::*;
