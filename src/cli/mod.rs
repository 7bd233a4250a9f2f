//! CLI module - Command-line interface for eventscout
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// eventscout - type-ahead event search with multilingual query expansion
#[derive(Parser)]
#[command(name = "eventscout")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server until interrupted
    #[command(alias = "daemon", alias = "-d")]
    Serve,

    /// Run the suggestion pipeline once and print the results
    #[command(alias = "s")]
    Suggest {
        /// Search text
        #[arg(required = true)]
        query: Vec<String>,
        /// Print the raw JSON response instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show the expansion terms for a query
    #[command(alias = "x")]
    Expand {
        /// Search text
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Upsert events from a JSON file (array of events, keyed by slug)
    Import {
        /// Path to the JSON file
        path: String,
    },

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}

pub use commands::*;
