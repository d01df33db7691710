//! Command-line interface definition for relaychat
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for running the relay, chatting through it, and
//! managing the stored universal prompt.

use clap::{Parser, Subcommand};

/// relaychat - streaming chat relay for hosted language models
///
/// Run the relay server, or talk to a running relay from the terminal.
#[derive(Parser, Debug, Clone)]
#[command(name = "relaychat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for relaychat
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the relay HTTP server
    Serve {
        /// Override the bind host from config
        #[arg(long)]
        host: Option<String>,

        /// Override the listen port from config
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Start an interactive chat session against a running relay
    Chat {
        /// Override the relay base URL from config
        #[arg(short, long)]
        relay_url: Option<String>,
    },

    /// Manage the universal prompt prepended to every conversation
    Prompt {
        /// Prompt management subcommand
        #[command(subcommand)]
        command: PromptCommand,
    },
}

/// Universal prompt subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum PromptCommand {
    /// Print the stored universal prompt
    Show,

    /// Replace the stored universal prompt
    Set {
        /// New prompt text
        text: String,
    },

    /// Remove the stored universal prompt
    Clear,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
