//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// In-memory hierarchical record store: tree queries and undoable edits over a JSON node list
#[derive(Parser, Debug)]
#[command(name = "treestore")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Nodes file, a JSON array (default: data_file from config)
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub file: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show nodes as a tree
    Show {
        /// Subtree root (default: all top-level nodes)
        id: Option<String>,
    },

    /// Show a single node
    Get {
        /// Node id
        id: String,
    },

    /// List children of a node
    Children {
        /// Node id
        id: String,
        /// Include all descendants (level order)
        #[arg(short, long)]
        all: bool,
    },

    /// List ancestors of a node, root first
    Ancestors {
        /// Node id
        id: String,
    },

    /// Apply an operation script (JSON Lines)
    Run {
        /// Script file
        #[arg(value_hint = ValueHint::FilePath)]
        script: PathBuf,
        /// Write resulting nodes to this file
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Print a config template
    Template,
    /// Show config file locations
    Path,
}
