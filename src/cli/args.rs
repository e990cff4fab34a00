//! CLI argument parsing

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a flow file and execute it; Ctrl-C stops the flow
    Run {
        /// Flow file (.json, .yaml or .yml), or a flow name in the configured flows directory
        #[arg(value_name = "FILE")]
        file: String
    },
    /// Load a flow file and validate it without executing it
    Check {
        #[arg(value_name = "FILE")]
        file: String
    },
    /// List the registered actor and condition classes
    List {
        /// Only show classes whose key contains this text
        filter: Option<String>
    },
    /// Show the options of a class
    Help {
        /// Class key, e.g. 'sources.ForLoop'
        class: String
    },
    /// Convert a flow file between JSON and YAML
    Convert {
        #[arg(value_name = "INPUT")]
        input:  String,
        #[arg(value_name = "OUTPUT")]
        output: String,
        /// Also write options that are left at their default value
        #[arg(long)]
        all:    bool
    }
}
