use clap::{Parser, Subcommand};

pub const DEFAULT_SERVER: &str = "http://127.0.0.1:3000";

#[derive(Debug, Parser)]
#[command(name = "onething", version, about = "Find your ONE Thing for today")]
pub struct Cli {
    /// OneThing server root URL
    #[arg(long, global = true, default_value = DEFAULT_SERVER)]
    pub server: String,

    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List tasks and today's ONE Thing
    List,
    /// Add a task to the backlog
    Add {
        title: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Toggle a task's completed flag
    Done { id: String },
    /// Delete a task
    Delete { id: String },
    /// Move a task to another tier (one-thing, supporting, if-time, backlog)
    Tier { id: String, tier: String },
    /// Start the interactive morning briefing
    Brief,
}
