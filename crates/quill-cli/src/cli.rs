use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "quill")]
#[command(about = "Keep notes in books, offline first, synced when you ask")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// CLI profile name for sync configuration
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a note to a book, creating the book if needed
    #[command(alias = "new")]
    Add {
        /// Book label
        book: String,
        /// Note content (read from stdin when omitted)
        content: Vec<String>,
    },
    /// List books, or the notes of one book
    #[command(alias = "ls")]
    List {
        /// Book label
        book: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove a note
    #[command(alias = "rm")]
    Remove {
        /// Note UUID or unique UUID prefix
        id: String,
    },
    /// Sync local notes with the server
    Sync {
        /// Replay the whole server history instead of recent changes
        #[arg(long)]
        full: bool,
        /// Fetch server changes without uploading local ones
        #[arg(long)]
        pull_only: bool,
    },
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update profile config
    Init {
        /// Profile name to initialize
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// Base URL of the quill server
        #[arg(long, value_name = "URL")]
        api_endpoint: String,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
}
