use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "claude-plugins")]
#[command(about = "Install and manage tool plugins for the Claude agent backend")]
#[command(version)]
pub struct Cli {
    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Global plugin directory (default: ~/.claude-plugins)
    #[arg(long, global = true)]
    pub base_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install a plugin
    #[command(visible_alias = "i")]
    Install {
        /// Plugin name, name@version, ./local/path, github:owner/repo[#ref] or owner/repo
        identifier: String,

        /// Install to ~/.claude-plugins instead of the project
        #[arg(short, long)]
        global: bool,

        /// Reinstall even if already installed
        #[arg(short, long)]
        force: bool,

        /// Registry base URL
        #[arg(long)]
        registry: Option<String>,
    },

    /// List installed plugins
    #[command(visible_alias = "ls")]
    List {
        /// Show every plugin available in the registry
        #[arg(short, long)]
        all: bool,

        /// Registry base URL
        #[arg(long)]
        registry: Option<String>,
    },

    /// Remove an installed plugin
    #[command(visible_alias = "rm")]
    Remove {
        /// Plugin id
        identifier: String,

        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },

    /// Show plugin details
    Info {
        /// Plugin id (installed or in the registry)
        identifier: String,

        /// Registry base URL
        #[arg(long)]
        registry: Option<String>,
    },

    /// Search the plugin registry
    Search {
        /// Search query (matches id, name, description, keywords, tools)
        query: String,

        /// Registry base URL
        #[arg(long)]
        registry: Option<String>,
    },

    /// Enable an installed plugin
    Enable {
        /// Plugin id
        identifier: String,
    },

    /// Disable an installed plugin (kept on disk, hidden from the backend)
    Disable {
        /// Plugin id
        identifier: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g., registry.url)
        key: String,
    },

    /// Set a config value
    Set {
        /// Config key (e.g., install.exclude)
        key: String,

        /// Value to set (e.g., ".git,__pycache__" or "[.git, __pycache__]")
        value: String,
    },

    /// List all config values
    List,

    /// Show config file path
    Path,

    /// Initialize config file with defaults
    Init,
}
