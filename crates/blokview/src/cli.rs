use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "blokview")]
#[command(author, version, about)]
#[command(long_about = "Gesture-driven image viewer core.\n\n\
    Replays pinch, pan and fling gestures against the viewer and reports\n\
    the navigation decisions, callbacks and frames it produces.\n\n\
    Examples:\n  \
    blokview replay demos/swipe.yaml           Replay a gesture script\n  \
    blokview replay demos/swipe.yaml --json    Machine-readable report\n  \
    blokview resolve --items A,B,C --current B Show previous/next\n  \
    blokview config set viewer.transition_ms 250")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replay a gesture script against the viewer
    Replay {
        /// YAML gesture script
        script: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Include every rendered frame in the report
        #[arg(long)]
        frames: bool,
    },

    /// Resolve previous/next neighbours of an item in a list
    Resolve {
        /// Ordered item ids, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        items: Vec<String>,

        /// Id of the item being viewed
        #[arg(long)]
        current: String,

        /// Print the cursor as JSON
        #[arg(long)]
        json: bool,
    },

    /// View and modify configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Display current configuration and the effective settings
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g. viewer.dismiss_fraction, prefetch.enabled)
        key: String,

        /// Value to set
        value: String,
    },

    /// Print the configuration file path
    Path,
}

#[derive(Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        match self.command {
            Some(Commands::Replay {
                script,
                json,
                frames,
            }) => {
                if !script.exists() {
                    anyhow::bail!("File not found: {}", script.display());
                }
                crate::commands::replay::run(&script, json, frames)
            }
            Some(Commands::Resolve {
                items,
                current,
                json,
            }) => crate::commands::resolve::run(&items, &current, json),
            Some(Commands::Config { command }) => crate::commands::config::run(command),
            Some(Commands::Completion { shell }) => {
                crate::commands::completion::run(shell);
                Ok(())
            }
            Some(Commands::Version) => {
                crate::commands::print_version();
                Ok(())
            }
            None => {
                use clap::CommandFactory;
                let mut cmd = Self::command();
                cmd.print_help()?;
                println!();
                Ok(())
            }
        }
    }
}
