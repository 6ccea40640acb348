// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
// CLI argument definitions for duckman
//
// Separated from main.rs so that build.rs can include this file
// to generate the man page via clap_mangen.

use clap::{Args, Parser, Subcommand, ValueEnum};

/// CLI argument parser
#[derive(Parser)]
#[command(
    name = "duckman",
    version,
    about = "DuckDB Version Manager",
    disable_version_flag = true
)]
#[command(arg(clap::Arg::new("version").long("version").action(clap::ArgAction::Version).help("Print version")))]
pub struct Cli {
    /// Make the operation more talkative
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Install a specific version of DuckDB
    Install {
        #[arg(value_name = "VERSION")]
        version: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Remove an installed version of DuckDB
    #[command(alias = "remove")]
    Uninstall {
        #[arg(value_name = "VERSION")]
        version: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// List installed versions, or the versions available for download
    #[command(alias = "ls")]
    List {
        /// List the versions available in the release catalog
        #[arg(short, long)]
        remote: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show, set or clear the default version
    Default {
        /// Version to make the default (installed if missing)
        #[arg(value_name = "VERSION", conflicts_with = "unset")]
        version: Option<String>,

        /// Clear the default version
        #[arg(long)]
        unset: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Run a specific version of DuckDB, forwarding all further arguments
    ///
    /// Everything after VERSION goes to duckdb unchanged, including -v and --help.
    #[command(disable_help_flag = true)]
    Run {
        #[arg(value_name = "VERSION")]
        version: String,

        /// Arguments passed to duckdb
        #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Update duckman to the latest release
    UpdateSelf {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Generate shell completion script (only bash is supported currently)
    Completion {
        #[arg(value_name = "SHELL", value_parser = parse_completion_shell)]
        shell: String,
    },

    /// Print version suggestions for shell completion
    #[command(name = "__complete", hide = true)]
    Complete {
        #[arg(value_enum)]
        source: SuggestionSource,
    },
}

/// Flags shared by the subcommands that report progress
///
/// Not global: `run` forwards every argument after the version to duckdb.
#[derive(Args, Clone, Copy, Default)]
pub struct OutputArgs {
    /// Make the operation more talkative
    #[arg(short, long)]
    pub verbose: bool,
}

/// Where completion suggestions come from
#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SuggestionSource {
    Installed,
    Remote,
}

fn parse_completion_shell(s: &str) -> Result<String, String> {
    match s.to_lowercase().as_str() {
        "bash" => Ok(s.to_lowercase()),
        _ => Err(format!("unsupported shell: {s} (only 'bash' is supported)")),
    }
}
