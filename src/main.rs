// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
//! DuckDB Version Manager (duckman) - Main Application
//!
//! This is the main entry point for the duckman CLI tool, which provides
//! functionality for installing, managing, and switching between different
//! versions of the DuckDB command-line binary.
//!
//! The application supports:
//! - Installing and uninstalling specific versions
//! - Listing installed versions and versions available in the catalog
//! - Selecting a default version reachable at a fixed path
//! - Running any version with forwarded arguments
//! - Updating duckman itself

mod cli;

use std::fs;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, SuggestionSource};
use duckman::asset::write_executable;
use duckman::paths::DUCKDB_NAME;
use duckman::release::DEFAULT_TIMEOUT;
use duckman::{Error, HttpReleaseClient, Paths, Platform, Result, VersionManager};

/// Main application entry point
///
/// Parses command line arguments, dispatches to the command handler and exits
/// with its status. `run` exits with the launched binary's status.
fn main() {
    let cli = Cli::parse();
    let verbose = cli.verbose || subcommand_verbose(&cli.command);
    init_logging(verbose);

    let code = match dispatch(cli.command, verbose) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            1
        }
    };
    exit(code);
}

/// `--verbose` given after a subcommand; `run` has none so its arguments pass through
fn subcommand_verbose(command: &Command) -> bool {
    match command {
        Command::Install { output, .. }
        | Command::Uninstall { output, .. }
        | Command::List { output, .. }
        | Command::Default { output, .. }
        | Command::UpdateSelf { output } => output.verbose,
        Command::Run { .. } | Command::Completion { .. } | Command::Complete { .. } => false,
    }
}

/// Log to stderr; `RUST_LOG` overrides the level chosen by `--verbose`
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("duckman={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn dispatch(command: Command, verbose: bool) -> Result<i32> {
    // Completion generation needs no state
    let command = match command {
        Command::Completion { .. } => {
            print_bash_completion();
            return Ok(0);
        }
        other => other,
    };

    let platform = Platform::detect();
    let paths = Paths::detect(platform)?;
    let client = Box::new(HttpReleaseClient::default());
    let mut manager = VersionManager::load(client, paths, platform)?;

    match command {
        Command::Install { version, .. } => cmd_install(&mut manager, &version)?,
        Command::Uninstall { version, .. } => manager.uninstall(&version)?,
        Command::List { remote, .. } => cmd_list(&manager, remote, verbose)?,
        Command::Default { version, unset, .. } => {
            cmd_default(&mut manager, version.as_deref(), unset, verbose)?;
        }
        Command::Run { version, args } => return manager.run(&version, &args),
        Command::UpdateSelf { .. } => {
            cmd_update_self(&manager)?;
            return Ok(0);
        }
        Command::Complete { source } => {
            cmd_complete(&manager, source);
            return Ok(0);
        }
        Command::Completion { .. } => {}
    }

    manager.check_for_update();
    Ok(0)
}

// =============================================================================
// Command Implementation Functions
// =============================================================================

/// Install a version and report where it went
fn cmd_install(manager: &mut VersionManager, version: &str) -> Result<()> {
    let entry = manager.install(version)?;
    info!("Installed to: {}", entry.location.display());
    Ok(())
}

/// List installed versions, or the versions available in the catalog
///
/// The default version is marked with `*`. In verbose mode installed versions
/// also show the binary location.
fn cmd_list(manager: &VersionManager, remote: bool, verbose: bool) -> Result<()> {
    if remote {
        for version in manager.list_remote()? {
            println!("{version}");
        }
        return Ok(());
    }

    let installed = manager.list_installed();
    if installed.is_empty() {
        eprintln!("No DuckDB versions installed");
        return Ok(());
    }

    let default = manager.default_version().map(|entry| entry.version.clone());
    for entry in installed {
        let marker = if default.as_deref() == Some(entry.version.as_str()) {
            "*"
        } else {
            " "
        };
        if verbose {
            println!("{marker} {} ({})", entry.version, entry.location.display());
        } else {
            println!("{marker} {}", entry.version);
        }
    }
    Ok(())
}

/// Show, set or clear the default version
fn cmd_default(
    manager: &mut VersionManager,
    version: Option<&str>,
    unset: bool,
    verbose: bool,
) -> Result<()> {
    if unset {
        manager.set_default(None)?;
        info!("Default version cleared");
        return Ok(());
    }

    let Some(version) = version else {
        match manager.default_version() {
            Some(entry) => println!("{}", entry.version),
            None => eprintln!("No default version set"),
        }
        return Ok(());
    };

    manager.set_default(Some(version))?;
    if verbose {
        check_path_warnings(&manager.paths().default_binary);
    }
    Ok(())
}

/// Print one version per line for shell completion; never fails
fn cmd_complete(manager: &VersionManager, source: SuggestionSource) {
    let versions = match source {
        SuggestionSource::Installed => manager.installed_suggestions(),
        SuggestionSource::Remote => manager.remote_suggestions(),
    };
    for version in versions {
        println!("{version}");
    }
}

/// Update duckman to the latest release
///
/// If already on the latest version, prints a message and shows the current
/// version.
fn cmd_update_self(manager: &VersionManager) -> Result<()> {
    let current_version = env!("CARGO_PKG_VERSION");
    info!("Current version: {current_version}");

    let Some(release) = manager.newer_self_release(DEFAULT_TIMEOUT)? else {
        println!("duckman is already up to date (version {current_version})");
        return Ok(());
    };
    info!("Latest version: {}", release.version);

    let binary = manager.download_self(&release)?;

    let current_exe =
        std::env::current_exe().map_err(|e| Error::io("<current executable>", e))?;
    let temp_path = current_exe.with_extension("update");
    write_executable(&temp_path, &binary)?;

    replace_binary(&temp_path, &current_exe)?;

    println!(
        "Updated duckman from {current_version} to {}",
        release.version
    );
    Ok(())
}

/// Replace the current binary with the new one
fn replace_binary(new_binary: &Path, current_binary: &Path) -> Result<()> {
    // A running binary can be renamed away but not overwritten in place
    let old_path = current_binary.with_extension("old");

    let _ = fs::remove_file(&old_path);

    fs::rename(current_binary, &old_path).map_err(|e| Error::io(current_binary, e))?;

    if let Err(e) = fs::rename(new_binary, current_binary) {
        let _ = fs::rename(&old_path, current_binary);
        return Err(Error::io(current_binary, e));
    }

    // Windows keeps the running image locked; the backup is cleaned up next time
    let _ = fs::remove_file(&old_path);

    Ok(())
}

/// Warn about PATH problems that hide the default DuckDB
///
/// Warns if the directory of the default artifact is not in `$PATH`, or if
/// another `duckdb` earlier in `$PATH` shadows the managed one.
fn check_path_warnings(default_binary: &Path) {
    let Some(bin_dir) = default_binary.parent() else {
        return;
    };

    let Some(path_var) = std::env::var_os("PATH") else {
        warn!("Could not read $PATH environment variable");
        return;
    };

    let is_in_path = std::env::split_paths(&path_var).any(|dir| same_path(&dir, bin_dir));
    if !is_in_path {
        warn!("{} is not in your $PATH", bin_dir.display());
        return;
    }

    match which::which(DUCKDB_NAME) {
        Ok(found) if !same_path(&found, default_binary) => {
            warn!(
                "{} shadows the default DuckDB at {}",
                found.display(),
                default_binary.display()
            );
        }
        Ok(_) => {}
        Err(e) => warn!("{DUCKDB_NAME} not found in $PATH: {e}"),
    }
}

/// Compare paths after resolving symlinks, falling back to the paths as given
fn same_path(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Print bash completion script
fn print_bash_completion() {
    print!("{BASH_COMPLETION}");
}

const BASH_COMPLETION: &str = r#"# bash completion for duckman

_duckman_versions() {
    compgen -W "$(duckman __complete "$1" 2>/dev/null)" -- "$2"
}

_duckman_completions() {
    local cur subcommand i positional
    COMPREPLY=()
    cur="${COMP_WORDS[COMP_CWORD]}"
    subcommand=""

    for ((i = 1; i < COMP_CWORD; i++)); do
        if [[ "${COMP_WORDS[i]}" != -* ]]; then
            subcommand="${COMP_WORDS[i]}"
            break
        fi
    done

    if [[ -z "${subcommand}" ]]; then
        if [[ "${cur}" == -* ]]; then
            COMPREPLY=($(compgen -W "-h --help -v --verbose --version" -- "${cur}"))
        else
            COMPREPLY=($(compgen -W "install uninstall list default run update-self completion help" -- "${cur}"))
        fi
        return
    fi

    # Count positionals after the subcommand; only the first one is a version
    positional=0
    for ((i = i + 1; i < COMP_CWORD; i++)); do
        if [[ "${COMP_WORDS[i]}" != -* ]]; then
            positional=$((positional + 1))
        fi
    done

    case "${subcommand}" in
        install)
            if ((positional == 0)); then
                COMPREPLY=($(_duckman_versions remote "${cur}"))
            fi
            ;;
        uninstall | remove | run)
            if ((positional == 0)); then
                COMPREPLY=($(_duckman_versions installed "${cur}"))
            fi
            ;;
        default)
            if [[ "${cur}" == -* ]]; then
                COMPREPLY=($(compgen -W "--unset -v --verbose" -- "${cur}"))
            elif ((positional == 0)); then
                COMPREPLY=($(_duckman_versions installed "${cur}"))
            fi
            ;;
        list | ls)
            COMPREPLY=($(compgen -W "-r --remote -v --verbose" -- "${cur}"))
            ;;
        completion)
            COMPREPLY=($(compgen -W "bash" -- "${cur}"))
            ;;
    esac
}

complete -o nosort -o default -F _duckman_completions duckman
"#;
