// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
//! Handing control to the selected binary
//!
//! On Unix the manager's process image is replaced, so a successful launch
//! never returns. Elsewhere the binary runs as a child with inherited streams
//! and its exit code is returned for the caller to exit with.

use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::error::{Error, Result};
use crate::platform::Platform;

/// Runs a binary with forwarded arguments
pub trait ProcessLauncher {
    /// Launch `program` with `args`
    ///
    /// Returns the exit code the manager should terminate with. Launchers that
    /// replace the current process only return on failure.
    ///
    /// # Errors
    /// Returns [`Error::Launch`] if the binary cannot be started
    fn launch(&self, program: &Path, args: &[String]) -> Result<i32>;
}

/// Replace the current process with the binary
#[cfg(unix)]
#[derive(Debug, Default, Clone, Copy)]
pub struct ExecLauncher;

#[cfg(unix)]
impl ProcessLauncher for ExecLauncher {
    fn launch(&self, program: &Path, args: &[String]) -> Result<i32> {
        use std::os::unix::process::CommandExt;

        debug!("exec {} {:?}", program.display(), args);
        let source = Command::new(program).args(args).exec();
        Err(Error::Launch {
            program: program.to_path_buf(),
            source,
        })
    }
}

/// Spawn the binary, wait for it and report its exit code
#[derive(Debug, Default, Clone, Copy)]
pub struct SpawnLauncher;

impl ProcessLauncher for SpawnLauncher {
    fn launch(&self, program: &Path, args: &[String]) -> Result<i32> {
        debug!("spawn {} {:?}", program.display(), args);
        let status = Command::new(program)
            .args(args)
            .status()
            .map_err(|source| Error::Launch {
                program: program.to_path_buf(),
                source,
            })?;
        // Killed by a signal: no code, report failure
        Ok(status.code().unwrap_or(1))
    }
}

/// Pick the launcher for a platform
#[cfg(unix)]
#[must_use]
pub fn for_platform(platform: &Platform) -> Box<dyn ProcessLauncher> {
    if platform.supports_exec() {
        Box::new(ExecLauncher)
    } else {
        Box::new(SpawnLauncher)
    }
}

/// Pick the launcher for a platform
#[cfg(not(unix))]
#[must_use]
pub fn for_platform(_platform: &Platform) -> Box<dyn ProcessLauncher> {
    Box::new(SpawnLauncher)
}
