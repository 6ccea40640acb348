// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
//! The default-pointer artifact
//!
//! The selected default version is reachable at one fixed path. Where
//! unprivileged symlinks work that path is a symlink to the installed binary;
//! elsewhere it is a full copy of it.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::platform::Platform;

/// Creates and removes the default-pointer artifact
pub trait DefaultLinker {
    /// Make `link` resolve to the binary at `target`
    ///
    /// # Errors
    /// Returns error if the artifact cannot be created
    fn link(&self, target: &Path, link: &Path) -> Result<()>;

    /// Whether the artifact is a copy that must be refreshed when the target changes
    fn is_copy(&self) -> bool {
        false
    }

    /// Remove the artifact if it exists, including a dangling symlink
    ///
    /// # Errors
    /// Returns error if an existing artifact cannot be removed
    fn unlink(&self, link: &Path) -> Result<()> {
        remove_if_exists(link)
    }
}

/// Symlink from the default path to the installed binary
#[derive(Debug, Default, Clone, Copy)]
pub struct SymlinkLinker;

impl DefaultLinker for SymlinkLinker {
    fn link(&self, target: &Path, link: &Path) -> Result<()> {
        debug!("Symlinking {} -> {}", link.display(), target.display());
        create_symlink(target, link).map_err(|e| Error::io(link, e))
    }
}

/// Byte-for-byte copy of the installed binary at the default path
#[derive(Debug, Default, Clone, Copy)]
pub struct CopyLinker;

impl DefaultLinker for CopyLinker {
    fn link(&self, target: &Path, link: &Path) -> Result<()> {
        debug!("Copying {} -> {}", target.display(), link.display());
        fs::copy(target, link).map_err(|e| Error::io(link, e))?;
        Ok(())
    }

    fn is_copy(&self) -> bool {
        true
    }
}

/// Pick the linker for a platform
#[must_use]
pub fn for_platform(platform: &Platform) -> Box<dyn DefaultLinker> {
    if platform.supports_symlinks() {
        Box::new(SymlinkLinker)
    } else {
        Box::new(CopyLinker)
    }
}

/// Remove a file or symlink if it exists
pub(crate) fn remove_if_exists(path: &Path) -> Result<()> {
    // symlink_metadata also sees broken symlinks
    if fs::symlink_metadata(path).is_ok() {
        debug!("Removing {}", path.display());
        fs::remove_file(path).map_err(|e| Error::io(path, e))?;
    }
    Ok(())
}

#[cfg(unix)]
fn create_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn create_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}
