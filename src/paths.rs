// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
//! Managed locations on disk and fixed policy constants

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::platform::Platform;

/// Name of the managed binary
pub const DUCKDB_NAME: &str = "duckdb";

/// Directory holding duckman state, relative to the user's home directory
pub const DUCKMAN_DIR: &str = ".duckman";

/// Directory holding installed binaries, relative to [`DUCKMAN_DIR`]
pub const VERSIONS_DIR: &str = "versions";

/// Inventory file name, relative to [`DUCKMAN_DIR`]
pub const INVENTORY_FILE: &str = "config.json";

/// Directory of the default-pointer artifact, relative to the home directory
pub const DEFAULT_BIN_DIR: &str = ".local/bin";

/// Tag prefix the release catalog puts in front of version numbers
pub const TAG_PREFIX: &str = "v";

/// Version identifier of the rolling build
pub const ROLLING_VERSION: &str = "nightly";

/// A rolling build older than this is re-installed before it runs
pub const ROLLING_FRESHNESS_HOURS: i64 = 24;

/// Every location duckman reads or writes
#[derive(Debug, Clone)]
pub struct Paths {
    pub root: PathBuf,
    pub version_dir: PathBuf,
    pub inventory_file: PathBuf,
    pub default_binary: PathBuf,
    platform: Platform,
}

impl Paths {
    /// Locations under the current user's home directory
    ///
    /// # Errors
    /// Returns [`Error::NoHomeDir`] if the home directory cannot be determined
    pub fn detect(platform: Platform) -> Result<Self> {
        let home = home::home_dir().ok_or(Error::NoHomeDir)?;
        Ok(Self::under(&home, platform))
    }

    /// Locations under an explicit home directory
    #[must_use]
    pub fn under(home: &Path, platform: Platform) -> Self {
        let root = home.join(DUCKMAN_DIR);
        Self {
            version_dir: root.join(VERSIONS_DIR),
            inventory_file: root.join(INVENTORY_FILE),
            default_binary: home
                .join(DEFAULT_BIN_DIR)
                .join(platform.executable_name(DUCKDB_NAME)),
            root,
            platform,
        }
    }

    /// Path of the installed binary for a version, `<version_dir>/duckdb-<version>`
    #[must_use]
    pub fn binary_path(&self, version: &str) -> PathBuf {
        self.version_dir.join(
            self.platform
                .executable_name(&format!("{DUCKDB_NAME}-{version}")),
        )
    }

    /// Create the state, versions and default-artifact directories
    ///
    /// # Errors
    /// Returns error if any directory cannot be created
    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.version_dir).map_err(|e| Error::io(&self.version_dir, e))?;
        if let Some(parent) = self.default_binary.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        Ok(())
    }
}
