// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
//! Persisted inventory of installed DuckDB versions
//!
//! The inventory is a single pretty-printed JSON file holding every installed
//! version and the selected default. It is loaded once per invocation and
//! rewritten in full after each mutation. There is no locking: two concurrent
//! writers race and the last one wins, but the file itself is replaced with a
//! rename so a reader never sees a half-written inventory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::paths::{ROLLING_FRESHNESS_HOURS, ROLLING_VERSION};
use crate::version::{normalize, strip_tag_prefix, with_tag_prefix};

static SAVE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// One locally installed binary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledVersion {
    /// Version key as supplied by the release catalog (e.g. "v1.1.0")
    pub version: String,
    /// Absolute path of the installed binary
    pub location: PathBuf,
    /// When the binary was installed
    pub installed_at: DateTime<Utc>,
}

impl InstalledVersion {
    #[must_use]
    pub fn is_rolling(&self) -> bool {
        self.version == ROLLING_VERSION
    }

    /// Whether this is a rolling build older than the freshness window at `now`
    #[must_use]
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.is_rolling()
            && now.signed_duration_since(self.installed_at)
                > Duration::hours(ROLLING_FRESHNESS_HOURS)
    }
}

/// Installed versions plus the selected default
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inventory {
    #[serde(default)]
    pub installed: BTreeMap<String, InstalledVersion>,
    #[serde(default)]
    pub default_version: Option<String>,
}

impl Inventory {
    /// Load the inventory from disk
    ///
    /// A missing file is an empty inventory.
    ///
    /// # Errors
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No inventory at {}, starting empty", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let inventory = serde_json::from_str(&content).map_err(|source| Error::Serialization {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(inventory)
    }

    /// Write the whole inventory to disk with owner-only permissions
    ///
    /// # Errors
    /// Returns error if serialization or any filesystem step fails
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).map_err(|source| Error::Serialization {
                path: path.to_path_buf(),
                source,
            })?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        // Unique per process and per save, so concurrent writers never share a temp file
        let temp_path = path.with_extension(format!(
            "json.{}.{}.tmp",
            std::process::id(),
            SAVE_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        fs::write(&temp_path, content).map_err(|e| Error::io(&temp_path, e))?;
        set_owner_only(&temp_path)?;

        if let Err(e) = fs::rename(&temp_path, path) {
            let _ = fs::remove_file(&temp_path);
            return Err(Error::io(path, e));
        }

        debug!("Saved inventory to {}", path.display());
        Ok(())
    }

    /// Resolve a user-supplied version to the key it is stored under
    ///
    /// Tries the exact string, then with the tag prefix added, then with it
    /// removed, and finally a case-insensitive match ignoring the prefix.
    #[must_use]
    pub fn resolve_key(&self, version: &str) -> Option<&str> {
        let candidates = [
            version.to_string(),
            with_tag_prefix(version),
            strip_tag_prefix(version).to_string(),
        ];
        for candidate in &candidates {
            if let Some((key, _)) = self.installed.get_key_value(candidate) {
                return Some(key.as_str());
            }
        }

        let wanted = normalize(version);
        self.installed
            .keys()
            .find(|key| normalize(key) == wanted)
            .map(String::as_str)
    }

    /// Look up an installed version with prefix-tolerant matching
    #[must_use]
    pub fn get(&self, version: &str) -> Option<&InstalledVersion> {
        self.resolve_key(version)
            .and_then(|key| self.installed.get(key))
    }

    /// The entry selected as default, if any
    #[must_use]
    pub fn default_entry(&self) -> Option<&InstalledVersion> {
        self.default_version
            .as_deref()
            .and_then(|key| self.installed.get(key))
    }
}

#[cfg(unix)]
fn set_owner_only(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o700)).map_err(|e| Error::io(path, e))
}

#[cfg(not(unix))]
fn set_owner_only(_path: &Path) -> Result<()> {
    Ok(())
}
