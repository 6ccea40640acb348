// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
//! The version manager
//!
//! Owns the inventory for one invocation and implements every operation on it:
//! install, uninstall, default selection, listing and running. Every mutation
//! ends with the whole inventory being written back to disk, and only after all
//! earlier steps of the operation succeeded.

use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::asset::{extract_binary, write_executable};
use crate::error::{Error, Result};
use crate::inventory::{InstalledVersion, Inventory};
use crate::launcher::{self, ProcessLauncher};
use crate::linker::{self, DefaultLinker};
use crate::paths::{DUCKDB_NAME, Paths, ROLLING_FRESHNESS_HOURS, TAG_PREFIX};
use crate::platform::Platform;
use crate::release::{ReleaseClient, RemoteRelease, UPDATE_CHECK_TIMEOUT};
use crate::version::{compare_versions, is_newer, sort_versions, with_tag_prefix};

/// Name of the manager's own binary inside its release assets
pub const DUCKMAN_NAME: &str = "duckman";

pub struct VersionManager {
    client: Box<dyn ReleaseClient>,
    inventory: Inventory,
    paths: Paths,
    platform: Platform,
    linker: Box<dyn DefaultLinker>,
    launcher: Box<dyn ProcessLauncher>,
}

impl VersionManager {
    /// Load the inventory and pick the linker and launcher for `platform`
    ///
    /// # Errors
    /// Returns error if the inventory file exists but cannot be read
    pub fn load(client: Box<dyn ReleaseClient>, paths: Paths, platform: Platform) -> Result<Self> {
        let inventory = Inventory::load(&paths.inventory_file)?;
        debug!(
            "Loaded inventory with {} installed version(s)",
            inventory.installed.len()
        );
        Ok(Self {
            client,
            inventory,
            linker: linker::for_platform(&platform),
            launcher: launcher::for_platform(&platform),
            paths,
            platform,
        })
    }

    #[must_use]
    pub fn with_linker(mut self, linker: Box<dyn DefaultLinker>) -> Self {
        self.linker = linker;
        self
    }

    #[must_use]
    pub fn with_launcher(mut self, launcher: Box<dyn ProcessLauncher>) -> Self {
        self.launcher = launcher;
        self
    }

    #[must_use]
    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    #[must_use]
    pub fn paths(&self) -> &Paths {
        &self.paths
    }

    #[must_use]
    pub fn platform(&self) -> Platform {
        self.platform
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Whether a version is installed, tolerating a missing or extra tag prefix
    #[must_use]
    pub fn is_installed(&self, version: &str) -> bool {
        self.inventory.resolve_key(version).is_some()
    }

    /// The inventory entry for an installed version
    ///
    /// # Errors
    /// Returns [`Error::NotInstalled`] if the version cannot be resolved
    pub fn local_release_info(&self, version: &str) -> Result<&InstalledVersion> {
        self.inventory
            .get(version)
            .ok_or_else(|| Error::NotInstalled(version.to_string()))
    }

    /// The entry selected as default, if any
    #[must_use]
    pub fn default_version(&self) -> Option<&InstalledVersion> {
        self.inventory.default_entry()
    }

    // =========================================================================
    // Install / Uninstall
    // =========================================================================

    /// Download and install a version, replacing an existing installation of it
    ///
    /// # Errors
    /// Returns error if the release is unknown, has no asset for this platform,
    /// or downloading, extracting or writing fails
    pub fn install(&mut self, version: &str) -> Result<InstalledVersion> {
        self.install_release(version)
            .map_err(|e| e.during("install", version))
    }

    fn install_release(&mut self, version: &str) -> Result<InstalledVersion> {
        let release = self.fetch_release(version)?;
        let url = release
            .download_url(&self.platform)
            .ok_or_else(|| Error::UnsupportedPlatform {
                version: release.version.clone(),
                platform: self.platform.to_string(),
            })?;

        info!("Downloading DuckDB {} from {url}", release.version);
        let asset = self.client.download(url)?;
        let binary = extract_binary(&asset, DUCKDB_NAME)?;

        self.paths.ensure_dirs()?;
        let location = self.paths.binary_path(&release.version);
        write_executable(&location, &binary)?;
        debug!("Wrote {} bytes to {}", binary.len(), location.display());

        let entry = InstalledVersion {
            version: release.version.clone(),
            location,
            installed_at: Utc::now(),
        };

        self.inventory
            .installed
            .insert(entry.version.clone(), entry.clone());

        // A copied default does not follow the file it was copied from
        if self.linker.is_copy()
            && self.inventory.default_version.as_deref() == Some(entry.version.as_str())
        {
            self.replace_default_artifact(&entry.location)?;
        }

        self.save()?;
        info!("Installed DuckDB {}", entry.version);
        Ok(entry)
    }

    /// Look a release up in the catalog, retrying with the tag prefix
    fn fetch_release(&self, version: &str) -> Result<RemoteRelease> {
        match self.client.get_release(version) {
            Err(Error::NotFoundRemote(_)) if !version.starts_with(TAG_PREFIX) => {
                debug!("Release {version} not found, retrying as {TAG_PREFIX}{version}");
                self.client
                    .get_release(&with_tag_prefix(version))
                    .map_err(|e| match e {
                        Error::NotFoundRemote(_) => Error::NotFoundRemote(version.to_string()),
                        other => other,
                    })
            }
            other => other,
        }
    }

    /// Remove an installed version, clearing the default first if it is the default
    ///
    /// # Errors
    /// Returns [`Error::NotInstalled`] if the version is not installed, or an IO
    /// error if the binary or default artifact cannot be removed
    pub fn uninstall(&mut self, version: &str) -> Result<()> {
        self.uninstall_version(version)
            .map_err(|e| e.during("uninstall", version))
    }

    fn uninstall_version(&mut self, version: &str) -> Result<()> {
        let key = self
            .inventory
            .resolve_key(version)
            .ok_or_else(|| Error::NotInstalled(version.to_string()))?
            .to_string();

        if self.inventory.default_version.as_deref() == Some(key.as_str()) {
            debug!("{key} is the default, clearing it first");
            self.clear_default()?;
        }

        if let Some(entry) = self.inventory.installed.get(&key) {
            match fs::remove_file(&entry.location) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!("{} already gone", entry.location.display());
                }
                Err(e) => return Err(Error::io(&entry.location, e)),
            }
        }

        self.inventory.installed.remove(&key);
        self.save()?;
        info!("Uninstalled DuckDB {key}");
        Ok(())
    }

    // =========================================================================
    // Default selection
    // =========================================================================

    /// Select the default version, or clear it with `None`
    ///
    /// A version that is not installed yet is installed first.
    ///
    /// # Errors
    /// Returns error if installing, creating the default artifact or saving fails
    pub fn set_default(&mut self, version: Option<&str>) -> Result<()> {
        match version {
            None => self.clear_default().map_err(|e| e.during("clear", "default")),
            Some(version) => self
                .select_default(version)
                .map_err(|e| e.during("set default", version)),
        }
    }

    fn clear_default(&mut self) -> Result<()> {
        self.linker.unlink(&self.paths.default_binary)?;
        self.inventory.default_version = None;
        self.save()
    }

    fn select_default(&mut self, version: &str) -> Result<()> {
        let entry = match self.inventory.get(version) {
            Some(entry) => entry.clone(),
            None => self.install_release(version)?,
        };

        self.paths.ensure_dirs()?;
        self.replace_default_artifact(&entry.location)?;

        self.inventory.default_version = Some(entry.version.clone());
        self.save()?;
        info!("DuckDB {} is now the default", entry.version);
        Ok(())
    }

    /// Point the default artifact at `target`
    ///
    /// If the new artifact cannot be created the old one is already gone, so
    /// the default is cleared and saved before the error is returned.
    fn replace_default_artifact(&mut self, target: &Path) -> Result<()> {
        self.linker.unlink(&self.paths.default_binary)?;
        if let Err(e) = self.linker.link(target, &self.paths.default_binary) {
            if self.inventory.default_version.take().is_some() {
                self.save()?;
            }
            return Err(e);
        }
        Ok(())
    }

    // =========================================================================
    // Run
    // =========================================================================

    /// Run a version with forwarded arguments, installing it if needed
    ///
    /// Returns the exit code to terminate with. With a process-replacing
    /// launcher a successful launch never returns.
    ///
    /// # Errors
    /// Returns error if installing or launching fails
    pub fn run(&mut self, version: &str, args: &[String]) -> Result<i32> {
        self.run_at(version, args, Utc::now())
    }

    /// [`run`](Self::run) with an explicit current time for the rolling-build check
    ///
    /// # Errors
    /// Returns error if installing or launching fails
    pub fn run_at(&mut self, version: &str, args: &[String], now: DateTime<Utc>) -> Result<i32> {
        self.run_version(version, args, now)
            .map_err(|e| e.during("run", version))
    }

    fn run_version(&mut self, version: &str, args: &[String], now: DateTime<Utc>) -> Result<i32> {
        let mut entry = match self.inventory.get(version) {
            Some(entry) => entry.clone(),
            None => self.install_release(version)?,
        };

        if entry.is_stale(now) {
            info!(
                "{} is older than {ROLLING_FRESHNESS_HOURS}h, re-installing",
                entry.version
            );
            entry = self.install_release(&entry.version)?;
        }

        self.launcher.launch(&entry.location, args)
    }

    // =========================================================================
    // Listing
    // =========================================================================

    /// Installed versions in ascending version order
    #[must_use]
    pub fn list_installed(&self) -> Vec<InstalledVersion> {
        let mut entries: Vec<InstalledVersion> =
            self.inventory.installed.values().cloned().collect();
        entries.sort_by(|a, b| compare_versions(&a.version, &b.version));
        entries
    }

    /// Versions available in the catalog in ascending version order
    ///
    /// # Errors
    /// Returns error if the catalog cannot be fetched
    pub fn list_remote(&self) -> Result<Vec<String>> {
        let mut versions: Vec<String> = self
            .client
            .list_releases()?
            .into_iter()
            .map(|release| release.version)
            .collect();
        sort_versions(&mut versions);
        Ok(versions)
    }

    /// Installed version names for shell completion
    #[must_use]
    pub fn installed_suggestions(&self) -> Vec<String> {
        self.list_installed()
            .into_iter()
            .map(|entry| entry.version)
            .collect()
    }

    /// Catalog version names for shell completion, empty if the catalog is unreachable
    #[must_use]
    pub fn remote_suggestions(&self) -> Vec<String> {
        self.list_remote().unwrap_or_else(|e| {
            debug!("No remote suggestions: {e}");
            Vec::new()
        })
    }

    // =========================================================================
    // Self update
    // =========================================================================

    /// Advisory line if a newer duckman is published, `None` on any failure
    #[must_use]
    pub fn update_advisory(&self) -> Option<String> {
        let latest = match self.client.latest_self_release(UPDATE_CHECK_TIMEOUT) {
            Ok(release) => release,
            Err(e) => {
                debug!("Update check skipped: {e}");
                return None;
            }
        };

        if is_newer(&latest.version, env!("CARGO_PKG_VERSION"))? {
            Some(format!(
                "A new version of duckman is available ({}). Run 'duckman update-self' to update.",
                latest.version
            ))
        } else {
            None
        }
    }

    /// Print the update advisory to stderr if there is one
    pub fn check_for_update(&self) {
        if let Some(advisory) = self.update_advisory() {
            eprintln!("\n{advisory}");
        }
    }

    /// The latest duckman release if it is newer than the running one
    ///
    /// # Errors
    /// Returns error if the catalog cannot be reached
    pub fn newer_self_release(&self, timeout: std::time::Duration) -> Result<Option<RemoteRelease>> {
        let latest = self.client.latest_self_release(timeout)?;
        match is_newer(&latest.version, env!("CARGO_PKG_VERSION")) {
            Some(true) => Ok(Some(latest)),
            _ => Ok(None),
        }
    }

    /// Download a duckman release and extract its binary for this platform
    ///
    /// # Errors
    /// Returns error if the release has no asset for this platform or the
    /// download or extraction fails
    pub fn download_self(&self, release: &RemoteRelease) -> Result<Vec<u8>> {
        let url = release
            .download_url(&self.platform)
            .ok_or_else(|| Error::UnsupportedPlatform {
                version: release.version.clone(),
                platform: self.platform.to_string(),
            })?;
        info!("Downloading duckman {} from {url}", release.version);
        let asset = self.client.download(url)?;
        extract_binary(&asset, DUCKMAN_NAME)
    }

    fn save(&self) -> Result<()> {
        self.inventory.save(&self.paths.inventory_file)
    }
}
