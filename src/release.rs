// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
//! Release catalog client
//!
//! The catalog is a set of static JSON documents describing every DuckDB
//! release and where to download it for each platform, plus the latest duckman
//! release for the self-update check.

use std::collections::HashMap;
use std::time::Duration;

use attohttpc::StatusCode;
use attohttpc::header::USER_AGENT;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::platform::Platform;

/// Base URL of the release catalog
pub const CATALOG_BASE: &str =
    "https://raw.githubusercontent.com/NiclasHaderer/duckdb-version-manager/main/versions";

/// Timeout for catalog requests and downloads
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for the best-effort self-update check
pub const UPDATE_CHECK_TIMEOUT: Duration = Duration::from_millis(100);

/// Arch key that matches any architecture of an OS (e.g. macOS universal builds)
const UNIVERSAL_ARCH: &str = "universal";

/// Download descriptor for one platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetInfo {
    pub download_url: String,
}

/// Release metadata as published in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRelease {
    pub version: String,
    /// OS key -> arch key -> download descriptor
    #[serde(default)]
    pub platforms: HashMap<String, HashMap<String, AssetInfo>>,
}

impl RemoteRelease {
    /// Download URL for a platform, falling back to a universal build of its OS
    #[must_use]
    pub fn download_url(&self, platform: &Platform) -> Option<&str> {
        let arches = self.platforms.get(platform.os)?;
        arches
            .get(platform.arch)
            .or_else(|| arches.get(UNIVERSAL_ARCH))
            .map(|asset| asset.download_url.as_str())
    }
}

/// What the version manager needs from the release catalog
pub trait ReleaseClient {
    /// Metadata for one release, [`Error::NotFoundRemote`] if the catalog has no such key
    fn get_release(&self, version: &str) -> Result<RemoteRelease>;

    /// Every release in the catalog
    fn list_releases(&self) -> Result<Vec<RemoteRelease>>;

    /// The latest release of duckman itself
    fn latest_self_release(&self, timeout: Duration) -> Result<RemoteRelease>;

    /// Raw bytes behind a download URL
    fn download(&self, url: &str) -> Result<Vec<u8>>;
}

/// [`ReleaseClient`] over HTTP
#[derive(Debug, Clone)]
pub struct HttpReleaseClient {
    base_url: String,
    timeout: Duration,
}

impl HttpReleaseClient {
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    fn fetch(&self, url: &str, timeout: Duration) -> Result<attohttpc::Response> {
        debug!("GET {url}");
        attohttpc::get(url)
            .header(USER_AGENT, format!("duckman/{}", env!("CARGO_PKG_VERSION")))
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .send()
            .map_err(|e| Error::Download {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }

    fn fetch_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        timeout: Duration,
        missing: impl FnOnce() -> Error,
    ) -> Result<T> {
        let resp = self.fetch(url, timeout)?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(missing());
        }
        if !resp.is_success() {
            return Err(Error::Download {
                url: url.to_string(),
                reason: format!("HTTP {}", resp.status()),
            });
        }

        let body = resp.text().map_err(|e| Error::Download {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&body).map_err(|source| Error::InvalidRelease {
            url: url.to_string(),
            source,
        })
    }
}

impl Default for HttpReleaseClient {
    fn default() -> Self {
        Self::new(CATALOG_BASE)
    }
}

impl ReleaseClient for HttpReleaseClient {
    fn get_release(&self, version: &str) -> Result<RemoteRelease> {
        let url = format!("{}/{version}.json", self.base_url);
        self.fetch_json(&url, self.timeout, || {
            Error::NotFoundRemote(version.to_string())
        })
    }

    fn list_releases(&self) -> Result<Vec<RemoteRelease>> {
        let url = format!("{}/versions.json", self.base_url);
        self.fetch_json(&url, self.timeout, || Error::Download {
            url: url.clone(),
            reason: "HTTP 404 Not Found".to_string(),
        })
    }

    fn latest_self_release(&self, timeout: Duration) -> Result<RemoteRelease> {
        let url = format!("{}/latest-vm.json", self.base_url);
        self.fetch_json(&url, timeout, || Error::NotFoundRemote("duckman".to_string()))
    }

    fn download(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self.fetch(url, self.timeout)?;
        if !resp.is_success() {
            return Err(Error::Download {
                url: url.to_string(),
                reason: format!("HTTP {}", resp.status()),
            });
        }
        resp.bytes().map_err(|e| Error::Download {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}
