// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
//! DuckDB Version Manager Library
//!
//! This library provides functionality for managing DuckDB CLI versions:
//! the persisted inventory of installed versions, the release catalog client,
//! asset extraction, default-version selection and handing control to the
//! selected binary.

pub mod asset;
pub mod error;
pub mod inventory;
pub mod launcher;
pub mod linker;
pub mod manager;
pub mod paths;
pub mod platform;
pub mod release;
pub mod version;

// Re-export commonly used items at the crate root for convenience
pub use error::{Error, Result};
pub use inventory::{InstalledVersion, Inventory};
pub use manager::VersionManager;
pub use paths::Paths;
pub use platform::Platform;
pub use release::{HttpReleaseClient, ReleaseClient, RemoteRelease};
pub use version::{compare_versions, is_newer, sort_versions, strip_tag_prefix};
