// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
//! Platform detection for DuckDB release assets
//!
//! Maps the running OS and architecture onto the keys used by the release
//! catalog, and answers the capability questions the version manager needs
//! (symlinks, process replacement, executable suffix).

use std::fmt;

/// A target platform as named by the release catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    /// Catalog OS key (e.g. "linux", "darwin", "windows")
    pub os: &'static str,
    /// Catalog architecture key (e.g. "amd64", "arm64")
    pub arch: &'static str,
}

impl Platform {
    /// Linux x86_64 platform configuration
    pub const LINUX_AMD64: Platform = Platform {
        os: "linux",
        arch: "amd64",
    };

    /// Linux ARM64 platform configuration
    pub const LINUX_ARM64: Platform = Platform {
        os: "linux",
        arch: "arm64",
    };

    /// macOS x86_64 platform configuration
    pub const DARWIN_AMD64: Platform = Platform {
        os: "darwin",
        arch: "amd64",
    };

    /// macOS ARM64 platform configuration
    pub const DARWIN_ARM64: Platform = Platform {
        os: "darwin",
        arch: "arm64",
    };

    /// Windows x86_64 platform configuration
    pub const WINDOWS_AMD64: Platform = Platform {
        os: "windows",
        arch: "amd64",
    };

    /// Windows ARM64 platform configuration
    pub const WINDOWS_ARM64: Platform = Platform {
        os: "windows",
        arch: "arm64",
    };

    /// Detect the current platform from the runtime environment
    ///
    /// Unknown OS or architecture names are passed through unchanged, so a
    /// lookup in the catalog simply finds no asset for them.
    #[must_use]
    pub fn detect() -> Platform {
        Self::from_parts(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Build a platform from Rust's `std::env::consts` style names
    #[must_use]
    pub fn from_parts(os: &'static str, arch: &'static str) -> Platform {
        let os = match os {
            "macos" => "darwin",
            other => other,
        };
        let arch = match arch {
            "x86_64" | "amd64" => "amd64",
            "aarch64" | "arm64" => "arm64",
            other => other,
        };
        Platform { os, arch }
    }

    #[must_use]
    pub fn is_windows(&self) -> bool {
        self.os == "windows"
    }

    /// Whether an unprivileged process can create symbolic links reliably
    #[must_use]
    pub fn supports_symlinks(&self) -> bool {
        !self.is_windows()
    }

    /// Whether the manager can replace its own process image with the binary
    #[must_use]
    pub fn supports_exec(&self) -> bool {
        cfg!(unix) && !self.is_windows()
    }

    /// File name of an executable on this platform
    ///
    /// # Examples
    /// ```
    /// use duckman::Platform;
    /// assert_eq!(Platform::LINUX_AMD64.executable_name("duckdb-1.1.0"), "duckdb-1.1.0");
    /// assert_eq!(Platform::WINDOWS_AMD64.executable_name("duckdb"), "duckdb.exe");
    /// ```
    #[must_use]
    pub fn executable_name(&self, base: &str) -> String {
        if self.is_windows() {
            format!("{base}.exe")
        } else {
            base.to_string()
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}
