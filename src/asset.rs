// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
//! Binary extraction from downloaded release assets
//!
//! DuckDB ships its CLI as a zip archive on most platforms and as a gzipped
//! binary on some; duckman releases use tar.gz. The format is sniffed from the
//! leading bytes rather than trusted from the URL.

use std::fs;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;
use tracing::debug;

use crate::error::{Error, Result};

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
const TAR_MAGIC_OFFSET: usize = 257;
const TAR_MAGIC: &[u8] = b"ustar";

/// Extract the executable called `binary_name` from a release asset
///
/// `binary_name` is matched against the last path component of archive
/// entries, with or without a `.exe` suffix. A plain gzip stream is taken to
/// be the binary itself.
///
/// # Errors
/// Returns [`Error::Extract`] if the format is unknown, the archive is corrupt
/// or it does not contain the binary
pub fn extract_binary(asset: &[u8], binary_name: &str) -> Result<Vec<u8>> {
    let fail = |reason: String| Error::Extract {
        binary: binary_name.to_string(),
        reason,
    };

    if asset.starts_with(ZIP_MAGIC) {
        debug!("Extracting {binary_name} from zip asset");
        return extract_from_zip(asset, binary_name).map_err(fail);
    }

    if asset.starts_with(GZIP_MAGIC) {
        let mut decoded = Vec::new();
        GzDecoder::new(asset)
            .read_to_end(&mut decoded)
            .map_err(|e| fail(format!("invalid gzip stream: {e}")))?;

        if is_tar(&decoded) {
            debug!("Extracting {binary_name} from tar.gz asset");
            return extract_from_tar(&decoded, binary_name).map_err(fail);
        }
        debug!("Using gzipped asset as {binary_name}");
        return Ok(decoded);
    }

    if is_tar(asset) {
        debug!("Extracting {binary_name} from tar asset");
        return extract_from_tar(asset, binary_name).map_err(fail);
    }

    Err(fail("unrecognized asset format".to_string()))
}

fn is_tar(bytes: &[u8]) -> bool {
    bytes
        .get(TAR_MAGIC_OFFSET..TAR_MAGIC_OFFSET + TAR_MAGIC.len())
        .is_some_and(|magic| magic == TAR_MAGIC)
}

fn matches_binary(path: &Path, binary_name: &str) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| {
            name == binary_name || name.strip_suffix(".exe").is_some_and(|n| n == binary_name)
        })
}

fn extract_from_zip(asset: &[u8], binary_name: &str) -> std::result::Result<Vec<u8>, String> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(asset)).map_err(|e| format!("invalid zip: {e}"))?;

    for index in 0..archive.len() {
        let mut file = archive
            .by_index(index)
            .map_err(|e| format!("invalid zip entry: {e}"))?;
        if !file.is_file() {
            continue;
        }
        let Some(path) = file.enclosed_name() else {
            continue;
        };
        if matches_binary(&path, binary_name) {
            let mut out = Vec::new();
            file.read_to_end(&mut out)
                .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
            return Ok(out);
        }
    }

    Err(format!("{binary_name} not found in archive"))
}

fn extract_from_tar(bytes: &[u8], binary_name: &str) -> std::result::Result<Vec<u8>, String> {
    let mut archive = Archive::new(bytes);

    for entry in archive.entries().map_err(|e| format!("invalid tar: {e}"))? {
        let mut entry = entry.map_err(|e| format!("invalid tar entry: {e}"))?;
        let path = entry
            .path()
            .map_err(|e| format!("invalid tar path: {e}"))?
            .into_owned();
        if entry.header().entry_type().is_file() && matches_binary(&path, binary_name) {
            let mut out = Vec::new();
            entry
                .read_to_end(&mut out)
                .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
            return Ok(out);
        }
    }

    Err(format!("{binary_name} not found in archive"))
}

/// Write a binary to `path` with executable permissions
///
/// The bytes go to a `.part` sibling first and are renamed into place, so a
/// binary that is currently running is replaced rather than truncated.
///
/// # Errors
/// Returns error if writing, setting permissions or renaming fails
pub fn write_executable(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut temp = path.as_os_str().to_owned();
    temp.push(".part");
    let temp = PathBuf::from(temp);

    fs::write(&temp, bytes).map_err(|e| Error::io(&temp, e))?;
    set_executable(&temp)?;
    if let Err(e) = fs::rename(&temp, path) {
        let _ = fs::remove_file(&temp);
        return Err(Error::io(path, e));
    }
    Ok(())
}

#[cfg(unix)]
fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(|e| Error::io(path, e))
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> Result<()> {
    Ok(())
}
