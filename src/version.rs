// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
//! Version comparison and identifier helpers for DuckDB versions
//!
//! Catalog keys may or may not carry the `v` tag prefix, so every helper here
//! treats `v1.1.0` and `1.1.0` as the same version number.

use std::cmp::Ordering;

use crate::paths::TAG_PREFIX;

/// Remove a leading tag prefix (`v` or `V`) from a version string
///
/// # Examples
/// ```
/// use duckman::version::strip_tag_prefix;
/// assert_eq!(strip_tag_prefix("v0.9.2"), "0.9.2");
/// assert_eq!(strip_tag_prefix("0.9.2"), "0.9.2");
/// assert_eq!(strip_tag_prefix("nightly"), "nightly");
/// ```
#[must_use]
pub fn strip_tag_prefix(version: &str) -> &str {
    match version.strip_prefix(TAG_PREFIX) {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => rest,
        _ => match version.strip_prefix('V') {
            Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => rest,
            _ => version,
        },
    }
}

/// Put the catalog tag prefix in front of a version string
#[must_use]
pub fn with_tag_prefix(version: &str) -> String {
    format!("{TAG_PREFIX}{version}")
}

/// Canonical form used for case- and prefix-insensitive matching
#[must_use]
pub fn normalize(version: &str) -> String {
    strip_tag_prefix(version.trim()).to_lowercase()
}

/// Compare two version strings component-wise
///
/// Numeric components are compared as numbers (`0.10.0` > `0.9.2`). A
/// pre-release (`1.0.0-dev`) sorts before its release and `dev9` sorts before
/// `dev10`. Identifiers without numbers (`nightly`) sort before numbered ones.
/// Equal numbers fall back to a plain string comparison so the order is total.
///
/// # Examples
/// ```
/// use std::cmp::Ordering;
/// use duckman::compare_versions;
/// assert_eq!(compare_versions("0.10.0", "v0.9.2"), Ordering::Greater);
/// assert_eq!(compare_versions("1.0.0-dev1", "1.0.0"), Ordering::Less);
/// ```
#[must_use]
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let parse_version = |v: &str| -> (Vec<u64>, Option<String>) {
        let v = strip_tag_prefix(v);
        let (base, suffix) = match v.split_once('-') {
            Some((base, suffix)) => (base, Some(suffix.to_string())),
            None => (v, None),
        };
        let parts = base
            .split('.')
            .filter_map(|part| part.trim().parse::<u64>().ok())
            .collect();
        (parts, suffix)
    };

    let (a_parts, a_suffix) = parse_version(a);
    let (b_parts, b_suffix) = parse_version(b);

    match (a_parts.is_empty(), b_parts.is_empty()) {
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        _ => {}
    }

    let max_len = a_parts.len().max(b_parts.len());
    for i in 0..max_len {
        let a_part = a_parts.get(i).unwrap_or(&0);
        let b_part = b_parts.get(i).unwrap_or(&0);
        match a_part.cmp(b_part) {
            Ordering::Equal => {}
            other => return other,
        }
    }

    match (a_suffix, b_suffix) {
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (Some(a_suffix), Some(b_suffix)) if a_suffix != b_suffix => {
            compare_suffixes(&a_suffix, &b_suffix)
        }
        _ => a.cmp(b),
    }
}

/// Compare pre-release suffixes, numerically on a shared label (`dev9` < `dev10`)
fn compare_suffixes(a: &str, b: &str) -> Ordering {
    fn split(s: &str) -> (&str, Option<u64>) {
        let label = s.trim_end_matches(|c: char| c.is_ascii_digit());
        (label, s[label.len()..].parse().ok())
    }

    match (split(a), split(b)) {
        ((a_label, Some(a_num)), (b_label, Some(b_num))) if a_label == b_label => {
            a_num.cmp(&b_num).then_with(|| a.cmp(b))
        }
        _ => a.cmp(b),
    }
}

/// Sort version strings in ascending order with [`compare_versions`]
pub fn sort_versions(versions: &mut [String]) {
    versions.sort_by(|a, b| compare_versions(a, b));
}

/// Whether `remote` is strictly newer than `local` as semantic versions
///
/// Returns `None` if either side is not a valid semantic version.
///
/// # Examples
/// ```
/// use duckman::version::is_newer;
/// assert_eq!(is_newer("v0.4.0", "0.3.0"), Some(true));
/// assert_eq!(is_newer("0.3.0", "0.3.0"), Some(false));
/// assert_eq!(is_newer("latest", "0.3.0"), None);
/// ```
#[must_use]
pub fn is_newer(remote: &str, local: &str) -> Option<bool> {
    let remote = semver::Version::parse(strip_tag_prefix(remote.trim())).ok()?;
    let local = semver::Version::parse(strip_tag_prefix(local.trim())).ok()?;
    Some(remote > local)
}
