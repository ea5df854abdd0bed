//! Host prerequisite rules and the parsers that feed them.
//!
//! This module is intentionally free of I/O, async, and external layer imports.
//! Callers hand in raw command output or file contents and get typed results back.

use regex::Regex;
use semver::Version;

// ── Constants ────────────────────────────────────────────────────────────────

/// Oldest Python that Agent Zero supports.
pub const MIN_PYTHON: Version = Version::new(3, 11, 0);

/// Minimum free space on the install volume.
pub const MIN_FREE_DISK_BYTES: u64 = 2 * 1024 * 1024 * 1024;

/// Debian packages the installer makes sure are present.
pub const REQUIRED_PACKAGES: &[&str] = &[
    "git",
    "curl",
    "python3-venv",
    "python3-pip",
    "python3-dev",
    "build-essential",
];

// ── OS family ────────────────────────────────────────────────────────────────

/// Host OS family, as far as the package installer cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OsFamily {
    /// Debian, Ubuntu, or a derivative that ships `apt-get` and `dpkg`.
    Debian { name: String },
    /// Anything else. Installation proceeds with a warning.
    Unrecognized { name: String },
}

impl OsFamily {
    /// Human-readable distribution name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Debian { name } | Self::Unrecognized { name } => name,
        }
    }

    #[must_use]
    pub fn is_recognized(&self) -> bool {
        matches!(self, Self::Debian { .. })
    }
}

/// Classify the host from the contents of `/etc/os-release`.
///
/// Matches `ID` and `ID_LIKE` against known Debian-family names. Empty input
/// (file missing) yields [`OsFamily::Unrecognized`].
#[must_use]
pub fn classify_os_release(contents: &str) -> OsFamily {
    let mut id = None;
    let mut id_like = String::new();
    let mut pretty = None;

    for line in contents.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"').trim_matches('\'');
        match key.trim() {
            "ID" => id = Some(value.to_ascii_lowercase()),
            "ID_LIKE" => id_like = value.to_ascii_lowercase(),
            "PRETTY_NAME" => pretty = Some(value.to_string()),
            _ => {}
        }
    }

    let name = pretty
        .or_else(|| id.clone())
        .unwrap_or_else(|| "unknown".to_string());

    let known = ["debian", "ubuntu"];
    let matches_known = id.as_deref().is_some_and(|i| known.contains(&i))
        || id_like.split_whitespace().any(|i| known.contains(&i));

    if matches_known {
        OsFamily::Debian { name }
    } else {
        OsFamily::Unrecognized { name }
    }
}

// ── Python version ───────────────────────────────────────────────────────────

/// Extract the interpreter version from `python3 --version` output.
///
/// Accepts `Python 3.12.1`, `Python 3.11` and pre-release suffixes such as
/// `Python 3.13.0rc1`.
#[must_use]
pub fn parse_python_version(output: &str) -> Option<Version> {
    let re = Regex::new(r"Python\s+(\d+)\.(\d+)(?:\.(\d+))?").ok()?;
    let caps = re.captures(output)?;
    let major = caps.get(1)?.as_str().parse().ok()?;
    let minor = caps.get(2)?.as_str().parse().ok()?;
    let patch = caps
        .get(3)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0);
    Some(Version::new(major, minor, patch))
}

/// Returns `true` when `found` satisfies [`MIN_PYTHON`].
#[must_use]
pub fn python_version_ok(found: &Version) -> bool {
    *found >= MIN_PYTHON
}

// ── Disk space ───────────────────────────────────────────────────────────────

/// Available bytes from POSIX `df -Pk <path>` output.
#[must_use]
pub fn parse_df_available_bytes(output: &str) -> Option<u64> {
    output
        .lines()
        .nth(1)
        .and_then(|l| l.split_whitespace().nth(3))
        .and_then(|s| s.parse::<u64>().ok())
        .map(|kib| kib * 1024)
}

/// Whole mebibytes, for diagnostics.
#[must_use]
pub fn bytes_to_mib(bytes: u64) -> u64 {
    bytes / (1024 * 1024)
}

// ── Unit tests ───────────────────────────────────────────────────────────────
