//! Content-hash cache and integrity checks for extension archives.
//!
//! # Responsibility
//! - Hash files and byte content with SHA-1 using a per-thread context.
//! - Validate an archive against its hash file.
//! - Copy and download archives before they are handed to the injector.
//!
//! # Invariants
//! - Nothing here panics or escalates: I/O failures are logged and surface as
//!   the sentinel digest, a `false` validation, or a typed error value.
//! - A finished download is renamed into place; a failed one leaves no file at
//!   the destination.

mod digest;
mod fetch;

pub use digest::{hash_bytes, hash_file, hash_str, HashDigest, DIGEST_HEX_LEN};
pub use fetch::{download, fetch_verified, FetchOutcome};

use log::{error, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Suffix of the hash file that certifies an archive, e.g. `core.jar.sha1`.
pub const HASH_FILE_SUFFIX: &str = "sha1";

/// Returns `true` when both files exist and the text of `hash_path` starts with
/// the digest of `file`.
///
/// Trailing bytes after the digest are ignored, including non-UTF-8 ones.
pub fn validate(file: &Path, hash_path: &Path) -> bool {
    if !file.exists() || !hash_path.exists() {
        return false;
    }
    let expected = match std::fs::read(hash_path) {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(
                "event=integrity_validate module=integrity status=error path={} error={}",
                hash_path.display(),
                err
            );
            return false;
        }
    };
    let actual = hash_file(file);
    !actual.is_sentinel() && expected.starts_with(actual.as_str().as_bytes())
}

/// Copies `from` to `to` and returns `to`.
///
/// Failures are logged; the destination is returned either way.
pub fn copy(from: &Path, to: &Path) -> PathBuf {
    if let Err(err) = std::fs::copy(from, to) {
        error!(
            "event=integrity_copy module=integrity status=error from={} to={} error={}",
            from.display(),
            to.display(),
            err
        );
    }
    to.to_path_buf()
}

/// Reads a text file, returning a fresh sentinel string on failure.
///
/// Invalid UTF-8 sequences are replaced, not rejected.
pub fn read_text(path: &Path) -> String {
    match std::fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(err) => {
            warn!(
                "event=integrity_read module=integrity status=error path={} error={}",
                path.display(),
                err
            );
            HashDigest::sentinel().into_string()
        }
    }
}

/// Path of the hash file conventionally paired with `file`.
pub fn hash_file_path(file: &Path) -> PathBuf {
    let mut name = file.as_os_str().to_os_string();
    name.push(".");
    name.push(HASH_FILE_SUFFIX);
    PathBuf::from(name)
}

pub type IntegrityResult<T> = Result<T, IntegrityError>;

/// Integrity cache errors returned by the fetch helpers.
#[derive(Debug)]
pub enum IntegrityError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Transport {
        url: String,
        source: reqwest::Error,
    },
    Status {
        url: String,
        status: u16,
    },
    DigestMismatch {
        path: PathBuf,
        actual: HashDigest,
    },
}

impl Display for IntegrityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "i/o failure at `{}`: {source}", path.display()),
            Self::Transport { url, source } => write!(f, "transfer of `{url}` failed: {source}"),
            Self::Status { url, status } => {
                write!(f, "transfer of `{url}` failed with http status {status}")
            }
            Self::DigestMismatch { path, actual } => write!(
                f,
                "digest of `{}` does not match its hash file (actual: {actual})",
                path.display()
            ),
        }
    }
}

impl Error for IntegrityError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Transport { source, .. } => Some(source),
            Self::Status { .. } | Self::DigestMismatch { .. } => None,
        }
    }
}
