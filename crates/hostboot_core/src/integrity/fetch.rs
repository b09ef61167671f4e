//! Archive download and verified fetch.

use super::{hash_file, hash_file_path, validate, IntegrityError, IntegrityResult};
use log::{error, info};
use reqwest::blocking::Client;
use std::path::Path;
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;

/// How [`fetch_verified`] satisfied the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The local copy already matched its hash file; nothing was transferred.
    Cached,
    /// Both the hash file and the archive were downloaded and verified.
    Fetched,
}

/// Streams `url` into `to`, creating parent directories first.
///
/// The body lands in a temporary file next to `to` and is renamed over it only
/// after the transfer completes. No retry and no timeout: a slow transfer
/// blocks the caller until the server finishes or the connection drops.
///
/// # Errors
/// - Returns [`IntegrityError::Transport`] / [`IntegrityError::Status`] for
///   transfer failures and [`IntegrityError::Io`] for local file failures.
pub fn download(url: &str, to: &Path) -> IntegrityResult<u64> {
    let started_at = Instant::now();
    let result = download_inner(url, to);
    match &result {
        Ok(bytes) => info!(
            "event=integrity_download module=integrity status=ok url={} path={} bytes={} duration_ms={}",
            url,
            to.display(),
            bytes,
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=integrity_download module=integrity status=error url={} path={} duration_ms={} error={}",
            url,
            to.display(),
            started_at.elapsed().as_millis(),
            err
        ),
    }
    result
}

fn download_inner(url: &str, to: &Path) -> IntegrityResult<u64> {
    let parent = to
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(|source| IntegrityError::Io {
        path: parent.to_path_buf(),
        source,
    })?;

    let transport = |source: reqwest::Error| IntegrityError::Transport {
        url: url.to_string(),
        source,
    };
    // The blocking client defaults to a 30s total timeout; transfers here are unbounded.
    let client = Client::builder()
        .timeout(None::<Duration>)
        .build()
        .map_err(transport)?;
    let mut response = client.get(url).send().map_err(transport)?;
    let status = response.status();
    if !status.is_success() {
        return Err(IntegrityError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let mut staging = NamedTempFile::new_in(parent).map_err(|source| IntegrityError::Io {
        path: parent.to_path_buf(),
        source,
    })?;
    let written = response
        .copy_to(staging.as_file_mut())
        .map_err(transport)?;
    staging.persist(to).map_err(|err| IntegrityError::Io {
        path: to.to_path_buf(),
        source: err.error,
    })?;
    Ok(written)
}

/// Makes sure `dest` holds the archive certified by the hash file at `hash_url`.
///
/// The hash file is stored next to the archive as `<dest>.sha1`.
///
/// # Errors
/// - Propagates download failures.
/// - Returns [`IntegrityError::DigestMismatch`] when the downloaded archive
///   does not match the downloaded hash file.
pub fn fetch_verified(url: &str, hash_url: &str, dest: &Path) -> IntegrityResult<FetchOutcome> {
    let hash_path = hash_file_path(dest);
    if validate(dest, &hash_path) {
        return Ok(FetchOutcome::Cached);
    }

    download(hash_url, &hash_path)?;
    download(url, dest)?;
    if validate(dest, &hash_path) {
        return Ok(FetchOutcome::Fetched);
    }
    Err(IntegrityError::DigestMismatch {
        path: dest.to_path_buf(),
        actual: hash_file(dest),
    })
}
