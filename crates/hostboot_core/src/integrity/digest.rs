//! SHA-1 content digests with a reusable per-thread context.

use log::error;
use sha1::{Digest, Sha1};
use std::cell::RefCell;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use uuid::Uuid;

/// Hex length of a SHA-1 digest.
pub const DIGEST_HEX_LEN: usize = 40;

const BUFFER_SIZE: usize = 8192;
const SENTINEL_PREFIX: &str = "null (";

thread_local! {
    static HASHER: RefCell<Sha1> = RefCell::new(Sha1::new());
}

/// Lowercase hex digest, or a sentinel that never matches any hash file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HashDigest(String);

impl HashDigest {
    /// Fresh sentinel for a failed hash; two sentinels never compare equal.
    pub fn sentinel() -> Self {
        Self(format!("{SENTINEL_PREFIX}{})", Uuid::new_v4()))
    }

    pub fn is_sentinel(&self) -> bool {
        self.0.starts_with(SENTINEL_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for HashDigest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Digest of in-memory bytes.
pub fn hash_bytes(bytes: &[u8]) -> HashDigest {
    with_hasher(|hasher| {
        hasher.update(bytes);
        HashDigest(hex::encode(hasher.finalize_reset()))
    })
}

/// Digest of the UTF-8 bytes of `text`.
pub fn hash_str(text: &str) -> HashDigest {
    hash_bytes(text.as_bytes())
}

/// Streams `path` through the hasher; returns the sentinel on any I/O failure.
pub fn hash_file(path: &Path) -> HashDigest {
    let result = with_hasher(|hasher| -> std::io::Result<HashDigest> {
        let mut file = File::open(path)?;
        let mut buffer = [0u8; BUFFER_SIZE];
        loop {
            let read = match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(read) => read,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            };
            hasher.update(&buffer[..read]);
        }
        Ok(HashDigest(hex::encode(hasher.finalize_reset())))
    });

    result.unwrap_or_else(|err| {
        error!(
            "event=integrity_hash module=integrity status=error path={} error={}",
            path.display(),
            err
        );
        HashDigest::sentinel()
    })
}

fn with_hasher<T>(task: impl FnOnce(&mut Sha1) -> T) -> T {
    HASHER.with(|cell| {
        let mut hasher = cell.borrow_mut();
        // A previous call may have bailed out mid-stream.
        Digest::reset(&mut *hasher);
        task(&mut hasher)
    })
}
