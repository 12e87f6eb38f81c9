// src/step/checksum.rs

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;

/// Compute the blake3 hex digest of a single file's contents.
pub fn checksum_file(path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();

    let mut file =
        File::open(path).with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    let hash = hasher.finalize().to_hex().to_string();
    debug!(path = ?path, hash = %hash, "hashed file");
    Ok(hash)
}

/// Compute the blake3 hex digest of an in-memory byte string.
pub fn checksum_bytes(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// Combine `(name, checksum)` pairs into a single digest.
///
/// Pairs are sorted by name before hashing, so the result is independent of
/// the order in which the caller collected them.
pub fn checksum_pairs(mut pairs: Vec<(String, String)>) -> String {
    pairs.sort();

    let mut hasher = Hasher::new();
    for (name, checksum) in &pairs {
        hasher.update(name.as_bytes());
        hasher.update(b"\0");
        hasher.update(checksum.as_bytes());
        hasher.update(b"\n");
    }
    hasher.finalize().to_hex().to_string()
}
