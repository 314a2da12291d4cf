//! Vector file loading.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

use crate::core::vector::VectorSuite;

/// A parsed vector file plus the SHA-256 of its bytes.
#[derive(Debug, Clone)]
pub struct LoadedVectors {
    pub suite: VectorSuite,
    pub digest: String,
}

/// Read and parse a vector file. Unreadable or malformed files are fatal.
pub fn load_vectors(path: &Path) -> Result<LoadedVectors> {
    let contents =
        fs::read(path).with_context(|| format!("read vectors {}", path.display()))?;
    let text = std::str::from_utf8(&contents)
        .with_context(|| format!("vectors {} are not UTF-8", path.display()))?;
    let suite =
        VectorSuite::load_str(text).with_context(|| format!("load vectors {}", path.display()))?;
    Ok(LoadedVectors {
        suite,
        digest: sha256_hex(&contents),
    })
}

fn sha256_hex(contents: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(contents);
    hex::encode(hasher.finalize())
}
