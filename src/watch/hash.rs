// src/watch/hash.rs

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;

/// Compute the hash of a single file.
pub fn compute_file_hash(path: &Path) -> Result<String> {
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
    Ok(hasher.finalize().to_hex().to_string())
}

/// Last seen content hash of every watched file.
///
/// Lets `use_hash = true` rules ignore events that did not change content
/// (touch, editor save without edits, metadata updates).
#[derive(Debug, Default)]
pub struct ContentTracker {
    hashes: HashMap<PathBuf, String>,
}

impl ContentTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current content of `paths` without reporting changes.
    pub fn prime<I, P>(&mut self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        for path in paths {
            let path = path.as_ref();
            match compute_file_hash(path) {
                Ok(hash) => {
                    self.hashes.insert(path.to_path_buf(), hash);
                }
                Err(err) => debug!(?path, error = %err, "could not prime hash"),
            }
        }
        debug!(files = self.hashes.len(), "primed content hashes");
    }

    /// Returns true if the content of `path` differs from the last observed
    /// content, and remembers the new content.
    ///
    /// A file that cannot be read (deleted, renamed away) counts as changed
    /// the first time and is forgotten.
    pub fn has_changed(&mut self, path: &Path) -> bool {
        match compute_file_hash(path) {
            Ok(hash) => {
                let previous = self.hashes.insert(path.to_path_buf(), hash.clone());
                previous.as_deref() != Some(hash.as_str())
            }
            Err(_) => self.hashes.remove(path).is_some(),
        }
    }
}
