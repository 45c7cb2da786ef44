// src/watch/patterns.rs

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::task::WatchRule;
use crate::types::TaskName;

/// Compiled `files` / `exclude` glob patterns for a single watch rule.
///
/// The patterns are relative to the watch root. The watcher passes relative
/// paths with forward slashes (e.g. `"cmd/main.go"`) into [`matches`].
///
/// [`matches`]: WatchProfile::matches
#[derive(Clone)]
pub struct WatchProfile {
    rule: String,
    task: TaskName,
    watch_set: GlobSet,
    exclude_set: Option<GlobSet>,
    use_hash: bool,
}

impl fmt::Debug for WatchProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchProfile")
            .field("rule", &self.rule)
            .field("task", &self.task)
            .finish_non_exhaustive()
    }
}

impl WatchProfile {
    /// Compile the globs of a watch rule.
    pub fn from_rule(rule: &WatchRule) -> Result<Self> {
        let watch_set = build_globset(&rule.files)
            .with_context(|| format!("building watch globset for rule {}", rule.name))?;

        let exclude_set = if rule.exclude.is_empty() {
            None
        } else {
            Some(
                build_globset(&rule.exclude)
                    .with_context(|| format!("building exclude globset for rule {}", rule.name))?,
            )
        };

        Ok(Self {
            rule: rule.name.clone(),
            task: rule.task.clone(),
            watch_set,
            exclude_set,
            use_hash: rule.use_hash,
        })
    }

    /// Name of the watch rule this profile was built from.
    pub fn rule(&self) -> &str {
        &self.rule
    }

    /// Task to trigger on a match.
    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn use_hash(&self) -> bool {
        self.use_hash
    }

    /// Returns true if the given path (relative to the watch root) is
    /// watched by this rule.
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.watch_set.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude_set {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }
}

/// Build a GlobSet from simple string patterns.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Collect all files under `root` that this profile matches.
///
/// Used to seed content hashes for `use_hash = true` rules.
pub fn collect_matching_files(root: &Path, profile: &WatchProfile) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).with_context(|| format!("reading dir {:?}", dir))? {
            let entry = entry?;
            let path = entry.path();
            // Symlinked directories are not descended into.
            if entry.file_type()?.is_dir() {
                stack.push(path);
            } else if path.is_file() {
                if let Ok(rel) = path.strip_prefix(root) {
                    let rel_str = rel.to_string_lossy().replace('\\', "/");
                    if profile.matches(&rel_str) {
                        files.push(path);
                    }
                }
            }
        }
    }

    files.sort();
    Ok(files)
}
