// src/watch/event_handler.rs

//! Turns raw `notify` events into "does this concern the watch rule?".

use std::path::{Path, PathBuf};

use notify::{Event, EventKind};
use tracing::{debug, warn};

use crate::watch::hash::ContentTracker;
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::WatchProfile;

/// Filter deciding which filesystem events count as a change for one rule.
#[derive(Debug)]
pub struct ChangeFilter {
    root: PathBuf,
    profile: WatchProfile,
    /// Present only for `use_hash = true` rules.
    tracker: Option<ContentTracker>,
}

impl ChangeFilter {
    pub fn new(root: impl Into<PathBuf>, profile: WatchProfile) -> Self {
        let tracker = profile.use_hash().then(ContentTracker::new);
        Self {
            root: root.into(),
            profile,
            tracker,
        }
    }

    /// Seed content hashes for all currently matching files.
    pub fn with_primed_hashes(mut self, files: &[PathBuf]) -> Self {
        if let Some(tracker) = self.tracker.as_mut() {
            tracker.prime(files);
        }
        self
    }

    pub fn profile(&self) -> &WatchProfile {
        &self.profile
    }

    /// Returns true if `event` touches at least one watched path whose
    /// content (when hashing is enabled) actually changed.
    ///
    /// Every path is checked even after a hit so the content hashes stay
    /// current.
    pub fn is_relevant(&mut self, event: &Event) -> bool {
        if matches!(event.kind, EventKind::Access(_)) {
            return false;
        }

        let mut relevant = false;
        for path in &event.paths {
            if self.path_changed(path) {
                relevant = true;
            }
        }
        relevant
    }

    fn path_changed(&mut self, path: &Path) -> bool {
        let Some(rel) = relative_str(&self.root, path) else {
            warn!("could not relativize path {:?} against root {:?}", path, self.root);
            return false;
        };

        if !self.profile.matches(&rel) {
            return false;
        }

        if let Some(tracker) = self.tracker.as_mut() {
            if !tracker.has_changed(path) {
                debug!(
                    rule = %self.profile.rule(),
                    path = %rel,
                    "content unchanged; ignoring event"
                );
                return false;
            }
        }

        debug!(rule = %self.profile.rule(), path = %rel, "watch match");
        true
    }
}

#[cfg(test)]
mod tests {
    use notify::event::{AccessKind, CreateKind, ModifyKind};

    use super::*;
    use crate::task::{WatchRule, DEFAULT_DEBOUNCE};

    fn filter(root: &Path, use_hash: bool) -> ChangeFilter {
        let rule = WatchRule {
            name: "test".to_string(),
            files: vec!["Gruntfile.js".to_string(), "**/*.go".to_string()],
            exclude: vec![],
            task: "test".to_string(),
            at_begin: true,
            debounce: DEFAULT_DEBOUNCE,
            use_hash,
        };
        ChangeFilter::new(root, WatchProfile::from_rule(&rule).unwrap())
    }

    #[test]
    fn matching_modify_event_is_relevant() {
        let root = PathBuf::from("/project");
        let mut f = filter(&root, false);

        let ev = Event::new(EventKind::Modify(ModifyKind::Any)).add_path(root.join("rotation.go"));
        assert!(f.is_relevant(&ev));

        let ev = Event::new(EventKind::Create(CreateKind::File)).add_path(root.join("Gruntfile.js"));
        assert!(f.is_relevant(&ev));
    }

    #[test]
    fn non_matching_and_access_events_are_ignored() {
        let root = PathBuf::from("/project");
        let mut f = filter(&root, false);

        let ev = Event::new(EventKind::Modify(ModifyKind::Any)).add_path(root.join("README.md"));
        assert!(!f.is_relevant(&ev));

        let ev = Event::new(EventKind::Access(AccessKind::Any)).add_path(root.join("main.go"));
        assert!(!f.is_relevant(&ev));

        let ev = Event::new(EventKind::Modify(ModifyKind::Any)).add_path(PathBuf::from("/elsewhere/main.go"));
        assert!(!f.is_relevant(&ev));
    }

    #[test]
    fn hashing_filter_skips_touch_only_events() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("main.go");
        std::fs::write(&file, "package main").unwrap();

        let mut f = filter(dir.path(), true).with_primed_hashes(&[file.clone()]);
        let ev = Event::new(EventKind::Modify(ModifyKind::Any)).add_path(file.clone());

        assert!(!f.is_relevant(&ev));

        std::fs::write(&file, "package main\n\nfunc main() {}").unwrap();
        assert!(f.is_relevant(&ev));
    }
}
