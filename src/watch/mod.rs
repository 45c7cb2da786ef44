// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling `files` / `exclude` glob patterns per watch rule.
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//! - Coalescing bursts of events into one trigger (debounce).
//! - Optionally comparing content hashes so touch-only saves are ignored.
//!
//! It does **not** know how tasks run; it only turns filesystem changes into
//! task triggers.

pub mod event_handler;
pub mod hash;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use event_handler::ChangeFilter;
pub use hash::{compute_file_hash, ContentTracker};
pub use patterns::WatchProfile;
pub use watcher::{run_event_loop, spawn_watcher, WatcherHandle};
