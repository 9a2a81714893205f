//! Sprint-board engine library.
//!
//! Pure kanban ordering and sprint scheduling cores, a drag-session state
//! machine, a snapshot reconciler, and a SQLite-backed reference store
//! behind explicit repository traits.

pub mod board;
pub mod cli;
pub mod config;
pub mod db;
pub mod drag;
pub mod error;
pub mod format;
pub mod ordering;
pub mod service;
pub mod sprints;
pub mod sync;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;
