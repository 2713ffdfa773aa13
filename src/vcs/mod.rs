//! The process-driven refresh engine.
//!
//! Every view is filled by running the `svn` client as a child process and
//! folding its output into a sorted collection while it runs.

pub mod action;
pub mod classifier;
pub mod command;
pub mod expansion;
pub mod list;
pub mod listing;
pub mod process;
pub mod selection;
pub mod tree;
pub mod watcher;

#[cfg(test)]
pub mod test_support;
