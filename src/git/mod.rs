//! Version-control signals.
//!
//! Commit detection over host-delivered repository snapshots.

mod watch;

pub use watch::RepositoryWatch;
