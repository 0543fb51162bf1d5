//! Failures in the runtime adapter itself.
//!
//! A successfully *running* collective never surfaces an error (see the
//! crate-level docs): a missing participant spins forever, a serialization
//! failure panics. What can fail, and fail recoverably, is standing the
//! runtime up in the first place — spawning rank threads or parsing a
//! [`crate::config::Configuration`] from command-line arguments.

use std::fmt;

/// Errors raised while constructing or configuring a [`crate::World`].
#[derive(Debug)]
pub enum CollectivesError {
    /// A rank thread could not be spawned.
    Spawn(std::io::Error),
    /// Command-line arguments could not be parsed into a [`crate::config::Configuration`].
    Parse(String),
}

impl fmt::Display for CollectivesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectivesError::Spawn(e) => write!(f, "failed to spawn rank thread: {e}"),
            CollectivesError::Parse(msg) => write!(f, "failed to parse configuration: {msg}"),
        }
    }
}

impl std::error::Error for CollectivesError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CollectivesError::Spawn(e) => Some(e),
            CollectivesError::Parse(_) => None,
        }
    }
}
