//! Command-line configuration for the bundled demo binaries.
//!
//! Mirrors `timely_communication::Configuration`, minus the `Cluster`
//! variant: this runtime adapter is intra-process only (see the crate docs),
//! so there is no host list or networking to parse. The shape is kept
//! deliberately close to the teacher's so a reader familiar with timely's
//! `-w`/`-p`/`-n` flags recognizes this immediately.

use crate::error::CollectivesError;

/// How many ranks to simulate, and how.
pub enum Configuration {
    /// A single rank, no threads spawned at all.
    Thread,
    /// `n` ranks, each its own OS thread within this process.
    Process(usize),
}

impl Configuration {
    /// Parses a configuration from command-line-style arguments.
    ///
    /// Most commonly `std::env::args()`, skipping the program name.
    pub fn from_args<I: Iterator<Item = String>>(args: I) -> Result<Configuration, CollectivesError> {
        let mut opts = getopts::Options::new();
        opts.optopt("w", "ranks", "number of simulated ranks", "NUM");

        let matches = opts
            .parse(args)
            .map_err(|e| CollectivesError::Parse(e.to_string()))?;

        let ranks = match matches.opt_str("w") {
            Some(text) => text
                .parse::<usize>()
                .map_err(|e| CollectivesError::Parse(format!("invalid rank count {text:?}: {e}")))?,
            None => 1,
        };

        Ok(if ranks > 1 { Configuration::Process(ranks) } else { Configuration::Thread })
    }

    /// The number of ranks this configuration describes.
    pub fn ranks(&self) -> usize {
        match self {
            Configuration::Thread => 1,
            Configuration::Process(n) => *n,
        }
    }
}
