//! Tunegate CLI library.
//!
//! Local realisations of the engine's collaborators (a subprocess
//! synthesizer and a JSON file job store) plus the command implementations
//! behind the `tunegate` binary.

pub mod commands;
pub mod job_store;
pub mod logging;
pub mod subprocess;
