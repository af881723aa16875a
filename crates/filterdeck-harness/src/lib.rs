#![forbid(unsafe_code)]

//! Scripted drag sessions for filterdeck.
//!
//! Builds a board from a JSON script, replays pointer steps through the drag
//! controller on a fixed frame clock, and reports every transition and the
//! final board as JSON lines.

pub mod cli;
pub mod error;
pub mod logging;
pub mod script;

pub use cli::run_from_env;
pub use error::{HarnessError, Result};
pub use script::{RunReport, Script, Session, Step};
