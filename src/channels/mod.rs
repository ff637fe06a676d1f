//! User-facing surfaces over the wizard.

pub mod cli;

pub use cli::{CliCommand, CliSession, parse_input};
