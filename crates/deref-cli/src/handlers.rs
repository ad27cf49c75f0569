//! Command handlers for CLI subcommands
//!
//! This module contains the implementation logic for each CLI subcommand.

mod completions;
mod config;
mod refs;
mod resolve;

pub use completions::handle_completions;
pub use config::handle_config;
pub use refs::handle_refs;
pub use resolve::handle_resolve;
