//! Command handlers for CLI subcommands
//!
//! This module contains the implementation logic for each CLI subcommand.

mod completions;
mod config;
mod cursor;
mod inspect;
mod migrate;
mod negotiate;
mod utils;

pub use completions::handle_completions;
pub use config::handle_config;
pub use cursor::handle_cursor;
pub use inspect::{handle_compat, handle_features, handle_versions};
pub use migrate::handle_migrate;
pub use negotiate::{handle_negotiate, handle_route};
