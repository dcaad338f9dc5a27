//! CLI subcommand implementations.

pub mod afk;
pub mod bounds;
pub mod timeline;
mod util;
