//! Subcommand implementations.

pub mod check;
pub mod clean;
pub mod init;
pub mod output;
pub mod rules;
