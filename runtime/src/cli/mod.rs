//! CLI subcommand implementations for the `scout` binary.

pub mod doctor;
pub mod explore_cmd;
pub mod profiles_cmd;
