//! Operator subcommands of `bo-cli`.

pub mod admin;
pub mod migrate;
