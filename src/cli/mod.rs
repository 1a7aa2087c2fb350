//! Command-line interface support for the `scheck` binary.

pub mod commands;
