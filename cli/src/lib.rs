//! Command-line front end for the xcfg package engine.
//!
//! The binary is a thin wrapper: [`cli`] defines the arguments,
//! [`commands`] runs them against the `xcfg` library and maps the outcome to
//! an exit status, and [`error`] covers failures that happen before a
//! package operation starts.

pub mod cli;
pub mod commands;
pub mod error;
