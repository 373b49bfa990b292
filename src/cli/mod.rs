//! Command-line interface
//!
//! Argument definitions and command handlers for the `mediaunlock` binary.

pub mod args;
pub mod commands;
