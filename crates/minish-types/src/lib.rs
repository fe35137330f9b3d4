//! Foundation types for minish.
//!
//! This crate contains the types shared by all minish crates: the error
//! taxonomy used from the line reader down to the command handlers, and the
//! TOML-backed shell configuration.

pub mod config;
pub mod error;
