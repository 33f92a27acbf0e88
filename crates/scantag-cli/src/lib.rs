//! Scantag CLI library components.
//!
//! The `scantag` binary is in `main.rs`; the commands it dispatches to and
//! the terminal summaries live here.

pub mod commands;
pub mod display;
