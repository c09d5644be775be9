//! I/O adapters for the loop.

pub mod config;
pub mod conversation;
pub mod gemini;
pub mod process;
pub mod prompt;
pub mod terminal;
