//! Deterministic, pure logic shared by the loop.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! values (raw model text, paths, transcripts) and are tested in isolation.

pub mod path;
pub mod step;
pub mod transcript;
pub mod types;
