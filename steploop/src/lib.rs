//! Interactive plan/action/observe agent loop.
//!
//! A user query is handed to a reasoning service that answers one JSON step at
//! a time. The loop parses each step, dispatches action steps to a small set of
//! local tools (behind a confirmation prompt for side effects) and feeds the
//! results back until the model emits an output step. The crate enforces a
//! strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (step parsing, transcript, path
//!   resolution). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting adapters (terminal, shell, Gemini, config).
//!   Each sits behind a trait so tests can script it.
//!
//! [`tools`], [`gate`] and [`controller`] combine the two into the loop itself.

pub mod controller;
pub mod core;
pub mod exit_codes;
pub mod gate;
pub mod io;
pub mod logging;
pub mod render;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod tools;
