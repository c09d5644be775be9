//! Contract for the stateful channel to the reasoning service.
//!
//! The handle is authoritative for what the service remembers: it keeps every
//! message it was sent and every reply it produced. The loop keeps a local
//! [`Transcript`](crate::core::transcript::Transcript) that mirrors the same
//! sequence, so whenever the loop drops a reply from its mirror it must drop it
//! from the handle too.

use anyhow::Result;

pub trait Conversation {
    /// Send one message and block until the service replies with raw text.
    ///
    /// On error the handle must not retain `message`.
    fn send(&mut self, message: &str) -> Result<String>;

    /// Forget the most recent reply (used for replies that failed to parse).
    fn discard_last_reply(&mut self);
}
