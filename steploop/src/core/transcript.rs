//! Append-only record of the turns exchanged in a session.
//!
//! The transcript mirrors what the conversation handle has been sent and has
//! answered. Only the loop controller appends to it; everything else gets a
//! shared reference.

use serde::{Deserialize, Serialize};

use crate::core::step::{Step, StepKind, parse};

/// Author of a turn. Serialized with the role names the reasoning service uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// One entry in the transcript: raw user text or a serialized step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_user(&mut self, text: &str) {
        self.turns.push(Turn {
            role: Role::User,
            text: text.to_string(),
        });
    }

    pub(crate) fn push_step(&mut self, step: &Step) {
        self.turns.push(Turn {
            role: Role::Model,
            text: step.to_text(),
        });
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Step kind of every turn, `None` for user turns.
    pub fn kinds(&self) -> Vec<Option<StepKind>> {
        self.turns
            .iter()
            .map(|turn| match turn.role {
                Role::User => None,
                Role::Model => parse(&turn.text).ok().map(|step| step.kind()),
            })
            .collect()
    }
}
