//! Interactive confirmation in front of side-effecting tools.

use anyhow::{Result, anyhow};
use tracing::info;

use crate::core::types::DenialPolicy;
use crate::io::terminal::Prompter;

/// Only this exact answer denies; anything else, including an empty line, approves.
pub const DENY_ANSWER: &str = "n";

pub fn is_denial(answer: &str) -> bool {
    answer == DENY_ANSWER
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationGate {
    policy: DenialPolicy,
}

impl ConfirmationGate {
    pub fn new(policy: DenialPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> DenialPolicy {
        self.policy
    }

    /// Ask the user to approve `command_text`. Returns `true` when approved.
    pub fn confirm(&self, prompter: &mut dyn Prompter, command_text: &str) -> Result<bool> {
        let prompt = format!("\n You want to execute this command '{command_text}' (y/n) > ");
        let answer = prompter
            .ask(&prompt)?
            .ok_or_else(|| anyhow!("input closed while waiting for confirmation"))?;
        let approved = !is_denial(&answer);
        info!(command = command_text, approved, "confirmation answered");
        Ok(approved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedPrompter;

    #[test]
    fn only_a_lone_n_denies() {
        assert!(is_denial("n"));
        for answer in ["", "y", "N", "no", " n", "n ", "nope"] {
            assert!(!is_denial(answer), "{answer:?} should approve");
        }
    }

    #[test]
    fn prompt_shows_the_literal_command() {
        let gate = ConfirmationGate::new(DenialPolicy::Report);
        let mut prompter = ScriptedPrompter::new(["n", ""]);
        assert!(!gate.confirm(&mut prompter, "rm -rf build").expect("confirm"));
        assert!(gate.confirm(&mut prompter, "ls").expect("confirm"));
        assert!(prompter.prompts()[0].contains("'rm -rf build'"));
    }

    #[test]
    fn closed_input_is_an_error() {
        let gate = ConfirmationGate::new(DenialPolicy::Terminate);
        let mut prompter = ScriptedPrompter::new(Vec::<String>::new());
        assert!(gate.confirm(&mut prompter, "ls").is_err());
    }
}
