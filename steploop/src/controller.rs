//! Loop controller: drives one user query through model steps and tool dispatch.
//!
//! Each outer turn walks the state machine
//!
//! ```text
//! Idle -> AwaitingModel -> Dispatching -> AwaitingModel -> ... -> Done -> Idle
//! ```
//!
//! The controller exclusively owns the [`Session`] (tracked working directory
//! and transcript) and the conversation handle. Every turn appended to the
//! transcript corresponds to a message accepted by, or a reply kept by, the
//! handle. Continuation prompts are the only handle messages without a turn.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use crate::core::step::{ParseFailure, Step, parse};
use crate::core::transcript::Transcript;
use crate::core::types::DenialPolicy;
use crate::gate::ConfirmationGate;
use crate::io::conversation::Conversation;
use crate::io::terminal::Prompter;
use crate::tools::{ToolContext, ToolRegistry};

/// Observation fed back when the user denies a command under [`DenialPolicy::Report`].
pub const PERMISSION_DENIED: &str = "Permission denied";

/// REPL prompt for user queries.
pub const QUERY_PROMPT: &str = "\n > ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    AwaitingModel,
    Dispatching,
    Done,
}

/// Mutable state of one session. Never persisted.
#[derive(Debug, Clone)]
pub struct Session {
    cwd: PathBuf,
    transcript: Transcript,
}

impl Session {
    pub fn new(cwd: PathBuf) -> Self {
        Self {
            cwd,
            transcript: Transcript::new(),
        }
    }

    /// Tracked working directory. Independent of the process directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }
}

/// How an outer turn ended.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// The model produced an output step.
    Answered(String),
    /// The model reply did not parse; the turn was dropped.
    Abandoned(ParseFailure),
    /// The user denied a command under the terminate policy.
    Terminated,
    /// `max_steps_per_turn` model calls were made without an output step.
    StepLimitReached { steps: u32 },
    /// The query was `exit`.
    Exit,
}

/// How the REPL ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplExit {
    /// The user typed `exit`.
    Exit,
    /// Input was closed.
    EndOfInput,
    /// A denial under the terminate policy.
    Denied,
}

/// Progress notifications for console rendering.
#[derive(Debug, Clone, Copy)]
pub enum LoopEvent<'a> {
    /// A step decoded from the model.
    Step(&'a Step),
    /// The observation synthesized from a tool result.
    Observation(&'a str),
    ParseFailure(&'a ParseFailure),
}

enum Dispatch {
    Observed(String),
    Terminate,
}

/// Next message for the handle. Its transcript turn is appended once the send succeeds.
enum Outgoing {
    Query(String),
    Continuation,
    Observation(Step),
}

/// Only the literal token ends the session; ` exit ` goes to the model.
pub fn is_exit(query: &str) -> bool {
    query.eq_ignore_ascii_case("exit")
}

pub struct AgentLoop<C, P> {
    conversation: C,
    prompter: P,
    registry: ToolRegistry,
    gate: ConfirmationGate,
    session: Session,
    state: LoopState,
    continuation: String,
    max_steps: Option<u32>,
}

impl<C: Conversation, P: Prompter> AgentLoop<C, P> {
    pub fn new(
        conversation: C,
        prompter: P,
        registry: ToolRegistry,
        gate: ConfirmationGate,
        cwd: PathBuf,
    ) -> Self {
        Self {
            conversation,
            prompter,
            registry,
            gate,
            session: Session::new(cwd),
            state: LoopState::Idle,
            continuation: String::new(),
            max_steps: None,
        }
    }

    /// Message sent after plan and observe steps to ask for the next step.
    pub fn with_continuation(mut self, message: impl Into<String>) -> Self {
        self.continuation = message.into();
        self
    }

    pub fn with_step_limit(mut self, max_steps: Option<u32>) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn conversation(&self) -> &C {
        &self.conversation
    }

    pub fn prompter(&self) -> &P {
        &self.prompter
    }

    /// Read queries until `exit`, end of input, or a terminating denial.
    ///
    /// Infrastructure errors inside a turn are printed and the REPL continues.
    pub fn run_repl<F: FnMut(&LoopEvent<'_>)>(&mut self, mut on_event: F) -> Result<ReplExit> {
        loop {
            let Some(query) = self.prompter.ask(QUERY_PROMPT).context("read query")? else {
                info!("input closed, ending session");
                return Ok(ReplExit::EndOfInput);
            };
            if query.trim().is_empty() {
                continue;
            }
            match self.run_turn(&query, &mut on_event) {
                Ok(TurnOutcome::Exit) => return Ok(ReplExit::Exit),
                Ok(TurnOutcome::Terminated) => return Ok(ReplExit::Denied),
                Ok(TurnOutcome::StepLimitReached { steps }) => {
                    eprintln!("Stopped after {steps} steps without an output step.");
                }
                Ok(TurnOutcome::Answered(_) | TurnOutcome::Abandoned(_)) => {}
                Err(err) => {
                    error!(err = %format!("{err:#}"), "turn failed");
                    eprintln!("{err:#}");
                }
            }
        }
    }

    /// Drive one user query to completion. Always leaves the loop `Idle`.
    #[instrument(skip_all, fields(cwd = %self.session.cwd.display()))]
    pub fn run_turn<F: FnMut(&LoopEvent<'_>)>(
        &mut self,
        query: &str,
        mut on_event: F,
    ) -> Result<TurnOutcome> {
        if is_exit(query) {
            return Ok(TurnOutcome::Exit);
        }
        let outcome = self.drive(query, &mut on_event);
        self.transition(LoopState::Idle);
        outcome
    }

    fn transition(&mut self, next: LoopState) {
        debug!(from = ?self.state, to = ?next, "state transition");
        self.state = next;
    }

    fn drive(
        &mut self,
        query: &str,
        on_event: &mut dyn FnMut(&LoopEvent<'_>),
    ) -> Result<TurnOutcome> {
        self.transition(LoopState::AwaitingModel);

        let mut outgoing = Outgoing::Query(query.to_string());
        let mut steps = 0u32;
        loop {
            if self.max_steps.is_some_and(|max| steps >= max) {
                warn!(steps, "step limit reached");
                return Ok(TurnOutcome::StepLimitReached { steps });
            }
            steps += 1;

            let message = match &outgoing {
                Outgoing::Query(query) => query.clone(),
                Outgoing::Continuation => self.continuation.clone(),
                Outgoing::Observation(observe) => observe.to_text(),
            };
            let raw = self
                .conversation
                .send(&message)
                .context("request next step")?;

            // Only record what the handle accepted.
            match std::mem::replace(&mut outgoing, Outgoing::Continuation) {
                Outgoing::Query(query) => self.session.transcript.push_user(&query),
                Outgoing::Observation(observe) => self.session.transcript.push_step(&observe),
                Outgoing::Continuation => {}
            }

            let step = match parse(&raw) {
                Ok(step) => step,
                Err(failure) => {
                    warn!(reason = %failure.reason, "model reply did not parse");
                    self.conversation.discard_last_reply();
                    on_event(&LoopEvent::ParseFailure(&failure));
                    return Ok(TurnOutcome::Abandoned(failure));
                }
            };
            on_event(&LoopEvent::Step(&step));
            self.session.transcript.push_step(&step);

            match &step {
                Step::Plan { .. } | Step::Observe { .. } => {}
                Step::Action {
                    function, input, ..
                } => {
                    self.transition(LoopState::Dispatching);
                    let content = match self.dispatch(function, input.as_ref())? {
                        Dispatch::Observed(content) => content,
                        Dispatch::Terminate => return Ok(TurnOutcome::Terminated),
                    };
                    let observe = Step::Observe { content };
                    on_event(&LoopEvent::Observation(observe.content()));
                    outgoing = Outgoing::Observation(observe);
                    self.transition(LoopState::AwaitingModel);
                }
                Step::Output { content } => {
                    self.transition(LoopState::Done);
                    return Ok(TurnOutcome::Answered(content.clone()));
                }
            }
        }
    }

    #[instrument(skip(self, input))]
    fn dispatch(&mut self, function: &str, input: Option<&Value>) -> Result<Dispatch> {
        let Some(tool) = self.registry.lookup(function) else {
            warn!("unknown tool requested");
            return Ok(Dispatch::Observed(format!(
                "Unknown tool '{function}'. Available tools: {}",
                self.registry.names().join(", ")
            )));
        };

        if tool.side_effecting(input) {
            let command_text = tool.confirmation_text(input);
            if !self.gate.confirm(&mut self.prompter, &command_text)? {
                return Ok(match self.gate.policy() {
                    DenialPolicy::Terminate => Dispatch::Terminate,
                    DenialPolicy::Report => Dispatch::Observed(PERMISSION_DENIED.to_string()),
                });
            }
        }

        let mut ctx = ToolContext {
            cwd: &self.session.cwd,
            prompter: &mut self.prompter,
        };
        let result = tool
            .execute(input, &mut ctx)
            .with_context(|| format!("execute {function}"))?;

        if let Some(cwd) = result.cwd_change {
            info!(cwd = %cwd.display(), "tracked directory updated");
            self.session.cwd = cwd;
        }
        Ok(Dispatch::Observed(result.output.into_content()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::step::StepKind;
    use crate::test_support::{RecordingShell, ScriptedConversation, ScriptedPrompter};

    fn agent(
        replies: &[&str],
        answers: &[&str],
        policy: DenialPolicy,
    ) -> (
        AgentLoop<ScriptedConversation, ScriptedPrompter>,
        RecordingShell,
    ) {
        let shell = RecordingShell::new();
        let agent = AgentLoop::new(
            ScriptedConversation::new(replies.iter().copied()),
            ScriptedPrompter::new(answers.iter().copied()),
            ToolRegistry::builtin(shell.clone()),
            ConfirmationGate::new(policy),
            PathBuf::from("/work"),
        );
        (agent, shell)
    }

    #[test]
    fn exit_is_case_insensitive_and_touches_nothing() {
        let (mut agent, _) = agent(&[], &[], DenialPolicy::Terminate);
        let outcome = agent.run_turn("EXIT", |_| {}).expect("turn");
        assert_eq!(outcome, TurnOutcome::Exit);
        assert!(agent.session().transcript().is_empty());
        assert!(agent.conversation().sent().is_empty());
    }

    #[test]
    fn plan_then_output_sends_continuation() {
        let (agent, _) = agent(
            &[
                r#"{"step":"plan","content":"think"}"#,
                r#"{"step":"output","content":"hello"}"#,
            ],
            &[],
            DenialPolicy::Terminate,
        );
        let mut agent = agent.with_continuation("next");
        let outcome = agent.run_turn("hi", |_| {}).expect("turn");

        assert_eq!(outcome, TurnOutcome::Answered("hello".to_string()));
        assert_eq!(agent.conversation().sent(), ["hi", "next"]);
        assert_eq!(agent.state(), LoopState::Idle);
        assert_eq!(
            agent.session().transcript().kinds(),
            vec![None, Some(StepKind::Plan), Some(StepKind::Output)]
        );
    }

    #[test]
    fn observation_is_sent_back_to_the_model() {
        let (mut agent, _) = agent(
            &[
                r#"{"step":"action","function":"run_command","input":"cd src"}"#,
                r#"{"step":"output","content":"moved"}"#,
            ],
            &[],
            DenialPolicy::Terminate,
        );
        agent.run_turn("go to src", |_| {}).expect("turn");

        let sent = agent.conversation().sent();
        assert_eq!(
            sent[1],
            r#"{"step":"observe","content":"Changed directory to /work/src"}"#
        );
        assert_eq!(agent.session().cwd(), Path::new("/work/src"));
    }

    #[test]
    fn parse_failure_discards_reply_from_handle() {
        let (mut agent, _) = agent(&["I think you should run ls"], &[], DenialPolicy::Terminate);
        let mut seen = Vec::new();
        let outcome = agent
            .run_turn("list files", |event| {
                if let LoopEvent::ParseFailure(failure) = event {
                    seen.push(failure.raw.clone());
                }
            })
            .expect("turn");

        assert!(matches!(outcome, TurnOutcome::Abandoned(_)));
        assert_eq!(seen, vec!["I think you should run ls".to_string()]);
        assert_eq!(agent.session().transcript().len(), 1);
        assert_eq!(agent.conversation().retained().len(), 1);
    }

    #[test]
    fn step_limit_ends_turn() {
        let (agent, _) = agent(
            &[
                r#"{"step":"plan","content":"a"}"#,
                r#"{"step":"plan","content":"b"}"#,
                r#"{"step":"plan","content":"c"}"#,
            ],
            &[],
            DenialPolicy::Terminate,
        );
        let mut agent = agent.with_step_limit(Some(2));
        let outcome = agent.run_turn("loop", |_| {}).expect("turn");
        assert_eq!(outcome, TurnOutcome::StepLimitReached { steps: 2 });
        assert_eq!(agent.conversation().sent().len(), 2);
    }

    #[test]
    fn conversation_error_leaves_loop_idle() {
        let (mut agent, _) = agent(&[], &[], DenialPolicy::Terminate);
        let err = agent.run_turn("hello", |_| {}).expect_err("no replies");
        assert!(format!("{err:#}").contains("request next step"));
        assert_eq!(agent.state(), LoopState::Idle);
        assert!(agent.session().transcript().is_empty());
        assert!(agent.conversation().retained().is_empty());
    }

    #[test]
    fn step_limit_after_action_keeps_undelivered_observation_out() {
        let (agent, _) = agent(
            &[r#"{"step":"action","function":"run_command","input":"cd x"}"#],
            &[],
            DenialPolicy::Terminate,
        );
        let mut agent = agent.with_step_limit(Some(1));
        let outcome = agent.run_turn("go", |_| {}).expect("turn");

        assert_eq!(outcome, TurnOutcome::StepLimitReached { steps: 1 });
        assert_eq!(agent.session().cwd(), Path::new("/work/x"));
        assert_eq!(
            agent.session().transcript().kinds(),
            vec![None, Some(StepKind::Action)]
        );
        assert_eq!(
            agent.session().transcript().len(),
            agent.conversation().retained().len()
        );
    }

    #[test]
    fn failed_observation_send_keeps_transcript_aligned() {
        let (mut agent, _) = agent(
            &[r#"{"step":"action","function":"run_command","input":"cd x"}"#],
            &[],
            DenialPolicy::Terminate,
        );
        let err = agent.run_turn("go", |_| {}).expect_err("script runs out");

        assert!(format!("{err:#}").contains("request next step"));
        assert_eq!(agent.conversation().sent(), ["go"]);
        assert_eq!(
            agent.session().transcript().kinds(),
            vec![None, Some(StepKind::Action)]
        );
        assert_eq!(
            agent.session().transcript().len(),
            agent.conversation().retained().len()
        );
    }

    #[test]
    fn padded_exit_is_an_ordinary_query() {
        let (mut agent, _) = agent(
            &[r#"{"step":"output","content":"bye"}"#],
            &[],
            DenialPolicy::Terminate,
        );
        let outcome = agent.run_turn(" exit ", |_| {}).expect("turn");
        assert_eq!(outcome, TurnOutcome::Answered("bye".to_string()));
        assert_eq!(agent.conversation().sent(), [" exit "]);
    }

    #[test]
    fn repl_skips_blank_lines_and_stops_on_exit() {
        let (mut agent, _) = agent(
            &[r#"{"step":"output","content":"hi"}"#],
            &["", "hello", "exit"],
            DenialPolicy::Terminate,
        );
        let exit = agent.run_repl(|_| {}).expect("repl");
        assert_eq!(exit, ReplExit::Exit);
        assert_eq!(agent.conversation().sent(), ["hello"]);
    }

    #[test]
    fn repl_reports_end_of_input() {
        let (mut agent, _) = agent(&[], &[], DenialPolicy::Terminate);
        assert_eq!(agent.run_repl(|_| {}).expect("repl"), ReplExit::EndOfInput);
    }
}
