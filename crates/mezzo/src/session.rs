//! The interactive chat loop.
//!
//! [`ChatSession`] is a three-state machine:
//!
//! ```text
//!            line                     reply
//! AwaitingInput ──────▶ AwaitingResponse ──────▶ AwaitingInput
//!      │ quit/exit, Ctrl-C, EOF     │ error, Ctrl-C
//!      ▼                            ▼
//!  Terminated                   Terminated
//! ```
//!
//! Each call to [`ChatSession::step`] performs exactly one transition, so
//! tests can drive the loop turn by turn with a fake endpoint and scripted
//! input. [`ChatSession::run`] steps until the session terminates.

use std::io::Write;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::ChatRequest;
use crate::api::retry::{RetryConfig, retry_api_call};
use crate::config::ChatConfig;
use crate::endpoint::CompletionEndpoint;
use crate::error::ChatError;
use crate::input::{InputSource, ReadOutcome};
use crate::transcript::Transcript;

/// Shown before each user turn.
pub const USER_PROMPT: &str = "YOU: ";

/// Prefix of every printed reply.
pub const REPLY_PREFIX: &str = "MEZZO: ";

/// Commands that end the session (compared case-insensitively, untrimmed).
pub const EXIT_COMMANDS: [&str; 2] = ["quit", "exit"];

/// Why a session ended.
#[derive(Debug)]
pub enum SessionOutcome {
    /// The user typed an exit command.
    UserExit,
    /// The user pressed Ctrl-C.
    Interrupted,
    /// Standard input closed.
    EndOfInput,
    /// A remote call or console operation failed.
    Failed(ChatError),
}

impl SessionOutcome {
    /// Whether the session ended because something went wrong.
    pub fn is_failure(&self) -> bool {
        matches!(self, SessionOutcome::Failed(_))
    }
}

/// Current state of a [`ChatSession`].
#[derive(Debug)]
pub enum ChatState {
    AwaitingInput,
    AwaitingResponse,
    Terminated(SessionOutcome),
}

impl ChatState {
    pub fn is_terminated(&self) -> bool {
        matches!(self, ChatState::Terminated(_))
    }
}

/// Whether `line` asks to leave the session.
pub fn is_exit_command(line: &str) -> bool {
    EXIT_COMMANDS.iter().any(|c| line.eq_ignore_ascii_case(c))
}

/// Startup banner printed before the first prompt.
pub fn banner() -> String {
    let rule = "-".repeat(50);
    format!("{rule}\nMEZZO LOCAL TESTER\nType 'quit' or 'exit' to stop.\n{rule}")
}

/// One interactive chat session.
pub struct ChatSession<E, I, W> {
    endpoint: E,
    input: I,
    out: W,
    model: String,
    temperature: f32,
    retry: RetryConfig,
    transcript: Transcript,
    state: ChatState,
    requests_sent: usize,
}

impl<E, I, W> ChatSession<E, I, W>
where
    E: CompletionEndpoint,
    I: InputSource,
    W: Write,
{
    /// Create a session whose transcript starts with `system_message`.
    ///
    /// Model, temperature, and retry policy are copied from `config`.
    pub fn new(
        endpoint: E,
        input: I,
        out: W,
        config: &ChatConfig,
        system_message: impl Into<String>,
    ) -> Self {
        Self {
            endpoint,
            input,
            out,
            model: config.model.clone(),
            temperature: config.temperature,
            retry: config.retry.clone(),
            transcript: Transcript::new(system_message),
            state: ChatState::AwaitingInput,
            requests_sent: 0,
        }
    }

    pub fn state(&self) -> &ChatState {
        &self.state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Number of turns dispatched to the endpoint (retries not counted).
    pub fn requests_sent(&self) -> usize {
        self.requests_sent
    }

    /// The outcome, once terminated.
    pub fn outcome(&self) -> Option<&SessionOutcome> {
        match &self.state {
            ChatState::Terminated(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Consume the session, returning its transcript and output sink.
    pub fn into_parts(self) -> (Transcript, W) {
        (self.transcript, self.out)
    }

    /// Run until the session terminates.
    pub async fn run(&mut self) -> &SessionOutcome {
        info!(
            model = %self.model,
            temperature = self.temperature,
            "Chat session started"
        );
        while !self.state.is_terminated() {
            self.step().await;
        }

        let elapsed = Utc::now() - self.transcript.started_at();
        info!(
            turns = self.transcript.user_turns(),
            requests = self.requests_sent,
            elapsed_secs = elapsed.num_seconds(),
            "Chat session ended"
        );

        match &self.state {
            ChatState::Terminated(outcome) => outcome,
            _ => unreachable!("loop exits only when terminated"),
        }
    }

    /// Perform one state transition. A no-op once terminated.
    pub async fn step(&mut self) {
        let next = match self.state {
            ChatState::AwaitingInput => self.await_input().await,
            ChatState::AwaitingResponse => self.await_response().await,
            ChatState::Terminated(_) => return,
        };
        self.state = match next {
            Ok(state) => state,
            Err(e) => self.fail(e),
        };
    }

    async fn await_input(&mut self) -> Result<ChatState, ChatError> {
        if !self.input.shows_prompt() {
            write!(self.out, "\n{USER_PROMPT}")?;
            self.out.flush()?;
        }

        match self.input.read_line().await? {
            ReadOutcome::Line(line) if is_exit_command(&line) => {
                debug!("Exit command received");
                Ok(ChatState::Terminated(SessionOutcome::UserExit))
            }
            ReadOutcome::Line(line) => {
                self.transcript.push_user(line)?;
                Ok(ChatState::AwaitingResponse)
            }
            ReadOutcome::Interrupted => {
                self.say_goodbye()?;
                Ok(ChatState::Terminated(SessionOutcome::Interrupted))
            }
            ReadOutcome::Eof => {
                self.say_goodbye()?;
                Ok(ChatState::Terminated(SessionOutcome::EndOfInput))
            }
        }
    }

    async fn await_response(&mut self) -> Result<ChatState, ChatError> {
        let request = ChatRequest::new(
            self.model.clone(),
            self.transcript.messages().to_vec(),
            self.temperature,
        );
        self.requests_sent += 1;
        debug!(
            "Sending turn {} ({} messages)",
            self.requests_sent,
            request.messages.len()
        );

        let endpoint = &self.endpoint;
        let retry = &self.retry;
        // The request is always dispatched before the interrupt is checked.
        let reply = tokio::select! {
            biased;
            result = retry_api_call(retry, || endpoint.complete(&request)) => {
                result.and_then(|completion| completion.into_reply())?
            }
            _ = self.input.interrupted() => {
                self.say_goodbye()?;
                return Ok(ChatState::Terminated(SessionOutcome::Interrupted));
            }
        };

        self.transcript.push_assistant(reply.as_str())?;
        writeln!(self.out, "\n{REPLY_PREFIX}{reply}")?;
        self.out.flush()?;
        Ok(ChatState::AwaitingInput)
    }

    fn say_goodbye(&mut self) -> Result<(), ChatError> {
        writeln!(self.out, "\nExiting...")?;
        self.out.flush()?;
        Ok(())
    }

    fn fail(&mut self, error: ChatError) -> ChatState {
        warn!("Chat session failed: {error}");
        // Nothing more to do if the console itself is gone.
        let _ = writeln!(self.out, "\nError: {error}");
        let _ = self.out.flush();
        ChatState::Terminated(SessionOutcome::Failed(error))
    }
}
