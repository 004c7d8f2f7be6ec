//! Console input sources.
//!
//! The chat loop reads one line per turn through [`InputSource`] and races
//! the remote call against [`InputSource::interrupted`]. [`TerminalInput`]
//! is the interactive implementation (line editing, Ctrl-C and Ctrl-D as key
//! events); [`StdinInput`] reads piped input and treats SIGINT as Ctrl-C;
//! [`ScriptedInput`] replays a fixed script.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;

use rustyline_async::{Readline, ReadlineEvent, SharedWriter};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::debug;

use crate::error::ChatError;

/// Result of one read from an input source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A full line, without its trailing newline.
    Line(String),
    /// The user pressed Ctrl-C while the prompt was waiting.
    Interrupted,
    /// The input stream closed.
    Eof,
}

/// Boxed future returned by [`InputSource::read_line`].
pub type ReadFuture<'a> = Pin<Box<dyn Future<Output = Result<ReadOutcome, ChatError>> + 'a>>;

/// Boxed future returned by [`InputSource::interrupted`].
pub type InterruptFuture<'a> = Pin<Box<dyn Future<Output = ()> + 'a>>;

/// Where user turns come from.
pub trait InputSource {
    /// Wait for the next line.
    fn read_line(&mut self) -> ReadFuture<'_>;

    /// Resolves when the user interrupts while a reply is pending.
    ///
    /// The default never resolves.
    fn interrupted(&mut self) -> InterruptFuture<'_> {
        Box::pin(std::future::pending())
    }

    /// Whether the source draws its own prompt. When `false` the chat loop
    /// writes the prompt to its output before each read.
    fn shows_prompt(&self) -> bool {
        false
    }
}

// ── Interactive terminal ───────────────────────────────────────────

/// Line editor on an interactive terminal, backed by `rustyline_async`.
///
/// The terminal is in raw mode while this is alive, so Ctrl-C reaches it as
/// a key press rather than a signal. Console output must go through the
/// [`SharedWriter`] returned by [`TerminalInput::new`] so it is printed
/// above the prompt.
pub struct TerminalInput {
    rl: Readline,
}

impl TerminalInput {
    /// Start the line editor with `prompt`.
    pub fn new(prompt: &str) -> Result<(Self, SharedWriter), ChatError> {
        let (rl, out) =
            Readline::new(prompt.to_string()).map_err(|e| ChatError::Input(e.to_string()))?;
        Ok((Self { rl }, out))
    }
}

impl InputSource for TerminalInput {
    fn read_line(&mut self) -> ReadFuture<'_> {
        Box::pin(async move {
            match self.rl.readline().await {
                Ok(ReadlineEvent::Line(line)) => {
                    let _ = self.rl.add_history_entry(line.clone());
                    Ok(ReadOutcome::Line(line))
                }
                Ok(ReadlineEvent::Eof) => Ok(ReadOutcome::Eof),
                Ok(ReadlineEvent::Interrupted) => Ok(ReadOutcome::Interrupted),
                Err(e) => Err(ChatError::Input(e.to_string())),
            }
        })
    }

    fn interrupted(&mut self) -> InterruptFuture<'_> {
        Box::pin(async move {
            loop {
                match self.rl.readline().await {
                    Ok(ReadlineEvent::Interrupted) => return,
                    Ok(ReadlineEvent::Line(line)) => {
                        debug!("Ignoring {} bytes typed while waiting", line.len());
                    }
                    Ok(ReadlineEvent::Eof) => {}
                    Err(e) => {
                        debug!("Terminal unavailable while waiting: {e}");
                        std::future::pending::<()>().await;
                    }
                }
            }
        })
    }

    fn shows_prompt(&self) -> bool {
        true
    }
}

impl Drop for TerminalInput {
    fn drop(&mut self) {
        // Print whatever the shared writer still holds before raw mode ends.
        let _ = self.rl.flush();
    }
}

// ── Piped stdin ────────────────────────────────────────────────────

/// Line reader over the process's standard input, for piped input.
///
/// Ctrl-C (SIGINT) while waiting yields [`ReadOutcome::Interrupted`]
/// instead of killing the process. The underlying read runs on a blocking
/// thread that cannot be cancelled, so the process must exit explicitly once
/// the session ends rather than wait for the runtime to shut down.
pub struct StdinInput {
    lines: Lines<BufReader<Stdin>>,
}

impl StdinInput {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for StdinInput {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSource for StdinInput {
    fn read_line(&mut self) -> ReadFuture<'_> {
        Box::pin(async move {
            tokio::select! {
                line = self.lines.next_line() => match line {
                    Ok(Some(line)) => Ok(ReadOutcome::Line(line.trim_end_matches('\r').to_string())),
                    Ok(None) => Ok(ReadOutcome::Eof),
                    Err(e) => Err(ChatError::Input(e.to_string())),
                },
                _ = ctrl_c() => {
                    debug!("Interrupted while reading input");
                    Ok(ReadOutcome::Interrupted)
                }
            }
        })
    }

    fn interrupted(&mut self) -> InterruptFuture<'_> {
        Box::pin(ctrl_c())
    }
}

/// Wait for Ctrl-C. If the handler cannot be installed, never resolve, so
/// the caller keeps waiting on whatever it raced this against.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        debug!("Ctrl-C handler unavailable: {e}");
        std::future::pending::<()>().await;
    }
}

// ── Scripted ───────────────────────────────────────────────────────

/// Input that replays a fixed sequence of outcomes, then reports end of
/// input.
#[derive(Debug, Default, Clone)]
pub struct ScriptedInput {
    script: VecDeque<ReadOutcome>,
    interrupt_while_waiting: bool,
}

impl ScriptedInput {
    /// Script that yields each line in order.
    pub fn lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: lines
                .into_iter()
                .map(|l| ReadOutcome::Line(l.into()))
                .collect(),
            interrupt_while_waiting: false,
        }
    }

    /// Append an outcome to the end of the script.
    pub fn then(mut self, outcome: ReadOutcome) -> Self {
        self.script.push_back(outcome);
        self
    }

    /// Make [`InputSource::interrupted`] resolve immediately, simulating
    /// Ctrl-C during every pending reply.
    pub fn interrupt_while_waiting(mut self) -> Self {
        self.interrupt_while_waiting = true;
        self
    }
}

impl InputSource for ScriptedInput {
    fn read_line(&mut self) -> ReadFuture<'_> {
        let next = self.script.pop_front().unwrap_or(ReadOutcome::Eof);
        Box::pin(async move { Ok(next) })
    }

    fn interrupted(&mut self) -> InterruptFuture<'_> {
        if self.interrupt_while_waiting {
            Box::pin(async {})
        } else {
            Box::pin(std::future::pending())
        }
    }
}
