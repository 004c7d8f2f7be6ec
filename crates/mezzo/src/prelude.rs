//! Convenience re-exports for common `mezzo` types.
//!
//! ```ignore
//! use mezzo::prelude::*;
//! ```

pub use crate::{ChatCompletion, ChatError, ChatRequest, Message, MessageRole, OpenAiClient};

pub use crate::api::retry::RetryConfig;
pub use crate::config::ChatConfig;
pub use crate::context::{ContextPaths, SessionContext, load_context, load_session_context};
pub use crate::endpoint::{CompletionEndpoint, CompletionFuture};
pub use crate::input::{InputSource, ReadOutcome, ScriptedInput, StdinInput, TerminalInput};
pub use crate::prompt::{SystemPromptBuilder, compose_system_message};
pub use crate::session::{ChatSession, ChatState, SessionOutcome, banner};
pub use crate::transcript::Transcript;
