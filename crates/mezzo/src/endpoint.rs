//! The seam between the chat loop and the remote completion service.
//!
//! The chat loop only needs "given a request, produce the next completion".
//! [`OpenAiClient`] implements this over HTTP; tests implement it with a
//! scripted fake so every transition runs without network access.

use std::future::Future;
use std::pin::Pin;

use crate::error::ChatError;
use crate::{ChatCompletion, ChatRequest, OpenAiClient};

/// Boxed future returned by [`CompletionEndpoint::complete`].
pub type CompletionFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ChatCompletion, ChatError>> + Send + 'a>>;

/// Something that turns a transcript into the next assistant message.
///
/// # Example
///
/// ```
/// use mezzo::endpoint::{CompletionEndpoint, CompletionFuture};
/// use mezzo::{ChatCompletion, ChatRequest};
///
/// struct Echo;
///
/// impl CompletionEndpoint for Echo {
///     fn complete<'a>(&'a self, request: &'a ChatRequest) -> CompletionFuture<'a> {
///         Box::pin(async move {
///             let last = request.messages.last().map(|m| m.content.clone());
///             Ok(ChatCompletion::text(last.unwrap_or_default()))
///         })
///     }
/// }
/// ```
pub trait CompletionEndpoint: Send + Sync {
    /// Send one request and wait for its completion.
    fn complete<'a>(&'a self, request: &'a ChatRequest) -> CompletionFuture<'a>;
}

impl CompletionEndpoint for OpenAiClient {
    fn complete<'a>(&'a self, request: &'a ChatRequest) -> CompletionFuture<'a> {
        Box::pin(self.chat(request))
    }
}

impl<E: CompletionEndpoint + ?Sized> CompletionEndpoint for &E {
    fn complete<'a>(&'a self, request: &'a ChatRequest) -> CompletionFuture<'a> {
        (**self).complete(request)
    }
}
