//! API interaction helpers that sit between the chat loop and the endpoint.
//!
//! - [`retry`] — transient error detection (429, 5xx, transport failures)
//!   with configurable exponential backoff and jitter. Never retries 400/401
//!   errors. Disabled unless a retry count is configured.

pub mod retry;

pub use retry::{RetryConfig, retry_api_call};
