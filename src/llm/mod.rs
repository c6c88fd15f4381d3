//! Completion gateway and client abstraction
//!
//! This module wraps the external LLM completion service behind a
//! trait-based client so that the production backend (genai) and the
//! deterministic mock used in tests are interchangeable. The gateway adds
//! the retry/timeout discipline and deterministic prompt construction; the
//! response parser turns a raw completion into compilable source.

mod client;
mod error;
mod gateway;
mod genai;
mod mock;
mod response;
mod types;

pub use client::CompletionClient;
pub use error::{CompletionError, CompletionUnavailableError};
pub use gateway::{build_prompt, CompletionGateway};
pub use genai::GenAiClient;
pub use mock::{MockCompletion, MockCompletionClient};
pub use response::{extract_code, ResponseParseError};
pub use types::{CompletionRequest, CompletionResponse, RawCompletion};
