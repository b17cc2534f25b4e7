//! Completion provider adapter for an Anthropic-style messages API.

pub mod client;
pub mod error;
pub mod types;

pub use client::AnthropicClient;
pub use error::ApiError;
