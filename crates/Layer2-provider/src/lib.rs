//! # moon-provider
//!
//! Model provider abstraction layer for MoonAgent.
//!
//! ## Features
//! - Single `ModelService` trait for chat completion backends
//! - Moonshot (OpenAI-compatible) implementation with tool calling
//! - Automatic retry with exponential backoff

pub mod error;
pub mod providers;
pub mod retry;
pub mod service;

// Core trait and types
pub use service::{
    ChatRequest, ChatResponse, FinishReason, ModelService, TokenUsage, ToolChoice,
};

// Error and retry
pub use error::ProviderError;
pub use retry::{with_retry, RetryConfig};

// Provider implementations
pub use providers::moonshot::MoonshotProvider;
