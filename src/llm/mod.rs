//! LLM integration for interpreting diagnostic trouble codes.
//!
//! Sends fault text to an OpenAI-compatible chat endpoint (or a local Ollama
//! instance) and returns the model's explanation.

mod client;

pub use client::{
    ChatMessage, CompletionBackend, DtcInterpreter, LlmClient, LlmConfig, LlmError, LlmProvider,
    FALLBACK_INTERPRETATION,
};
