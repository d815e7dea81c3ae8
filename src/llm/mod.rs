//! LLM orchestration: prompt templates, completion backends, structured
//! output parsing, and the primary/secondary fallback policy.

pub mod backend;
pub mod parse;
pub mod prompts;
pub mod resolver;

pub use backend::{CompletionBackend, LlmError, OpenAiBackend, YutoriBackend};
pub use resolver::FallbackResolver;

/// System prompt shared by every completion call.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Model requested from both chat-completion backends.
pub const COMPLETION_MODEL: &str = "gpt-4o-mini";
