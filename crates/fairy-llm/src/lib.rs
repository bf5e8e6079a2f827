//! # fairy-llm
//!
//! Ollama integration for File Fairy.
//!
//! | Type | Implements | Endpoint |
//! |------|------------|----------|
//! | [`OllamaClient`] | shared HTTP client | `/api/generate`, `/api/embed`, `/api/tags` |
//! | [`LlmSuggester`] | [`fairy_core::Suggester`] | `/api/generate` |
//! | [`OllamaEmbedder`] | [`fairy_core::Embedder`] | `/api/embed` (batched) |
//!
//! Model output is parsed at this boundary: "no answer" responses, including
//! the legacy keyword-failure sentinel, come back as
//! [`SuggestError::NoResult`](fairy_core::SuggestError::NoResult) and never as
//! a plain string.

pub mod client;
pub mod embedder;
pub mod suggester;

pub use client::{OllamaClient, OllamaError, DEFAULT_OLLAMA_URL};
pub use embedder::{OllamaEmbedder, DEFAULT_EMBED_DIMENSION, DEFAULT_EMBED_MODEL};
pub use suggester::{LlmSuggester, DEFAULT_GEN_MODEL};
