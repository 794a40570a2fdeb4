//! Language-model integration crate for docqa.
//!
//! This crate provides a provider-agnostic abstraction for single-turn,
//! non-streaming completions. It supports multiple providers through a
//! unified trait-based interface.
//!
//! # Providers
//! - **Ollama**: Local LLM runtime (default)
//! - **OpenAI-compatible**: OpenAI, Groq and any `/chat/completions` endpoint
//!
//! # Example
//! ```no_run
//! use docqa_llm::{create_client, ClientOptions, LlmRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = create_client("ollama", &ClientOptions::default())?;
//! let request = LlmRequest::new("Hello, world!", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::{create_client, ClientOptions};
pub use providers::{OllamaClient, OpenAiCompatClient};
pub use types::ProviderType;
