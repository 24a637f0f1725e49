//! LLM provider integration for batched type inference.
//!
//! Providers implement a single narrow contract: given a column chunk
//! with sample data, return one inferred type per column or fail. The
//! orchestrator never sees raw payloads — responses cross a strict
//! parse-or-fail boundary first.
//!
//! LLM integration is optional; pgdraft works fully without it using
//! the heuristic classifier.
//!
//! # Supported Providers
//!
//! - **Anthropic** — Claude models via API (requires `ANTHROPIC_API_KEY`)
//! - **Ollama** — local models, no API key needed
//! - **Mock** — deterministic responses for testing

mod anthropic;
mod mock;
mod ollama;
mod prompts;
mod provider;
mod response;

pub use anthropic::AnthropicProvider;
pub use mock::MockProvider;
pub use ollama::OllamaProvider;
pub use provider::{ProviderConfig, TypeInferenceProvider};
pub use response::parse_type_response;
