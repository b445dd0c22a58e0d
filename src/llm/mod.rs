//! LLM gateway: model-family parameter handling, the OpenRouter-backed
//! completion client, and the citation verification/retry workflow wrapped
//! around every call.
//!
//! Port of `original_source/litassist/llm/`.

pub mod api_handlers;
pub mod citation_handler;
pub mod client;
pub mod factory;
pub mod message;
pub mod model_profiles;
pub mod parameter_handler;
pub mod response_parser;
pub mod retry;
pub mod tools;
pub mod verification;

pub use client::LlmClient;
pub use factory::{for_command, get_model_for_command};
pub use message::{Message, Role};
pub use response_parser::{ChatResponse, Usage};
