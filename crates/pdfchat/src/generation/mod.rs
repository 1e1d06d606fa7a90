//! Answer generation against the local LLM service

pub mod answer;
pub mod classify;
pub mod ollama;
pub mod prompt;

pub use answer::{extract_final_answer, INCOMPLETE_ANSWER};
pub use ollama::OllamaClient;
pub use prompt::PromptBuilder;
