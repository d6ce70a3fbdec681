pub mod client;
pub mod gemini;
pub mod translator;

pub use client::{LLMClient, LLMError};
pub use gemini::GeminiClient;
pub use translator::{TranslationError, Translator};
