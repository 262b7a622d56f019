//! socra-ai: prompt formatting and streaming generation
//!
//! This crate turns a conversation into an instruction-delimited prompt and
//! streams the model's answer from a hosted text-generation service as a
//! sequence of growing partial responses.

pub mod error;
pub mod prompt;
pub mod providers;
pub mod stream;
pub mod types;

pub use error::{Error, Result};
pub use prompt::{PromptFormatter, format_prompt};
pub use stream::{PartialResponseStream, ResponseStreamer};
pub use types::*;
