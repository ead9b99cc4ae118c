pub mod anthropic;
pub mod cohere;
pub mod common;
pub mod error;
pub mod gemini;
pub mod ollama;
pub mod openai;

pub use common::{
    ChatMessage, ChatOutput, ChatRequest, ChatRole, CompletionOutput, CompletionRequest,
    GeneratedImage, ImageOutput, ImageRequest, TranscriptionOutput, TranscriptionRequest,
};
pub use error::UpstreamErrorBody;
pub use openai::{OpenaiModel, OpenaiModelList};
