//! Generation provider implementations

mod openai;

pub use openai::OpenAiGenerationProvider;
