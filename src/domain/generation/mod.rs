//! Text generation domain: messages, parameters and the provider trait

mod provider;

pub use provider::{GenerationParams, GenerationProvider, Message, MessageRole};
#[cfg(test)]
pub use provider::mock;
