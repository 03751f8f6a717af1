//! Domain layer: entities, provider traits and pure decision logic

pub mod cache;
pub mod document;
pub mod embedding;
mod error;
pub mod generation;
pub mod routing;
pub mod temporal;
pub mod web_search;

pub use error::DomainError;
