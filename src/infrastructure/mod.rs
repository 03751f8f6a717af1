//! Infrastructure layer: provider clients, storage backends and services

pub mod cache;
pub mod embedding;
pub mod generation;
pub mod http_client;
pub mod logging;
pub mod services;
pub mod store;
pub mod web_search;
