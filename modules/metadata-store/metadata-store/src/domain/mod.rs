pub mod bridge;
pub mod discovery;
pub mod error;
pub mod graph;
mod resolution;
pub mod service;
pub mod service_map;
pub mod validators;
