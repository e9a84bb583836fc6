pub mod base;
pub mod ollama;

pub mod mock;
