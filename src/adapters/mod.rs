pub mod catalog;
pub mod config;
pub mod emitter;
pub mod llm;
pub mod providers;
pub mod store;
