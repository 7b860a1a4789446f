pub mod auth;
pub mod client;
pub mod llm;
pub mod observability;
pub mod persistence;
