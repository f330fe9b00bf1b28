pub mod cache;
pub mod config;
pub mod mcp;
pub mod prompt;
pub mod validate;
