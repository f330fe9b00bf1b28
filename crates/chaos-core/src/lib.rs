pub mod cache;
pub mod capability;
pub mod clock;
pub mod config;
pub mod error;
pub mod io;
pub mod paths;
pub mod prompt;
pub mod store;
pub mod template;
pub mod validator;

pub use error::{ChaosError, Result};
