//! Configuration, error and common types for TC3 API clients.
//!
//! Client settings are an explicit [`ClientConfig`] value handed to each
//! client at construction time; nothing here is global.

mod config;
mod error;
mod types;

pub use config::ClientConfig;
pub use error::{Tc3Error, Tc3Result};
pub use types::Region;
