//! Error types for shared configuration.

/// Core error type.
#[derive(Debug, thiserror::Error)]
pub enum Tc3Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience result type.
pub type Tc3Result<T> = Result<T, Tc3Error>;
