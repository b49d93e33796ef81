use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the simulation core, configuration and export.
///
/// Every fallible path in the crate returns one of these instead of panicking.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration value or API argument.
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    /// Elastic collision requested for two particles whose centres coincide.
    ///
    /// The line of centres is undefined, so the impulse direction cannot be computed.
    #[error("degenerate collision between particles {i} and {j}: centres coincide")]
    DegenerateCollision { i: usize, j: usize },

    /// Rejection sampling gave up placing a particle without overlap.
    #[error("placement failed: {0}")]
    Placement(String),

    /// Malformed TOML configuration.
    #[error("config parse error: {0}")]
    Config(#[from] toml::de::Error),

    /// Propagated I/O errors (config loading, data export).
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
