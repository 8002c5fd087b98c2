//! Error types for the FDTD core
//!
//! Four kinds of failure can occur while building or stepping a `Domain`:
//! bad configuration, allocation failure, an I/O failure surfaced by an
//! output adapter, and numeric degeneracy (a grid too small to have an
//! interior). All core operations that can fail return `SimResult<T>`.

use thiserror::Error;

/// Error kinds reported by the FDTD core.
#[derive(Debug, Error)]
pub enum SimError {
    /// Unknown polarization string, negative/zero grid dimensions, or a
    /// shape/frequency tuple whose length doesn't match any valid prefix.
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    /// A grid allocation failed (capacity overflow or OOM in practice).
    #[error("allocation failed: {0}")]
    AllocationFailed(String),

    /// An output adapter failed (surfaced here only so the driver has a
    /// single error type to propagate; the core never performs I/O itself).
    #[error("I/O failure: {0}")]
    IoFailure(String),

    /// Nx < 3 or Ny < 3: the domain has no interior cells to update.
    #[error("numeric degenerate grid: {0}")]
    NumericDegenerate(String),
}

/// Convenience alias used throughout the crate.
pub type SimResult<T> = Result<T, SimError>;
