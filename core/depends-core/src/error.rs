//! Errors shared by the configure and copy phases.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DependsError>;

/// Fatal configuration and copy errors.
///
/// None of these are recovered internally; callers surface the message and
/// stop. An absent depends directory is deliberately not an error.
#[derive(Debug, Error)]
pub enum DependsError {
    /// The manifest exists but is unreadable or not valid JSON.
    #[error("could not read manifest {}: {reason}", path.display())]
    ManifestRead { path: PathBuf, reason: String },

    /// The manifest contains a key outside the recognized toolchain set.
    #[error("config key `{key}` not handled")]
    ManifestKey { key: String },

    /// An expected build output or bundled library is absent at copy time.
    #[error("could not copy DLL: {}", path.display())]
    MissingArtifact { path: PathBuf },

    /// A compiler runtime library could not be resolved to an existing file.
    #[error("could not resolve runtime library {library}: {detail}")]
    ToolchainResolution { library: String, detail: String },

    /// Filesystem failure outside the contract error kinds.
    #[error(transparent)]
    Io(#[from] io::Error),
}
