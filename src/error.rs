use std::path::PathBuf;

use thiserror::Error;

use crate::input::InputKind;
use crate::path::PathError;
use crate::terraform::TerraformError;

#[derive(Debug, Error)]
pub enum PolicygenError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid path: {0}")]
    InvalidPath(#[from] PathError),

    #[error("read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Terraform(#[from] TerraformError),

    #[error("read resources from {kind}")]
    Input {
        kind: InputKind,
        #[source]
        source: Box<PolicygenError>,
    },
}

impl PolicygenError {
    /// The error with any acquisition context peeled off.
    pub fn root(&self) -> &PolicygenError {
        match self {
            PolicygenError::Input { source, .. } => source.root(),
            other => other,
        }
    }
}
