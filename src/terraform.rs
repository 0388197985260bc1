//! Terraform artifacts: the isolated plan workspace and the plan/state parsers.

mod module;
pub mod plan;
pub mod state;
pub mod workspace;

use thiserror::Error;

use crate::runner::ExecutionError;

pub use workspace::{PLAN_FILE, Workspace, plan_json};

#[derive(Debug, Error)]
pub enum TerraformError {
    /// `terraform init` failed in the workspace.
    #[error("terraform init failed")]
    Initialization(#[source] ExecutionError),

    /// `terraform plan -out` failed in the workspace.
    #[error("terraform plan failed")]
    Plan(#[source] ExecutionError),

    /// `terraform show -json` could not render the saved plan.
    #[error("terraform show failed")]
    Extraction(#[source] ExecutionError),

    /// The temporary workspace could not be created or populated.
    #[error("prepare workspace: {message}")]
    Workspace {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Plan or state bytes are not valid JSON of the expected shape.
    #[error("malformed input: {0}")]
    MalformedInput(String),
}

impl TerraformError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        TerraformError::MalformedInput(message.into())
    }
}
