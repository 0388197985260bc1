use std::path::PathBuf;

use crate::cli::Cli;
use crate::error::PolicygenError;
use crate::input::Input;
use crate::output::OutputFormat;
use crate::path;

/// Validated run configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub input: Input,
    pub output_dir: PathBuf,
    pub terraform: String,
    pub format: OutputFormat,
}

impl Config {
    /// Checks the input/output contract before anything touches the
    /// filesystem or runs Terraform.
    pub fn from_cli(cli: Cli) -> Result<Self, PolicygenError> {
        let input = Input::from_flags(
            cli.input_dir.as_deref(),
            cli.input_plan.as_deref(),
            cli.input_state.as_deref(),
        )?;

        let output_dir = cli
            .output_dir
            .filter(|dir| !dir.is_empty())
            .ok_or_else(|| PolicygenError::Configuration("--output_dir must be set".to_string()))?;
        let output_dir = path::normalize(&output_dir)?;

        if cli.terraform.is_empty() {
            return Err(PolicygenError::Configuration(
                "--terraform must not be empty".to_string(),
            ));
        }

        Ok(Self {
            input,
            output_dir,
            terraform: cli.terraform,
            format: cli.format,
        })
    }
}
