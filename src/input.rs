//! Chooses how resources are acquired and runs that acquisition.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::PolicygenError;
use crate::path;
use crate::resource::Resource;
use crate::runner::Runner;
use crate::terraform::{self, plan, state};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Dir,
    Plan,
    State,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputKind::Dir => f.write_str("configs directory"),
            InputKind::Plan => f.write_str("plan"),
            InputKind::State => f.write_str("state"),
        }
    }
}

/// Exactly one Terraform artifact to read resources from.
///
/// Paths are kept as given; they are normalized when the input is extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Dir(String),
    Plan(String),
    State(String),
}

impl Input {
    /// Picks the single non-empty value among the three flags.
    ///
    /// Touches neither the filesystem nor any process.
    pub fn from_flags(
        dir: Option<&str>,
        plan: Option<&str>,
        state: Option<&str>,
    ) -> Result<Self, PolicygenError> {
        let set = |value: Option<&str>| value.filter(|v| !v.is_empty()).map(str::to_string);

        match (set(dir), set(plan), set(state)) {
            (Some(dir), None, None) => Ok(Input::Dir(dir)),
            (None, Some(plan), None) => Ok(Input::Plan(plan)),
            (None, None, Some(state)) => Ok(Input::State(state)),
            _ => Err(PolicygenError::Configuration(
                "exactly one of --input_dir, --input_plan or --input_state must be specified"
                    .to_string(),
            )),
        }
    }

    pub fn kind(&self) -> InputKind {
        match self {
            Input::Dir(_) => InputKind::Dir,
            Input::Plan(_) => InputKind::Plan,
            Input::State(_) => InputKind::State,
        }
    }

    pub fn raw_path(&self) -> &str {
        match self {
            Input::Dir(p) | Input::Plan(p) | Input::State(p) => p,
        }
    }
}

/// Reads resources from `input`, naming the acquisition path on failure.
pub fn extract<R: Runner + ?Sized>(
    input: &Input,
    runner: &R,
    terraform: &str,
) -> Result<Vec<Resource>, PolicygenError> {
    let result = match input {
        Input::Dir(dir) => resources_from_dir(runner, terraform, dir),
        Input::Plan(plan) => resources_from_plan(plan),
        Input::State(state) => resources_from_state(state),
    };

    result.map_err(|source| PolicygenError::Input {
        kind: input.kind(),
        source: Box::new(source),
    })
}

/// Plans the configuration directory in an isolated workspace and reads the
/// resources from that plan.
pub fn resources_from_dir<R: Runner + ?Sized>(
    runner: &R,
    terraform: &str,
    dir: &str,
) -> Result<Vec<Resource>, PolicygenError> {
    let dir = path::normalize(dir)?;
    tracing::info!(dir = %dir.display(), "planning configs directory");

    let json = terraform::plan_json(runner, terraform, &dir)?;
    Ok(plan::extract(&json)?)
}

pub fn resources_from_plan(file: &str) -> Result<Vec<Resource>, PolicygenError> {
    let bytes = read(&path::normalize(file)?)?;
    Ok(plan::extract(&bytes)?)
}

pub fn resources_from_state(file: &str) -> Result<Vec<Resource>, PolicygenError> {
    let bytes = read(&path::normalize(file)?)?;
    Ok(state::extract(&bytes)?)
}

fn read(file: &Path) -> Result<Vec<u8>, PolicygenError> {
    tracing::debug!(path = %file.display(), "reading input");
    std::fs::read(file).map_err(|source| PolicygenError::Io {
        path: PathBuf::from(file),
        source,
    })
}
