//! policygen - Terraform resource extraction
//!
//! Reads the resources a Terraform configuration directory, plan or state
//! describes into one normalized model for policy generation.

pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod output;
pub mod path;
pub mod resource;
pub mod runner;
pub mod terraform;

pub use config::Config;
pub use error::PolicygenError;
pub use input::{Input, InputKind, extract};
pub use resource::{Resource, Source, UNKNOWN_VALUE};
pub use runner::{DefaultRunner, ExecutionError, Runner};
pub use terraform::TerraformError;
