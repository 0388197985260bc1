use clap::Parser;

use crate::output::OutputFormat;

/// Extract the resources a Terraform configuration, plan or state describes.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to Terraform configs root directory. Cannot be combined with other inputs.
    #[arg(long = "input_dir", value_name = "PATH")]
    pub input_dir: Option<String>,

    /// Path to a Terraform plan in JSON format. Cannot be combined with other inputs.
    #[arg(long = "input_plan", value_name = "PATH")]
    pub input_plan: Option<String>,

    /// Path to a Terraform state in JSON format. Cannot be combined with other inputs.
    #[arg(long = "input_state", value_name = "PATH")]
    pub input_state: Option<String>,

    /// Directory generated policies are written to.
    #[arg(long = "output_dir", value_name = "PATH")]
    pub output_dir: Option<String>,

    /// Terraform executable used for --input_dir.
    #[arg(long, env = "POLICYGEN_TERRAFORM", default_value = "terraform")]
    pub terraform: String,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}
