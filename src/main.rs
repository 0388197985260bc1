use clap::Parser;
use color_eyre::eyre::Result;
use tracing_subscriber::EnvFilter;

use policygen::cli::Cli;
use policygen::{Config, DefaultRunner, output};

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_cli(cli)?;

    tracing::debug!(?config, "configuration");

    let resources = policygen::extract(&config.input, &DefaultRunner, &config.terraform)?;

    for resource in &resources {
        tracing::debug!(
            address = %resource.display_address(),
            source = %resource.source,
            attributes = resource.attributes.len(),
            "extracted resource"
        );
    }
    tracing::info!(
        count = resources.len(),
        output_dir = %config.output_dir.display(),
        "extraction complete"
    );

    // TODO: generate policies into output_dir once the policy library mapping exists
    println!("{}", output::render(&resources, config.format)?);

    Ok(())
}
