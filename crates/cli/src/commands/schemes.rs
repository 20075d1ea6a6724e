//! `schemes` command implementation.

use anyhow::{Context, Result};

use super::default_factory;
use crate::cli::SchemesArgs;

/// Execute the `schemes` command
pub fn run_schemes(args: &SchemesArgs) -> Result<()> {
    let factory = default_factory()?;
    let schemes = factory.registry().schemes();

    if args.json {
        let json = serde_json::to_string_pretty(&schemes).context("Failed to serialize schemes")?;
        println!("{}", json);
    } else {
        for scheme in &schemes {
            println!("{}://", scheme);
        }
    }

    Ok(())
}
