//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::CancellationToken;
use serde::Serialize;
use tracing::info;

use super::default_factory;
use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    parallel: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout_secs: Option<u64>,
    broadcasters: Vec<String>,
}

/// Execute the `validate` command
pub async fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args).await;

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

async fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();
    let invalid = |error: String| ValidationResult {
        valid: false,
        config_path: config_path.clone(),
        error: Some(error),
        summary: None,
    };

    if !args.config.exists() {
        return invalid(format!("File not found: {}", args.config.display()));
    }

    let config = match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => config,
        Err(e) => return invalid(e.to_string()),
    };

    // Construct every broadcaster so backend parameters are checked too
    let factory = match default_factory() {
        Ok(factory) => factory,
        Err(e) => return invalid(format!("{e:#}")),
    };
    if let Err(e) = factory
        .new_multi_broadcaster_from_config(&CancellationToken::new(), &config)
        .await
    {
        return invalid(e.to_string());
    }

    ValidationResult {
        valid: true,
        config_path,
        error: None,
        summary: Some(ConfigSummary {
            parallel: config.parallel,
            timeout_secs: config.timeout_secs,
            broadcasters: config.broadcasters,
        }),
    }
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!(
                "\n  Mode: {}",
                if summary.parallel { "parallel" } else { "sequential" }
            );
            if let Some(timeout) = summary.timeout_secs {
                println!("  Timeout: {}s", timeout);
            }
            println!("  Broadcasters ({}):", summary.broadcasters.len());
            for uri in &summary.broadcasters {
                println!("    - {}", uri);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
