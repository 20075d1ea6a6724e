//! `send` command implementation.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::{CancellationToken, DispatchConfig, Message};
use image::DynamicImage;
use tracing::{info, warn};

use super::default_factory;
use crate::cli::SendArgs;

/// Execute the `send` command
pub async fn run_send(args: &SendArgs) -> Result<()> {
    let config = build_config(args)?;
    let msg = build_message(args)?;

    info!(
        broadcasters = config.broadcasters.len(),
        parallel = config.parallel,
        images = msg.images.len(),
        "Configuration loaded"
    );

    let ctx = CancellationToken::new();
    let factory = default_factory()?;
    let multi = factory
        .new_multi_broadcaster_from_config(&ctx, &config)
        .await
        .context("Failed to create broadcasters")?;

    let canceller = tokio::spawn(cancel_on_shutdown(ctx.clone(), config.timeout()));

    let result = multi.dispatch(&ctx, &msg).await;
    canceller.abort();

    let snapshot = multi.metrics();
    info!(
        delivered = snapshot.delivered_count,
        failed = snapshot.failure_count,
        skipped = snapshot.skipped_count,
        "Broadcast finished"
    );

    let id = result.context("Broadcast failed")?;
    println!("{}", id);
    Ok(())
}

/// Merge the optional config file with command-line flags
fn build_config(args: &SendArgs) -> Result<DispatchConfig> {
    let mut config = match args.config {
        Some(ref path) => ConfigLoader::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => DispatchConfig::default(),
    };

    config.broadcasters.extend(args.broadcasters.iter().cloned());
    if args.sequential {
        config.parallel = false;
    }
    if let Some(timeout) = args.timeout {
        config.timeout_secs = (timeout > 0).then_some(timeout);
    }

    ConfigLoader::validate(&config).context("Invalid broadcast configuration")?;
    Ok(config)
}

fn build_message(args: &SendArgs) -> Result<Message> {
    let images = args
        .images
        .iter()
        .map(|path| load_image(path))
        .collect::<Result<Vec<_>>>()?;

    Ok(Message::new(&args.title, &args.body).with_images(images))
}

fn load_image(path: &Path) -> Result<DynamicImage> {
    image::open(path).with_context(|| format!("Failed to load image {}", path.display()))
}

/// Cancel `ctx` on Ctrl+C, SIGTERM or after `timeout`
async fn cancel_on_shutdown(ctx: CancellationToken, timeout: Option<Duration>) {
    let deadline = async {
        match timeout {
            Some(timeout) => tokio::time::sleep(timeout).await,
            None => std::future::pending().await,
        }
    };

    tokio::select! {
        _ = shutdown_signal() => warn!("Received shutdown signal, cancelling broadcast..."),
        _ = deadline => warn!(?timeout, "Broadcast timed out, cancelling..."),
        _ = ctx.cancelled() => return,
    }
    ctx.cancel();
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn send_args() -> SendArgs {
        SendArgs {
            config: None,
            broadcasters: vec!["null://".to_string()],
            title: "title".to_string(),
            body: "body".to_string(),
            images: Vec::new(),
            sequential: false,
            timeout: None,
        }
    }

    #[test]
    fn test_flags_only() {
        let config = build_config(&send_args()).unwrap();
        assert_eq!(config.broadcasters, vec!["null://"]);
        assert!(config.parallel);
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn test_flags_appended_after_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broadcast.toml");
        std::fs::write(
            &path,
            "parallel = true\ntimeout_secs = 30\nbroadcasters = [\"log://\"]\n",
        )
        .unwrap();

        let args = SendArgs {
            config: Some(path),
            sequential: true,
            timeout: Some(0),
            ..send_args()
        };
        let config = build_config(&args).unwrap();

        assert_eq!(config.broadcasters, vec!["log://", "null://"]);
        assert!(!config.parallel);
        assert_eq!(config.timeout_secs, None);
    }

    #[test]
    fn test_no_broadcasters_rejected() {
        let args = SendArgs {
            broadcasters: Vec::new(),
            ..send_args()
        };
        assert!(build_config(&args).is_err());
    }

    #[test]
    fn test_missing_image_rejected() {
        let args = SendArgs {
            images: vec![PathBuf::from("/nonexistent/image.png")],
            ..send_args()
        };
        let err = build_message(&args).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/image.png"));
    }

    #[test]
    fn test_message_with_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pixel.png");
        DynamicImage::new_rgb8(2, 2).save(&path).unwrap();

        let args = SendArgs {
            images: vec![path],
            ..send_args()
        };
        let msg = build_message(&args).unwrap();
        assert_eq!(msg.title, "title");
        assert_eq!(msg.images.len(), 1);
    }

    #[tokio::test]
    async fn test_timeout_cancels_token() {
        let ctx = CancellationToken::new();
        cancel_on_shutdown(ctx.clone(), Some(Duration::from_millis(10))).await;
        assert!(ctx.is_cancelled());
    }

    #[tokio::test]
    async fn test_send_to_null() {
        run_send(&send_args()).await.unwrap();
    }
}
