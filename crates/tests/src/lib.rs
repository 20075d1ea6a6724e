//! # Integration Tests
//!
//! End-to-end tests across the workspace crates.
//!
//! Covers:
//! - Config file -> factory -> dispatch
//! - Failure propagation and cancellation, without real network backends

#[cfg(test)]
mod support {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use contracts::{Broadcaster, CancellationToken, ContractError, Message, Uid};
    use dispatcher::{BroadcasterFactory, BroadcasterRegistry};

    /// Yields once, then fails with the authority of its connection string as reason
    pub struct FailBroadcaster {
        reason: String,
    }

    #[async_trait]
    impl Broadcaster for FailBroadcaster {
        fn name(&self) -> &str {
            "fail"
        }

        async fn broadcast_message(
            &self,
            _ctx: &CancellationToken,
            _msg: &Message,
        ) -> Result<Uid, ContractError> {
            tokio::task::yield_now().await;
            Err(ContractError::Other(self.reason.clone()))
        }
    }

    /// Sleeps, honouring cancellation, then returns its call number
    pub struct SlowBroadcaster {
        delay: Duration,
        calls: Arc<AtomicU64>,
    }

    #[async_trait]
    impl Broadcaster for SlowBroadcaster {
        fn name(&self) -> &str {
            "slow"
        }

        async fn broadcast_message(
            &self,
            ctx: &CancellationToken,
            _msg: &Message,
        ) -> Result<Uid, ContractError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::select! {
                _ = ctx.cancelled() => Err(ContractError::Cancelled),
                _ = tokio::time::sleep(self.delay) => Ok(Uid::Int64(call as i64)),
            }
        }
    }

    /// Registry with built-ins plus `fail://<reason>` and `slow://`
    ///
    /// Returns the factory and the call counter shared by every slow backend.
    pub fn factory(slow_delay: Duration) -> (BroadcasterFactory, Arc<AtomicU64>) {
        let registry = BroadcasterRegistry::with_defaults().unwrap();

        registry
            .register("fail", |_ctx, uri: String| async move {
                let reason = uri
                    .trim_start_matches("fail://")
                    .split('?')
                    .next()
                    .unwrap_or_default()
                    .to_string();
                let broadcaster: Box<dyn Broadcaster> = Box::new(FailBroadcaster { reason });
                Ok::<_, ContractError>(broadcaster)
            })
            .unwrap();

        let calls = Arc::new(AtomicU64::new(0));
        let slow_calls = Arc::clone(&calls);
        registry
            .register("slow", move |_ctx, _uri| {
                let calls = Arc::clone(&slow_calls);
                async move {
                    Ok::<_, ContractError>(Box::new(SlowBroadcaster {
                        delay: slow_delay,
                        calls,
                    }) as Box<dyn Broadcaster>)
                }
            })
            .unwrap();

        (BroadcasterFactory::new(Arc::new(registry)), calls)
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{Broadcaster, CancellationToken, ContractError, Message, Uid};
    use dispatcher::{DispatcherError, MultiBroadcaster};
    use image::DynamicImage;

    use crate::support::factory;

    #[tokio::test]
    async fn test_two_null_broadcasters() {
        let (factory, _) = factory(Duration::ZERO);
        let ctx = CancellationToken::new();

        let multi = factory
            .new_multi_broadcaster_from_uris(&ctx, ["null://", "null://"])
            .await
            .unwrap();
        let id = multi
            .dispatch(&ctx, &Message::new("hello", "world"))
            .await
            .unwrap();

        assert_eq!(id, Uid::Multi(vec![Uid::Null, Uid::Null]));
        assert_eq!(id.len(), 2);
    }

    #[tokio::test]
    async fn test_null_and_failing_broadcaster() {
        let (factory, _) = factory(Duration::ZERO);
        let ctx = CancellationToken::new();

        let multi = factory
            .new_multi_broadcaster_from_uris(&ctx, ["null://", "fail://boom"])
            .await
            .unwrap();
        let err = multi.dispatch(&ctx, &Message::new("t", "b")).await.unwrap_err();

        let ContractError::Aggregate(ref errors) = err else {
            panic!("expected aggregate error, got {err:?}");
        };
        assert_eq!(errors.len(), 1);

        let text = err.to_string();
        assert!(text.starts_with("one or more errors occurred"));
        assert!(text.contains("'fail'"));
        assert!(text.contains("boom"));
        assert!(!ctx.is_cancelled(), "caller context must not be cancelled");
    }

    #[tokio::test]
    async fn test_every_failure_reported() {
        let (factory, _) = factory(Duration::ZERO);
        let ctx = CancellationToken::new();

        let multi = factory
            .new_multi_broadcaster_from_uris(&ctx, ["fail://one", "fail://two", "fail://three"])
            .await
            .unwrap();
        let err = multi.dispatch(&ctx, &Message::default()).await.unwrap_err();

        let ContractError::Aggregate(errors) = err else {
            panic!("expected aggregate error");
        };
        // All three are past the gate before the first one fails
        assert_eq!(errors.len(), 3);
    }

    #[tokio::test]
    async fn test_config_file_to_dispatch() {
        let outbox = tempfile::tempdir().unwrap();
        let config_dir = tempfile::tempdir().unwrap();
        let config_path = config_dir.path().join("broadcast.toml");
        std::fs::write(
            &config_path,
            format!(
                "parallel = true\nbroadcasters = [\"null://\", \"log://\", \"file://{}?format=png\"]\n",
                outbox.path().display()
            ),
        )
        .unwrap();

        let config = ConfigLoader::load_from_path(&config_path).unwrap();
        let (factory, _) = factory(Duration::ZERO);
        let ctx = CancellationToken::new();
        let multi = factory
            .new_multi_broadcaster_from_config(&ctx, &config)
            .await
            .unwrap();
        assert_eq!(multi.names(), vec!["null", "log", "file"]);

        let msg = Message::new("report", "see attached")
            .with_images(vec![DynamicImage::new_rgb8(4, 4)]);
        let id = multi.dispatch(&ctx, &msg).await.unwrap();
        assert_eq!(id.len(), 3);

        let entries: Vec<_> = std::fs::read_dir(outbox.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].join("message.json").exists());
        assert!(entries[0].join("image-0.png").exists());

        let entry = entries[0].file_name().unwrap().to_string_lossy().to_string();
        assert!(id.children().contains(&Uid::String(entry)));
    }

    #[tokio::test]
    async fn test_unknown_scheme_fails_before_delivery() {
        let config = ConfigLoader::load_from_str(
            r#"{"broadcasters": ["slow://", "pigeon://coop"]}"#,
            ConfigFormat::Json,
        )
        .unwrap();

        let (factory, calls) = factory(Duration::ZERO);
        let err = factory
            .new_multi_broadcaster_from_config(&CancellationToken::new(), &config)
            .await
            .err()
            .unwrap();

        assert!(matches!(
            err,
            DispatcherError::UnknownScheme { ref scheme, .. } if scheme == "pigeon"
        ));
        assert!(err.to_string().contains("pigeon://coop"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_caller_cancellation_returns_promptly() {
        let (factory, _) = factory(Duration::from_secs(30));
        let ctx = CancellationToken::new();
        let multi = factory
            .new_multi_broadcaster_from_uris(&ctx, ["slow://", "slow://", "null://"])
            .await
            .unwrap();

        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let started = Instant::now();
        let err = multi.dispatch(&ctx, &Message::default()).await.unwrap_err();

        assert!(err.is_cancelled());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_sequential_failure_skips_remaining() {
        let config = ConfigLoader::load_from_str(
            "parallel = false\nbroadcasters = [\"fail://first\", \"slow://\", \"slow://\"]\n",
            ConfigFormat::Toml,
        )
        .unwrap();

        let (factory, calls) = factory(Duration::from_millis(10));
        let ctx = CancellationToken::new();
        let multi = factory
            .new_multi_broadcaster_from_config(&ctx, &config)
            .await
            .unwrap();
        assert!(!multi.is_parallel());

        let err = multi.dispatch(&ctx, &Message::default()).await.unwrap_err();
        assert!(err.to_string().contains("first"));

        // Workers queue for the single slot in spawn order; whichever ran
        // after the failure saw the cancelled context and never called in.
        assert!(calls.load(Ordering::SeqCst) < 2);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(multi.metrics().skipped_count >= 1);
    }

    #[tokio::test]
    async fn test_nested_dispatchers() {
        let (factory, _) = factory(Duration::from_millis(5));
        let ctx = CancellationToken::new();

        let inner = factory
            .new_multi_broadcaster_from_uris(&ctx, ["null://", "slow://"])
            .await
            .unwrap();
        let inner: Arc<dyn Broadcaster> = Arc::new(inner);
        let outer = MultiBroadcaster::new(vec![
            inner,
            factory.new_broadcaster(&ctx, "log://").await.unwrap(),
        ]);

        let id = outer
            .dispatch(&ctx, &Message::new("nested", ""))
            .await
            .unwrap();
        assert_eq!(id.len(), 2);
        let nested = id
            .children()
            .iter()
            .find(|child| matches!(child, Uid::Multi(_)))
            .unwrap();
        assert_eq!(nested.len(), 2);
    }
}
