//! BroadcasterFactory - connection string to broadcaster
//!
//! The factory only reads the scheme. The whole connection string, query
//! included, goes to the registered constructor, which owns its parameters.

use std::sync::Arc;

use tracing::{info, instrument};
use url::Url;

use contracts::{Broadcaster, CancellationToken, ContractError, DispatchConfig};

use crate::dispatcher::MultiBroadcaster;
use crate::error::DispatcherError;
use crate::registry::BroadcasterRegistry;

/// Builds broadcasters from connection strings using a registry
#[derive(Debug, Clone)]
pub struct BroadcasterFactory {
    registry: Arc<BroadcasterRegistry>,
}

impl BroadcasterFactory {
    /// Create a factory over `registry`
    pub fn new(registry: Arc<BroadcasterRegistry>) -> Self {
        Self { registry }
    }

    /// Create a factory with every built-in backend registered
    pub fn with_defaults() -> Result<Self, DispatcherError> {
        Ok(Self::new(Arc::new(BroadcasterRegistry::with_defaults()?)))
    }

    /// Underlying registry
    pub fn registry(&self) -> &BroadcasterRegistry {
        &self.registry
    }

    /// Build one broadcaster from `scheme://authority?query`
    ///
    /// # Errors
    /// - [`DispatcherError::InvalidUri`] if `uri` does not parse
    /// - [`DispatcherError::UnknownScheme`] if no backend claims the scheme
    /// - [`DispatcherError::Construction`] if the backend rejects its parameters
    #[instrument(name = "factory_new_broadcaster", skip(self, ctx))]
    pub async fn new_broadcaster(
        &self,
        ctx: &CancellationToken,
        uri: &str,
    ) -> Result<Arc<dyn Broadcaster>, DispatcherError> {
        if ctx.is_cancelled() {
            return Err(ContractError::Cancelled.into());
        }

        let scheme = parse_scheme(uri)?;
        let constructor = self
            .registry
            .lookup(&scheme)
            .map_err(|e| e.for_uri(uri))?;

        let broadcaster = constructor(ctx.clone(), uri.to_string())
            .await
            .map_err(|e| DispatcherError::construction(uri, e))?;

        Ok(Arc::from(broadcaster))
    }

    /// Build one broadcaster per connection string, in order, and wrap them
    /// in a parallel [`MultiBroadcaster`]
    ///
    /// Stops at the first construction error; later strings are not attempted.
    #[instrument(name = "factory_new_multi_broadcaster", skip(self, ctx, uris))]
    pub async fn new_multi_broadcaster_from_uris<I, S>(
        &self,
        ctx: &CancellationToken,
        uris: I,
    ) -> Result<MultiBroadcaster, DispatcherError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut broadcasters = Vec::new();
        for uri in uris {
            broadcasters.push(self.new_broadcaster(ctx, uri.as_ref()).await?);
        }

        info!(broadcasters = broadcasters.len(), "Broadcasters created");
        Ok(MultiBroadcaster::new(broadcasters))
    }

    /// Build the dispatcher described by `config`
    pub async fn new_multi_broadcaster_from_config(
        &self,
        ctx: &CancellationToken,
        config: &DispatchConfig,
    ) -> Result<MultiBroadcaster, DispatcherError> {
        let multi = self
            .new_multi_broadcaster_from_uris(ctx, &config.broadcasters)
            .await?;
        Ok(multi.with_parallel(config.parallel))
    }
}

/// Extract the (lowercased) scheme of a connection string
fn parse_scheme(uri: &str) -> Result<String, DispatcherError> {
    let url = Url::parse(uri).map_err(|e| DispatcherError::invalid_uri(uri, e.to_string()))?;
    Ok(url.scheme().to_string())
}
