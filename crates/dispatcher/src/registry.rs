//! BroadcasterRegistry - scheme to constructor mapping
//!
//! An explicit object built once at startup. Backends register themselves
//! through a plain `register(&registry)` function (see [`crate::backends`]).

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use contracts::{Broadcaster, CancellationToken, ContractError};
use parking_lot::RwLock;
use tracing::debug;

use crate::backends;
use crate::error::DispatcherError;

/// Future returned by a [`Constructor`]
pub type ConstructorFuture =
    Pin<Box<dyn Future<Output = Result<Box<dyn Broadcaster>, ContractError>> + Send>>;

/// Builds a broadcaster from the caller's context and the full connection string
pub type Constructor = Arc<dyn Fn(CancellationToken, String) -> ConstructorFuture + Send + Sync>;

/// Registry of broadcaster constructors keyed by scheme
///
/// Safe for concurrent register/lookup. There is no unregistration.
#[derive(Default)]
pub struct BroadcasterRegistry {
    constructors: RwLock<HashMap<String, Constructor>>,
}

impl BroadcasterRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with every built-in backend registered
    pub fn with_defaults() -> Result<Self, DispatcherError> {
        let registry = Self::new();
        backends::register_defaults(&registry)?;
        Ok(registry)
    }

    /// Register an async constructor function for `scheme`
    ///
    /// # Errors
    /// [`DispatcherError::DuplicateScheme`] if the scheme is taken; the
    /// existing entry is left untouched.
    pub fn register<F, Fut>(&self, scheme: &str, constructor: F) -> Result<(), DispatcherError>
    where
        F: Fn(CancellationToken, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Box<dyn Broadcaster>, ContractError>> + Send + 'static,
    {
        let constructor: Constructor =
            Arc::new(move |ctx: CancellationToken, uri: String| -> ConstructorFuture {
                Box::pin(constructor(ctx, uri))
            });
        self.register_constructor(scheme, constructor)
    }

    /// Register an already type-erased constructor
    pub fn register_constructor(
        &self,
        scheme: &str,
        constructor: Constructor,
    ) -> Result<(), DispatcherError> {
        let scheme = normalize(scheme);
        match self.constructors.write().entry(scheme) {
            Entry::Occupied(entry) => Err(DispatcherError::DuplicateScheme {
                scheme: entry.key().clone(),
            }),
            Entry::Vacant(entry) => {
                debug!(scheme = %entry.key(), "Broadcaster scheme registered");
                entry.insert(constructor);
                Ok(())
            }
        }
    }

    /// Look up the constructor for `scheme`
    ///
    /// # Errors
    /// [`DispatcherError::UnknownScheme`] if nothing is registered under it.
    pub fn lookup(&self, scheme: &str) -> Result<Constructor, DispatcherError> {
        let scheme = normalize(scheme);
        self.constructors
            .read()
            .get(&scheme)
            .cloned()
            .ok_or(DispatcherError::UnknownScheme { scheme, uri: None })
    }

    /// Whether `scheme` is registered
    pub fn contains(&self, scheme: &str) -> bool {
        self.constructors.read().contains_key(&normalize(scheme))
    }

    /// Registered schemes, sorted
    pub fn schemes(&self) -> Vec<String> {
        let mut schemes: Vec<String> = self.constructors.read().keys().cloned().collect();
        schemes.sort();
        schemes
    }
}

impl fmt::Debug for BroadcasterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BroadcasterRegistry")
            .field("schemes", &self.schemes())
            .finish()
    }
}

fn normalize(scheme: &str) -> String {
    scheme.to_ascii_lowercase()
}
