//! Credential registrar and client accessor
//!
//! `SquareGateway` holds the current credentials and the one client built
//! from them. It is constructed by whoever composes the handler and shared
//! by `Arc`; there is no process-wide state.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::client::{SquareApi, SquareClient};
use crate::config::{SquareCredentials, SquareEnvironment};
use crate::error::{Result, SquareError};

/// Builds a Square client from credentials
pub trait ClientFactory: Send + Sync {
    fn build(&self, credentials: &SquareCredentials) -> Result<Arc<dyn SquareApi>>;
}

/// Factory producing reqwest-backed [`SquareClient`]s
#[derive(Clone, Copy, Debug, Default)]
pub struct HttpClientFactory;

impl ClientFactory for HttpClientFactory {
    fn build(&self, credentials: &SquareCredentials) -> Result<Arc<dyn SquareApi>> {
        Ok(Arc::new(SquareClient::new(credentials)?))
    }
}

#[derive(Default)]
struct GatewayState {
    credentials: Option<SquareCredentials>,
    client: Option<Arc<dyn SquareApi>>,
}

/// Credentials plus the lazily built client for them
pub struct SquareGateway {
    state: RwLock<GatewayState>,
    factory: Box<dyn ClientFactory>,
}

impl Default for SquareGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl SquareGateway {
    /// Unconfigured gateway using [`HttpClientFactory`]
    pub fn new() -> Self {
        Self::with_factory(HttpClientFactory)
    }

    /// Unconfigured gateway building clients with `factory`
    pub fn with_factory(factory: impl ClientFactory + 'static) -> Self {
        Self {
            state: RwLock::new(GatewayState::default()),
            factory: Box::new(factory),
        }
    }

    /// Gateway already holding `credentials`
    pub fn with_credentials(credentials: SquareCredentials) -> Self {
        Self {
            state: RwLock::new(GatewayState {
                credentials: Some(credentials),
                client: None,
            }),
            factory: Box::new(HttpClientFactory),
        }
    }

    /// Store credentials and drop any cached client.
    ///
    /// Performs no validation; bad credentials surface on the first call.
    /// Calls already in flight keep the client they started with.
    pub async fn init(&self, credentials: SquareCredentials) {
        let mut state = self.state.write().await;
        let replaced = state.client.take().is_some();
        tracing::info!(
            environment = %credentials.environment,
            location_id = %credentials.location_id,
            replaced_client = replaced,
            "Square credentials configured"
        );
        state.credentials = Some(credentials);
    }

    pub async fn is_configured(&self) -> bool {
        self.state.read().await.credentials.is_some()
    }

    pub async fn environment(&self) -> Option<SquareEnvironment> {
        self.state
            .read()
            .await
            .credentials
            .as_ref()
            .map(|c| c.environment)
    }

    /// Client for the current credentials, built on first use
    pub async fn client(&self) -> Result<Arc<dyn SquareApi>> {
        {
            let state = self.state.read().await;
            if let Some(client) = &state.client {
                return Ok(Arc::clone(client));
            }
            if state.credentials.is_none() {
                return Err(not_configured());
            }
        }

        let mut state = self.state.write().await;
        // Another caller may have built it while we waited for the write lock
        if let Some(client) = &state.client {
            return Ok(Arc::clone(client));
        }

        let credentials = state.credentials.as_ref().ok_or_else(not_configured)?;
        let client = self.factory.build(credentials)?;
        tracing::debug!(
            environment = %credentials.environment,
            "Built Square client"
        );
        state.client = Some(Arc::clone(&client));

        Ok(client)
    }
}

fn not_configured() -> SquareError {
    SquareError::Config(
        "Square credentials not set; initialize the Square plugin before taking payments".into(),
    )
}
