//! Plugin registrar
//!
//! Composes a gateway and a handler. The host keeps the `SquarePlugin`,
//! calls `init` once at startup and registers `handler()` with its
//! payment-method registry.

use std::sync::Arc;
use std::time::Duration;

use crate::config::SquareCredentials;
use crate::error::Result;
use crate::gateway::{ClientFactory, SquareGateway};
use crate::handler::SquarePaymentHandler;
use crate::reconcile::{CancelTimedOutAuthorizations, ReconciliationHook};
use crate::timeout::DEFAULT_TIMEOUT;

/// A configured (or not yet configured) Square integration
pub struct SquarePlugin {
    gateway: Arc<SquareGateway>,
    handler: Arc<SquarePaymentHandler>,
}

impl Default for SquarePlugin {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl SquarePlugin {
    /// Unconfigured plugin with default settings; call [`init`](Self::init) before use
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> SquarePluginBuilder {
        SquarePluginBuilder::new()
    }

    /// Plugin configured from `SQUARE_*` environment variables
    pub async fn from_env() -> Result<Self> {
        let credentials = SquareCredentials::from_env()?;
        let plugin = Self::new();
        plugin.init(credentials).await;
        Ok(plugin)
    }

    /// Store credentials; any previously built client is discarded
    pub async fn init(&self, credentials: SquareCredentials) {
        self.gateway.init(credentials).await;
    }

    pub fn handler(&self) -> Arc<SquarePaymentHandler> {
        Arc::clone(&self.handler)
    }

    pub const fn gateway(&self) -> &Arc<SquareGateway> {
        &self.gateway
    }
}

/// Builder for [`SquarePlugin`]
pub struct SquarePluginBuilder {
    gateway: Option<Arc<SquareGateway>>,
    factory: Option<Box<dyn FnOnce() -> SquareGateway>>,
    timeout: Duration,
    reconciliation: Option<Arc<dyn ReconciliationHook>>,
    cancel_timed_out_authorizations: bool,
}

impl Default for SquarePluginBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SquarePluginBuilder {
    pub fn new() -> Self {
        Self {
            gateway: None,
            factory: None,
            timeout: DEFAULT_TIMEOUT,
            reconciliation: None,
            cancel_timed_out_authorizations: false,
        }
    }

    /// Share an existing gateway
    #[must_use]
    pub fn gateway(mut self, gateway: Arc<SquareGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Build Square clients with `factory`
    #[must_use]
    pub fn client_factory(mut self, factory: impl ClientFactory + 'static) -> Self {
        self.factory = Some(Box::new(move || SquareGateway::with_factory(factory)));
        self
    }

    /// Deadline for each Square call
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Hook notified about timed-out calls
    #[must_use]
    pub fn reconciliation(mut self, hook: Arc<dyn ReconciliationHook>) -> Self {
        self.reconciliation = Some(hook);
        self
    }

    /// Void authorizations whose create call timed out.
    ///
    /// The void runs before the timed-out `create_payment` returns and has
    /// its own deadline equal to [`timeout`](Self::timeout), so such a call
    /// can take up to twice the deadline. Ignored when an explicit
    /// reconciliation hook is set.
    #[must_use]
    pub const fn cancel_timed_out_authorizations(mut self, enabled: bool) -> Self {
        self.cancel_timed_out_authorizations = enabled;
        self
    }

    pub fn build(self) -> SquarePlugin {
        let gateway = match (self.gateway, self.factory) {
            (Some(gateway), _) => gateway,
            (None, Some(factory)) => Arc::new(factory()),
            (None, None) => Arc::new(SquareGateway::new()),
        };

        let reconciliation = self.reconciliation.or_else(|| {
            self.cancel_timed_out_authorizations.then(|| {
                Arc::new(
                    CancelTimedOutAuthorizations::new(Arc::clone(&gateway))
                        .with_timeout(self.timeout),
                ) as Arc<dyn ReconciliationHook>
            })
        });

        let mut handler = SquarePaymentHandler::new(Arc::clone(&gateway)).with_timeout(self.timeout);
        if let Some(hook) = reconciliation {
            handler = handler.with_reconciliation(hook);
        }

        SquarePlugin {
            gateway,
            handler: Arc::new(handler),
        }
    }
}
