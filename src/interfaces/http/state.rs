use crate::application::activation::ActivationService;
use crate::application::callback::CallbackHandler;
use crate::application::checkout::CheckoutService;
use crate::application::wallet::WalletService;
use crate::domain::ports::{CheckoutStoreRef, LedgerStoreRef, PaymentGatewayRef, UserStoreRef};
use crate::infrastructure::correlation_cache::CorrelationCache;
use std::net::IpAddr;
use std::sync::Arc;

/// Adapters the HTTP layer is wired with.
pub struct HttpStatePorts {
    pub users: UserStoreRef,
    pub ledger: LedgerStoreRef,
    pub checkouts: CheckoutStoreRef,
    pub gateway: PaymentGatewayRef,
}

/// Shared services behind every handler.
#[derive(Clone)]
pub struct HttpState {
    pub users: UserStoreRef,
    pub activation: ActivationService,
    pub checkouts: CheckoutService,
    pub wallets: WalletService,
    pub callbacks: CallbackHandler,
    callback_allowlist: Arc<Vec<IpAddr>>,
}

impl HttpState {
    pub fn new(ports: HttpStatePorts, cache: CorrelationCache, callback_allowlist: Vec<IpAddr>) -> Self {
        let wallets = WalletService::new(ports.ledger);
        let checkouts = CheckoutService::new(ports.gateway, ports.checkouts.clone(), cache.clone());
        let activation = ActivationService::new(ports.users.clone(), checkouts.clone());
        let callbacks = CallbackHandler::new(
            ports.users.clone(),
            ports.checkouts,
            wallets.clone(),
            cache,
            checkouts.locks(),
        );
        Self {
            users: ports.users,
            activation,
            checkouts,
            wallets,
            callbacks,
            callback_allowlist: Arc::new(callback_allowlist),
        }
    }

    /// An empty allowlist accepts any source; otherwise the peer must be listed.
    pub fn callback_allowed(&self, peer: Option<IpAddr>) -> bool {
        if self.callback_allowlist.is_empty() {
            return true;
        }
        peer.is_some_and(|ip| self.callback_allowlist.contains(&ip))
    }
}
