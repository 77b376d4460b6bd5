use super::outcome::{FlowFailure, FlowOutcome};
use super::payment_method::PaymentMethodReference;
use super::request::FlowRequest;
use super::state::ResumptionToken;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Durable key/value persistence shared across process lifetimes.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
}

pub type KeyValueStoreRef = Arc<dyn KeyValueStore>;

/// A flow source that completes without leaving the host process.
#[async_trait]
pub trait TokenizationSource: Send + Sync {
    async fn tokenize(&self, request: &FlowRequest) -> FlowOutcome;
}

/// A flow source that hands control to an external surface.
///
/// The outcome arrives later through the resume bridge.
#[async_trait]
pub trait RedirectSource: Send + Sync {
    async fn launch(
        &self,
        request: &FlowRequest,
        token: &ResumptionToken,
    ) -> std::result::Result<(), FlowFailure>;
}

#[async_trait]
pub trait WalletReadiness: Send + Sync {
    async fn is_ready(&self) -> bool;
}

/// The customer's vaulted payment methods.
#[async_trait]
pub trait VaultedPaymentMethods: Send + Sync {
    async fn list(&self) -> std::result::Result<Vec<PaymentMethodReference>, FlowFailure>;
    async fn delete(
        &self,
        reference: &PaymentMethodReference,
    ) -> std::result::Result<(), FlowFailure>;
}

#[async_trait]
pub trait DeviceDataCollector: Send + Sync {
    async fn collect(&self) -> std::result::Result<String, FlowFailure>;
}

pub type TokenizationSourceRef = Arc<dyn TokenizationSource>;
pub type RedirectSourceRef = Arc<dyn RedirectSource>;
pub type WalletReadinessRef = Arc<dyn WalletReadiness>;
pub type VaultedPaymentMethodsRef = Arc<dyn VaultedPaymentMethods>;
pub type DeviceDataCollectorRef = Arc<dyn DeviceDataCollector>;
