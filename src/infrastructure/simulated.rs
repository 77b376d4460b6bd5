//! Scripted collaborators.
//!
//! Stand-ins for the brand SDKs, the wallet and the vault, each returning
//! a fixed answer. The CLI drives the engine with these, and the tests use
//! them to steer every branch of the state machine.

use crate::domain::outcome::{FlowErrorKind, FlowFailure, FlowOutcome};
use crate::domain::payment_method::PaymentMethodReference;
use crate::domain::ports::{
    DeviceDataCollector, RedirectSource, TokenizationSource, VaultedPaymentMethods,
    WalletReadiness,
};
use crate::domain::request::FlowRequest;
use crate::domain::state::ResumptionToken;
use async_trait::async_trait;
use tokio::sync::Mutex;

/// In-process source that answers every request with the same outcome.
pub struct ScriptedTokenizer {
    outcome: FlowOutcome,
    requests: Mutex<Vec<FlowRequest>>,
}

impl ScriptedTokenizer {
    pub fn new(outcome: FlowOutcome) -> Self {
        Self {
            outcome,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far, oldest first.
    pub async fn requests(&self) -> Vec<FlowRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl TokenizationSource for ScriptedTokenizer {
    async fn tokenize(&self, request: &FlowRequest) -> FlowOutcome {
        self.requests.lock().await.push(request.clone());
        self.outcome.clone()
    }
}

/// Redirect source that records each hand-off instead of leaving the process.
#[derive(Default)]
pub struct ScriptedRedirect {
    failure: Option<FlowFailure>,
    launches: Mutex<Vec<(FlowRequest, ResumptionToken)>>,
}

impl ScriptedRedirect {
    pub fn new() -> Self {
        Self::default()
    }

    /// A redirect source whose external surface cannot be opened.
    pub fn failing(failure: FlowFailure) -> Self {
        Self {
            failure: Some(failure),
            ..Self::default()
        }
    }

    pub async fn launches(&self) -> Vec<(FlowRequest, ResumptionToken)> {
        self.launches.lock().await.clone()
    }
}

#[async_trait]
impl RedirectSource for ScriptedRedirect {
    async fn launch(
        &self,
        request: &FlowRequest,
        token: &ResumptionToken,
    ) -> Result<(), FlowFailure> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }
        self.launches
            .lock()
            .await
            .push((request.clone(), token.clone()));
        Ok(())
    }
}

pub struct StaticWalletReadiness {
    ready: bool,
}

impl StaticWalletReadiness {
    pub fn new(ready: bool) -> Self {
        Self { ready }
    }
}

#[async_trait]
impl WalletReadiness for StaticWalletReadiness {
    async fn is_ready(&self) -> bool {
        self.ready
    }
}

/// A vault holding a fixed list of payment methods.
pub struct StaticVault {
    methods: Mutex<Vec<PaymentMethodReference>>,
}

impl StaticVault {
    pub fn new(methods: Vec<PaymentMethodReference>) -> Self {
        Self {
            methods: Mutex::new(methods),
        }
    }
}

#[async_trait]
impl VaultedPaymentMethods for StaticVault {
    async fn list(&self) -> Result<Vec<PaymentMethodReference>, FlowFailure> {
        Ok(self.methods.lock().await.clone())
    }

    async fn delete(&self, reference: &PaymentMethodReference) -> Result<(), FlowFailure> {
        let mut methods = self.methods.lock().await;
        let before = methods.len();
        methods.retain(|m| m.token() != reference.token());
        if methods.len() == before {
            return Err(FlowFailure::new(
                FlowErrorKind::UnexpectedResponse,
                format!("payment method {} is not vaulted", reference.token()),
            ));
        }
        Ok(())
    }
}

pub struct StaticDeviceData {
    blob: Result<String, FlowFailure>,
}

impl StaticDeviceData {
    pub fn new(blob: impl Into<String>) -> Self {
        Self {
            blob: Ok(blob.into()),
        }
    }

    pub fn failing(failure: FlowFailure) -> Self {
        Self { blob: Err(failure) }
    }
}

#[async_trait]
impl DeviceDataCollector for StaticDeviceData {
    async fn collect(&self) -> Result<String, FlowFailure> {
        self.blob.clone()
    }
}
