use super::last_used::LastUsedCache;
use super::recent::{RecentPaymentMethod, fetch_most_recent_payment_method};
use super::resume::{ExternalResponse, ResumeBridge};
use super::sources::{FlowSource, FlowSources};
use crate::domain::outcome::{
    DropInOutcome, FlowErrorKind, FlowFailure, FlowOutcome, RequestKind, ResultCode,
};
use crate::domain::payment_method::{PaymentMethodKind, PaymentMethodReference};
use crate::domain::ports::{
    DeviceDataCollectorRef, KeyValueStoreRef, VaultedPaymentMethodsRef, WalletReadinessRef,
};
use crate::domain::request::{DropInRequest, FlowRequest, SelectionIntent};
use crate::domain::state::{FlowState, ResumptionToken, StartHint};
use crate::domain::step_up;
use crate::error::{DropInError, Result};
use tokio::sync::{Mutex, mpsc};

/// Render-only notifications pushed to the host.
///
/// Every state the flow enters is reported; `Outcome` is sent exactly once,
/// together with the transition into `Terminal`.
#[derive(Debug, PartialEq, Clone)]
pub enum FlowUpdate {
    State(FlowState),
    Outcome(DropInOutcome),
}

struct Flow {
    state: FlowState,
    step_up_performed: bool,
    device_data: Option<String>,
}

enum Next {
    Done(FlowState),
    StepUp {
        request: FlowRequest,
        reference: PaymentMethodReference,
    },
}

/// The drop-in selection state machine.
///
/// Owns one flow instance from `Idle` to its single `Terminal` state. The
/// flow lock is never held while a flow source is running, so intents and
/// cancels that arrive meanwhile see the in-flight state and are judged
/// against it.
pub struct DropInEngine {
    request: DropInRequest,
    sources: FlowSources,
    bridge: ResumeBridge,
    cache: LastUsedCache,
    device_data: Option<DeviceDataCollectorRef>,
    wallet_readiness: Option<WalletReadinessRef>,
    vault: Option<VaultedPaymentMethodsRef>,
    updates: Option<mpsc::UnboundedSender<FlowUpdate>>,
    flow: Mutex<Flow>,
}

impl DropInEngine {
    /// Creates an engine in `Idle`.
    ///
    /// # Arguments
    ///
    /// * `request` - The merchant configuration for this flow instance.
    /// * `sources` - Flow sources per brand, plus the step-up source.
    /// * `store` - Persistence for the last-used cache and resumption tokens.
    pub fn new(request: DropInRequest, sources: FlowSources, store: KeyValueStoreRef) -> Self {
        Self {
            request,
            sources,
            bridge: ResumeBridge::new(store.clone()),
            cache: LastUsedCache::new(store),
            device_data: None,
            wallet_readiness: None,
            vault: None,
            updates: None,
            flow: Mutex::new(Flow {
                state: FlowState::Idle,
                step_up_performed: false,
                device_data: None,
            }),
        }
    }

    pub fn with_device_data(mut self, collector: DeviceDataCollectorRef) -> Self {
        self.device_data = Some(collector);
        self
    }

    pub fn with_wallet_readiness(mut self, readiness: WalletReadinessRef) -> Self {
        self.wallet_readiness = Some(readiness);
        self
    }

    pub fn with_vault(mut self, vault: VaultedPaymentMethodsRef) -> Self {
        self.vault = Some(vault);
        self
    }

    pub fn with_updates(mut self, updates: mpsc::UnboundedSender<FlowUpdate>) -> Self {
        self.updates = Some(updates);
        self
    }

    pub fn with_resume_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.bridge = self.bridge.with_ttl(ttl);
        self
    }

    /// Rebuilds the flow for a new process invocation.
    ///
    /// A pending, unexpired resumption token puts the engine straight into
    /// `AwaitingExternalResume`, together with the device data collected
    /// before the hand-off; otherwise it stays `Idle`.
    pub async fn restore(mut self) -> Result<Self> {
        if let Some(pending) = self.bridge.pending().await? {
            let state = FlowState::AwaitingExternalResume {
                brand: pending.token.originating_brand,
                token: pending.token,
            };
            tracing::info!(state = %state, "Restored pending external flow");
            self.emit(FlowUpdate::State(state.clone()));
            let flow = self.flow.get_mut();
            flow.state = state;
            flow.device_data = pending.device_data;
        }
        Ok(self)
    }

    pub fn request(&self) -> &DropInRequest {
        &self.request
    }

    pub async fn state(&self) -> FlowState {
        self.flow.lock().await.state.clone()
    }

    pub async fn outcome(&self) -> Option<DropInOutcome> {
        self.flow.lock().await.state.outcome().cloned()
    }

    /// Flow-start work: collects device data and consults the last-used
    /// cache to decide how the selection surface should open.
    pub async fn prepare(&self) -> Result<StartHint> {
        let state = self.state().await;
        if state != FlowState::Idle {
            return Err(DropInError::ValidationError(format!(
                "prepare must run before the first selection, flow is {}",
                state
            )));
        }

        if self.request.collect_device_data
            && let Some(collector) = &self.device_data
        {
            match collector.collect().await {
                Ok(blob) => self.flow.lock().await.device_data = Some(blob),
                Err(failure) => {
                    tracing::warn!(error = %failure, "Device data collection failed");
                }
            }
        }

        let last_used = self.cache.read().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Ignoring unreadable last-used payment method");
            None
        });
        tracing::debug!(last_used = ?last_used, "Read last-used payment method");

        let hint = match last_used {
            Some(PaymentMethodKind::WalletPay)
                if self.request.is_enabled(PaymentMethodKind::WalletPay) =>
            {
                match &self.wallet_readiness {
                    Some(readiness) if readiness.is_ready().await => StartHint::ReissueWalletPay,
                    _ => StartHint::ShowSelection,
                }
            }
            Some(kind) if self.request.is_enabled(kind) => StartHint::Preselect(kind),
            _ => StartHint::ShowSelection,
        };
        Ok(hint)
    }

    /// Applies a selection intent. Only accepted while `Idle`.
    ///
    /// In-process sources run to completion before this returns. Redirect
    /// sources return in `AwaitingExternalResume` once control has been
    /// handed to the external surface.
    pub async fn select(&self, intent: SelectionIntent) -> Result<FlowState> {
        let brand = intent.brand();
        let mut flow = self.flow.lock().await;
        if flow.state != FlowState::Idle {
            tracing::warn!(state = %flow.state, brand = %brand, "Rejecting selection intent");
            return Err(DropInError::SelectionRejected(flow.state.to_string()));
        }

        self.transition(&mut flow, FlowState::Dispatching { brand });

        if let SelectionIntent::Vaulted(reference) = intent {
            let next = self
                .apply_outcome(&mut flow, FlowOutcome::success(reference))
                .await;
            drop(flow);
            return self.settle(next).await;
        }

        if !self.request.is_enabled(brand) {
            let failure = FlowFailure::configuration(format!("{} is not enabled", brand));
            return Ok(self.terminate(&mut flow, DropInOutcome::Error { failure }));
        }
        let (Some(source), Some(request)) = (
            self.sources.get(brand).cloned(),
            self.request.flow_request(&intent),
        ) else {
            let failure =
                FlowFailure::configuration(format!("no flow source registered for {}", brand));
            return Ok(self.terminate(&mut flow, DropInOutcome::Error { failure }));
        };

        match source {
            FlowSource::InProcess(source) => {
                drop(flow);
                tracing::debug!(brand = %brand, "Dispatching in-process flow source");
                let outcome = source.tokenize(&request).await;

                let mut flow = self.flow.lock().await;
                if flow.state != (FlowState::Dispatching { brand }) {
                    tracing::warn!(state = %flow.state, brand = %brand, "Dropping late flow source outcome");
                    return Ok(flow.state.clone());
                }
                let next = self.apply_outcome(&mut flow, outcome).await;
                drop(flow);
                self.settle(next).await
            }
            FlowSource::Redirect(source) => {
                let token = ResumptionToken::new(brand);
                if let Err(e) = self.bridge.persist(&token, flow.device_data.clone()).await {
                    tracing::warn!(error = %e, brand = %brand, "Could not persist resumption token");
                    let failure = FlowFailure::lost_context(format!(
                        "could not persist resumption token: {}",
                        e
                    ));
                    return Ok(self.terminate(&mut flow, DropInOutcome::Error { failure }));
                }
                self.transition(
                    &mut flow,
                    FlowState::AwaitingExternalResume {
                        brand,
                        token: token.clone(),
                    },
                );
                drop(flow);

                tracing::debug!(brand = %brand, request_identity = %token.request_identity, "Launching external flow");
                let Err(failure) = source.launch(&request, &token).await else {
                    return Ok(self.state().await);
                };

                let mut flow = self.flow.lock().await;
                if !matches!(&flow.state, FlowState::AwaitingExternalResume { token: pending, .. } if pending.request_identity == token.request_identity)
                {
                    tracing::warn!(state = %flow.state, "Dropping late launch failure");
                    return Ok(flow.state.clone());
                }
                self.bridge.discard(token.request_identity).await?;
                let next = self.apply_outcome(&mut flow, failure.into()).await;
                drop(flow);
                self.settle(next).await
            }
        }
    }

    /// Delivers an external response to the flow waiting for it.
    ///
    /// Responses for a different flow are refused without touching any
    /// state. A response arriving after the flow ended is dropped.
    pub async fn resume(&self, response: ExternalResponse) -> Result<FlowState> {
        let mut flow = self.flow.lock().await;
        match &flow.state {
            FlowState::AwaitingExternalResume { brand, token } => {
                if token.request_identity != response.request_identity || *brand != response.brand
                {
                    tracing::warn!(
                        expected = %token.request_identity,
                        received = %response.request_identity,
                        "Refusing external response for another flow"
                    );
                    return Err(DropInError::LostContext(format!(
                        "response {} does not belong to the active flow",
                        response.request_identity
                    )));
                }
                let outcome = self.bridge.resume(&response).await?;
                let next = self.apply_outcome(&mut flow, outcome).await;
                drop(flow);
                self.settle(next).await
            }
            FlowState::Idle => {
                // Without a restore the stored token can never be matched.
                if let Some(stale) = self.bridge.clear().await? {
                    tracing::warn!(
                        request_identity = %stale.request_identity,
                        "Discarding resumption token of an unrestored flow"
                    );
                }
                let failure = FlowFailure::lost_context(format!(
                    "no flow is waiting for response {}",
                    response.request_identity
                ));
                Ok(self.terminate(&mut flow, DropInOutcome::Error { failure }))
            }
            FlowState::Terminal { .. } => {
                tracing::warn!(request_identity = %response.request_identity, "Dropping external response after flow ended");
                Ok(flow.state.clone())
            }
            state => {
                tracing::warn!(state = %state, "Refusing external response, no external flow pending");
                Err(DropInError::LostContext(format!(
                    "no external flow pending while {}",
                    state
                )))
            }
        }
    }

    /// User dismissed the whole drop-in surface.
    ///
    /// Accepted only while `Idle` or `Dispatching`. A pending external flow
    /// can only be cancelled by the external surface itself, through
    /// `resume`.
    pub async fn cancel(&self) -> Result<FlowState> {
        let mut flow = self.flow.lock().await;
        match flow.state {
            FlowState::Idle | FlowState::Dispatching { .. } => {
                Ok(self.terminate(&mut flow, DropInOutcome::UserCanceled))
            }
            _ => {
                tracing::warn!(state = %flow.state, "Rejecting cancel");
                Err(DropInError::CancelRejected(flow.state.to_string()))
            }
        }
    }

    /// Vault manager deletion. Never changes the selection state.
    pub async fn delete_vaulted_method(
        &self,
        reference: &PaymentMethodReference,
    ) -> Result<ResultCode> {
        let state = self.state().await;
        if state != FlowState::Idle {
            return Err(DropInError::ValidationError(format!(
                "vault manager is unavailable while {}",
                state
            )));
        }
        if !self.request.vault_manager_enabled {
            return Err(DropInError::ValidationError(
                "vault manager is not enabled".to_string(),
            ));
        }
        let Some(vault) = &self.vault else {
            return Err(DropInError::ValidationError(
                "no vault configured".to_string(),
            ));
        };

        tracing::info!(request = ?RequestKind::DeletePaymentMethod, token = %reference.token(), "Vault manager request");
        Ok(match vault.delete(reference).await {
            Ok(()) => ResultCode::Ok,
            Err(failure) if failure.kind == FlowErrorKind::UserCanceled => ResultCode::Canceled,
            Err(failure) => {
                tracing::warn!(error = %failure, "Vaulted payment method deletion failed");
                ResultCode::Error
            }
        })
    }

    pub async fn most_recent_payment_method(
        &self,
    ) -> std::result::Result<RecentPaymentMethod, FlowFailure> {
        let Some(vault) = &self.vault else {
            return Err(FlowFailure::configuration("no vault configured"));
        };
        fetch_most_recent_payment_method(
            &self.request,
            &self.cache,
            self.wallet_readiness.as_deref(),
            &**vault,
        )
        .await
    }

    /// Outcome of a tokenizing source, from `Dispatching` or
    /// `AwaitingExternalResume`.
    async fn apply_outcome(&self, flow: &mut Flow, outcome: FlowOutcome) -> Next {
        match outcome {
            FlowOutcome::Success { reference } => {
                let decision = step_up::decide(&reference, &self.request, flow.step_up_performed);
                if decision.required {
                    flow.step_up_performed = true;
                    self.transition(
                        flow,
                        FlowState::AwaitingStepUp {
                            reference: reference.clone(),
                        },
                    );
                    Next::StepUp {
                        request: decision.flow_request(),
                        reference,
                    }
                } else {
                    Next::Done(self.finalize(flow, reference).await)
                }
            }
            FlowOutcome::Cancel => Next::Done(self.terminate(flow, DropInOutcome::UserCanceled)),
            FlowOutcome::Error { failure } if failure.kind == FlowErrorKind::UserCanceled => {
                Next::Done(self.terminate(flow, DropInOutcome::UserCanceled))
            }
            FlowOutcome::Error { failure } => {
                Next::Done(self.terminate(flow, DropInOutcome::Error { failure }))
            }
        }
    }

    /// Runs pending step-up work without holding the flow lock.
    async fn settle(&self, next: Next) -> Result<FlowState> {
        let (request, reference) = match next {
            Next::Done(state) => return Ok(state),
            Next::StepUp { request, reference } => (request, reference),
        };

        tracing::debug!(brand = %reference.kind(), "Dispatching step-up verification");
        let outcome = self.sources.step_up().tokenize(&request).await;

        let mut flow = self.flow.lock().await;
        if !matches!(&flow.state, FlowState::AwaitingStepUp { reference: pending } if *pending == reference)
        {
            tracing::warn!(state = %flow.state, "Dropping late step-up outcome");
            return Ok(flow.state.clone());
        }

        // The verification assertion never replaces the selected method.
        Ok(match outcome {
            FlowOutcome::Success { .. } => self.finalize(&mut flow, reference).await,
            FlowOutcome::Cancel => self.terminate(&mut flow, DropInOutcome::UserCanceled),
            FlowOutcome::Error { failure } if failure.kind == FlowErrorKind::UserCanceled => {
                self.terminate(&mut flow, DropInOutcome::UserCanceled)
            }
            FlowOutcome::Error { failure } => {
                self.terminate(&mut flow, DropInOutcome::Error { failure })
            }
        })
    }

    async fn finalize(&self, flow: &mut Flow, reference: PaymentMethodReference) -> FlowState {
        self.transition(
            flow,
            FlowState::Finalizing {
                reference: reference.clone(),
            },
        );
        if let Err(e) = self.cache.record(reference.kind()).await {
            tracing::warn!(error = %e, "Could not record last-used payment method");
        }
        let device_data = flow.device_data.clone();
        self.terminate(
            flow,
            DropInOutcome::Success {
                reference,
                device_data,
            },
        )
    }

    fn terminate(&self, flow: &mut Flow, outcome: DropInOutcome) -> FlowState {
        self.transition(flow, FlowState::Terminal { outcome });
        flow.state.clone()
    }

    /// Moves to `next` unless the flow already ended.
    fn transition(&self, flow: &mut Flow, next: FlowState) -> bool {
        if flow.state.is_terminal() {
            tracing::warn!(state = %flow.state, dropped = %next, "Ignoring transition after terminal state");
            return false;
        }
        tracing::info!(from = %flow.state, to = %next, "Flow state transition");
        flow.state = next;
        self.emit(FlowUpdate::State(flow.state.clone()));
        if let FlowState::Terminal { outcome } = &flow.state {
            self.emit(FlowUpdate::Outcome(outcome.clone()));
        }
        true
    }

    fn emit(&self, update: FlowUpdate) {
        if let Some(updates) = &self.updates {
            // A host that stopped listening does not stop the flow.
            let _ = updates.send(update);
        }
    }
}
