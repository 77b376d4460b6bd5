use crate::domain::outcome::FlowOutcome;
use crate::domain::payment_method::PaymentMethodKind;
use crate::domain::ports::KeyValueStoreRef;
use crate::domain::state::ResumptionToken;
use crate::error::Result;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

pub const PENDING_RESUME_KEY: &str = "dropin.pending_resume";
pub const DEFAULT_RESUME_TTL_MINUTES: i64 = 30;

/// What the external surface hands back when control returns to the host.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct ExternalResponse {
    pub request_identity: Uuid,
    pub brand: PaymentMethodKind,
    pub outcome: FlowOutcome,
}

/// What is kept on disk while control is outside the process.
///
/// Device data collected before the hand-off travels with the token so the
/// resumed flow can still attach it to its outcome.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct PendingResume {
    pub token: ResumptionToken,
    #[serde(default)]
    pub device_data: Option<String>,
}

/// Correlates external responses with the flow that left the process.
///
/// Holds at most one pending `ResumptionToken`. A token is consumed by the
/// first response that matches it; anything else resolves to `LostContext`.
#[derive(Clone)]
pub struct ResumeBridge {
    store: KeyValueStoreRef,
    ttl: Duration,
    consume: Arc<Mutex<()>>,
}

impl ResumeBridge {
    pub fn new(store: KeyValueStoreRef) -> Self {
        Self {
            store,
            ttl: Duration::minutes(DEFAULT_RESUME_TTL_MINUTES),
            consume: Arc::new(Mutex::new(())),
        }
    }

    pub fn with_ttl(self, ttl: Duration) -> Self {
        Self { ttl, ..self }
    }

    /// Must complete before control leaves the process.
    pub async fn persist(
        &self,
        token: &ResumptionToken,
        device_data: Option<String>,
    ) -> Result<()> {
        let value = serde_json::to_vec(&PendingResume {
            token: token.clone(),
            device_data,
        })?;
        self.store.put(PENDING_RESUME_KEY, value).await
    }

    /// The pending token, if there is one and it has not expired.
    ///
    /// Expired tokens are removed.
    pub async fn pending(&self) -> Result<Option<PendingResume>> {
        let _guard = self.consume.lock().await;
        match self.load().await? {
            Some(pending) if pending.token.is_expired(Utc::now(), self.ttl) => {
                tracing::warn!(
                    request_identity = %pending.token.request_identity,
                    brand = %pending.token.originating_brand,
                    "Discarding expired resumption token"
                );
                self.store.delete(PENDING_RESUME_KEY).await?;
                Ok(None)
            }
            other => Ok(other),
        }
    }

    /// Drops the pending token if it belongs to `request_identity`.
    pub async fn discard(&self, request_identity: Uuid) -> Result<()> {
        let _guard = self.consume.lock().await;
        if let Some(pending) = self.load().await?
            && pending.token.request_identity == request_identity
        {
            self.store.delete(PENDING_RESUME_KEY).await?;
        }
        Ok(())
    }

    /// Drops whatever token is pending, returning it.
    pub async fn clear(&self) -> Result<Option<ResumptionToken>> {
        let _guard = self.consume.lock().await;
        let pending = self.load().await?;
        if pending.is_some() {
            self.store.delete(PENDING_RESUME_KEY).await?;
        }
        Ok(pending.map(|p| p.token))
    }

    /// Resolves an external response against the pending token.
    ///
    /// Mismatched responses leave the pending token in place.
    pub async fn resume(&self, response: &ExternalResponse) -> Result<FlowOutcome> {
        let _guard = self.consume.lock().await;

        let Some(PendingResume { token, .. }) = self.load().await? else {
            tracing::warn!(
                request_identity = %response.request_identity,
                "No pending external flow for response"
            );
            return Ok(FlowOutcome::lost_context("no pending external flow"));
        };

        if token.request_identity != response.request_identity
            || token.originating_brand != response.brand
        {
            tracing::warn!(
                expected = %token.request_identity,
                received = %response.request_identity,
                brand = %response.brand,
                "External response does not match the pending flow"
            );
            return Ok(FlowOutcome::lost_context(
                "external response does not match the pending flow",
            ));
        }

        self.store.delete(PENDING_RESUME_KEY).await?;

        if token.is_expired(Utc::now(), self.ttl) {
            tracing::warn!(request_identity = %token.request_identity, "Resumption token expired");
            return Ok(FlowOutcome::lost_context("resumption token expired"));
        }

        tracing::debug!(request_identity = %token.request_identity, "Resumption token consumed");
        Ok(response.outcome.clone())
    }

    async fn load(&self) -> Result<Option<PendingResume>> {
        match self.store.get(PENDING_RESUME_KEY).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}
