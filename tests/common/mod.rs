#![allow(dead_code)]

use async_trait::async_trait;
use dropin::application::engine::{DropInEngine, FlowUpdate};
use dropin::application::sources::FlowSources;
use dropin::domain::outcome::FlowOutcome;
use dropin::domain::payment_method::{PaymentMethodKind, PaymentMethodReference};
use dropin::domain::ports::{
    KeyValueStore, KeyValueStoreRef, RedirectSourceRef, TokenizationSource, TokenizationSourceRef,
};
use dropin::domain::request::{DropInRequest, FlowRequest};
use dropin::error::{DropInError, Result};
use dropin::infrastructure::in_memory::InMemoryKeyValueStore;
use dropin::infrastructure::simulated::ScriptedTokenizer;
use std::sync::Arc;
use tokio::sync::{Notify, mpsc};

pub fn card_ref() -> PaymentMethodReference {
    PaymentMethodReference::new(PaymentMethodKind::Card, "tok_card")
}

pub fn paypal_ref() -> PaymentMethodReference {
    PaymentMethodReference::new(PaymentMethodKind::PayPal, "tok_paypal")
}

/// Assembles an engine around scripted collaborators.
pub struct EngineBuilder {
    request: DropInRequest,
    store: KeyValueStoreRef,
    step_up: TokenizationSourceRef,
    in_process: Vec<(PaymentMethodKind, TokenizationSourceRef)>,
    redirect: Vec<(PaymentMethodKind, RedirectSourceRef)>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            request: DropInRequest::default(),
            store: Arc::new(InMemoryKeyValueStore::new()),
            step_up: Arc::new(ScriptedTokenizer::new(FlowOutcome::success(
                PaymentMethodReference::new(PaymentMethodKind::Card, "tok_assertion"),
            ))),
            in_process: Vec::new(),
            redirect: Vec::new(),
        }
    }

    pub fn request(mut self, request: DropInRequest) -> Self {
        self.request = request;
        self
    }

    pub fn store(mut self, store: KeyValueStoreRef) -> Self {
        self.store = store;
        self
    }

    pub fn step_up(mut self, source: TokenizationSourceRef) -> Self {
        self.step_up = source;
        self
    }

    pub fn in_process(mut self, kind: PaymentMethodKind, source: TokenizationSourceRef) -> Self {
        self.in_process.push((kind, source));
        self
    }

    pub fn redirect(mut self, kind: PaymentMethodKind, source: RedirectSourceRef) -> Self {
        self.redirect.push((kind, source));
        self
    }

    pub fn build(self) -> (DropInEngine, mpsc::UnboundedReceiver<FlowUpdate>) {
        let mut sources = FlowSources::new(self.step_up);
        for (kind, source) in self.in_process {
            sources = sources.in_process(kind, source);
        }
        for (kind, source) in self.redirect {
            sources = sources.redirect(kind, source);
        }
        let (tx, rx) = mpsc::unbounded_channel();
        let engine = DropInEngine::new(self.request, sources, self.store).with_updates(tx);
        (engine, rx)
    }
}

/// Collects every update sent so far without waiting for more.
pub fn drain(updates: &mut mpsc::UnboundedReceiver<FlowUpdate>) -> Vec<FlowUpdate> {
    let mut received = Vec::new();
    while let Ok(update) = updates.try_recv() {
        received.push(update);
    }
    received
}

/// A tokenizer that parks inside `tokenize` until released.
pub struct GatedTokenizer {
    outcome: FlowOutcome,
    pub entered: Notify,
    pub release: Notify,
}

impl GatedTokenizer {
    pub fn new(outcome: FlowOutcome) -> Self {
        Self {
            outcome,
            entered: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl TokenizationSource for GatedTokenizer {
    async fn tokenize(&self, _request: &FlowRequest) -> FlowOutcome {
        self.entered.notify_one();
        self.release.notified().await;
        self.outcome.clone()
    }
}

/// A store that reads and deletes normally but refuses every write.
pub struct FailingWriteStore {
    inner: InMemoryKeyValueStore,
}

impl FailingWriteStore {
    pub fn new() -> Self {
        Self {
            inner: InMemoryKeyValueStore::new(),
        }
    }
}

#[async_trait]
impl KeyValueStore for FailingWriteStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.inner.get(key).await
    }

    async fn put(&self, _key: &str, _value: Vec<u8>) -> Result<()> {
        Err(DropInError::IoError(std::io::Error::other("disk full")))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.inner.delete(key).await
    }
}
