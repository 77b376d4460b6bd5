use crate::domain::payment_method::PaymentMethodKind;
use crate::domain::ports::{RedirectSourceRef, TokenizationSourceRef};
use std::collections::HashMap;

/// A registered flow source for one payment brand.
#[derive(Clone)]
pub enum FlowSource {
    InProcess(TokenizationSourceRef),
    Redirect(RedirectSourceRef),
}

/// Maps each brand to the source that tokenizes it.
///
/// The step-up source is mandatory: any flow may need it once a card or
/// non-network-tokenized wallet credential comes back.
#[derive(Clone)]
pub struct FlowSources {
    sources: HashMap<PaymentMethodKind, FlowSource>,
    step_up: TokenizationSourceRef,
}

impl FlowSources {
    pub fn new(step_up: TokenizationSourceRef) -> Self {
        Self {
            sources: HashMap::new(),
            step_up,
        }
    }

    pub fn in_process(mut self, kind: PaymentMethodKind, source: TokenizationSourceRef) -> Self {
        self.sources.insert(kind, FlowSource::InProcess(source));
        self
    }

    pub fn redirect(mut self, kind: PaymentMethodKind, source: RedirectSourceRef) -> Self {
        self.sources.insert(kind, FlowSource::Redirect(source));
        self
    }

    pub fn get(&self, kind: PaymentMethodKind) -> Option<&FlowSource> {
        self.sources.get(&kind)
    }

    pub fn step_up(&self) -> &TokenizationSourceRef {
        &self.step_up
    }
}
