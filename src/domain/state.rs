use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::outcome::DropInOutcome;
use super::payment_method::{PaymentMethodKind, PaymentMethodReference};

/// Correlates an external round trip with the flow that started it.
///
/// Persisted before control leaves the process, consumed exactly once on
/// resume.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct ResumptionToken {
    pub originating_brand: PaymentMethodKind,
    pub request_identity: Uuid,
    pub created_at: DateTime<Utc>,
}

impl ResumptionToken {
    pub fn new(originating_brand: PaymentMethodKind) -> Self {
        Self {
            originating_brand,
            request_identity: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.created_at > ttl
    }
}

/// The single active state of a drop-in flow instance.
///
/// `Terminal` is absorbing.
#[derive(Debug, Serialize, PartialEq, Clone)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FlowState {
    Idle,
    Dispatching {
        brand: PaymentMethodKind,
    },
    AwaitingExternalResume {
        brand: PaymentMethodKind,
        token: ResumptionToken,
    },
    AwaitingStepUp {
        reference: PaymentMethodReference,
    },
    Finalizing {
        reference: PaymentMethodReference,
    },
    Terminal {
        outcome: DropInOutcome,
    },
}

impl FlowState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Dispatching { .. } => "dispatching",
            Self::AwaitingExternalResume { .. } => "awaiting_external_resume",
            Self::AwaitingStepUp { .. } => "awaiting_step_up",
            Self::Finalizing { .. } => "finalizing",
            Self::Terminal { .. } => "terminal",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal { .. })
    }

    pub fn outcome(&self) -> Option<&DropInOutcome> {
        match self {
            Self::Terminal { outcome } => Some(outcome),
            _ => None,
        }
    }

    pub fn brand(&self) -> Option<PaymentMethodKind> {
        match self {
            Self::Dispatching { brand } | Self::AwaitingExternalResume { brand, .. } => {
                Some(*brand)
            }
            Self::AwaitingStepUp { reference } | Self::Finalizing { reference } => {
                Some(reference.kind())
            }
            Self::Terminal { outcome } => outcome.reference().map(|r| r.kind()),
            Self::Idle => None,
        }
    }
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.brand() {
            Some(brand) => write!(f, "{}({})", self.name(), brand),
            None => f.write_str(self.name()),
        }
    }
}

/// How the selection surface should open, based on the last-used brand.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum StartHint {
    /// Skip the selection list and re-launch wallet-pay directly.
    ReissueWalletPay,
    /// Show the list with this brand highlighted.
    Preselect(PaymentMethodKind),
    ShowSelection,
}
