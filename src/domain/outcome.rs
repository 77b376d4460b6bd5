use serde::{Deserialize, Serialize};
use std::fmt;

use super::payment_method::PaymentMethodReference;

/// Uniform error classification shared by every flow source.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum FlowErrorKind {
    UserCanceled,
    ConfigurationError,
    NetworkError,
    UnexpectedResponse,
    /// An external round trip came back with nothing to correlate it with.
    LostContext,
}

impl FlowErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserCanceled => "user_canceled",
            Self::ConfigurationError => "configuration_error",
            Self::NetworkError => "network_error",
            Self::UnexpectedResponse => "unexpected_response",
            Self::LostContext => "lost_context",
        }
    }
}

impl fmt::Display for FlowErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct FlowFailure {
    pub kind: FlowErrorKind,
    pub detail: String,
}

impl FlowFailure {
    pub fn new(kind: FlowErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn configuration(detail: impl Into<String>) -> Self {
        Self::new(FlowErrorKind::ConfigurationError, detail)
    }

    pub fn lost_context(detail: impl Into<String>) -> Self {
        Self::new(FlowErrorKind::LostContext, detail)
    }
}

impl fmt::Display for FlowFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.detail)
    }
}

/// What a single flow source reports back, exactly once per dispatch.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum FlowOutcome {
    Success { reference: PaymentMethodReference },
    Cancel,
    Error { failure: FlowFailure },
}

impl FlowOutcome {
    pub fn success(reference: PaymentMethodReference) -> Self {
        Self::Success { reference }
    }

    pub fn error(kind: FlowErrorKind, detail: impl Into<String>) -> Self {
        Self::Error {
            failure: FlowFailure::new(kind, detail),
        }
    }

    pub fn lost_context(detail: impl Into<String>) -> Self {
        Self::error(FlowErrorKind::LostContext, detail)
    }
}

impl From<FlowFailure> for FlowOutcome {
    fn from(failure: FlowFailure) -> Self {
        Self::Error { failure }
    }
}

/// The one value handed to the caller when a drop-in flow ends.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum DropInOutcome {
    Success {
        reference: PaymentMethodReference,
        device_data: Option<String>,
    },
    UserCanceled,
    Error {
        failure: FlowFailure,
    },
}

impl DropInOutcome {
    pub fn result_code(&self) -> ResultCode {
        match self {
            Self::Success { .. } => ResultCode::Ok,
            Self::UserCanceled => ResultCode::Canceled,
            Self::Error { .. } => ResultCode::Error,
        }
    }

    pub fn reference(&self) -> Option<&PaymentMethodReference> {
        match self {
            Self::Success { reference, .. } => Some(reference),
            _ => None,
        }
    }
}

/// Result codes surfaced at the host boundary.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum ResultCode {
    Ok,
    Canceled,
    Error,
}

/// Sub-flows the host can launch from the drop-in surface.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    CardEntry,
    DeletePaymentMethod,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment_method::PaymentMethodKind;

    #[test]
    fn test_result_codes() {
        let success = DropInOutcome::Success {
            reference: PaymentMethodReference::new(PaymentMethodKind::Card, "tok"),
            device_data: None,
        };
        assert_eq!(success.result_code(), ResultCode::Ok);
        assert_eq!(DropInOutcome::UserCanceled.result_code(), ResultCode::Canceled);
        assert_eq!(
            DropInOutcome::Error {
                failure: FlowFailure::lost_context("gone")
            }
            .result_code(),
            ResultCode::Error
        );
    }

    #[test]
    fn test_flow_outcome_deserialization() {
        let json = r#"{"result":"error","failure":{"kind":"network_error","detail":"timeout"}}"#;
        let outcome: FlowOutcome = serde_json::from_str(json).unwrap();
        assert_eq!(
            outcome,
            FlowOutcome::error(FlowErrorKind::NetworkError, "timeout")
        );

        let cancel: FlowOutcome = serde_json::from_str(r#"{"result":"cancel"}"#).unwrap();
        assert_eq!(cancel, FlowOutcome::Cancel);
    }
}
