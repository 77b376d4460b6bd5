use crate::domain::outcome::DropInOutcome;
use crate::domain::state::FlowState;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct StateRow {
    step: usize,
    state: &'static str,
    kind: String,
    detail: String,
}

impl StateRow {
    fn from_state(step: usize, state: &FlowState) -> Self {
        let detail = match state {
            FlowState::Idle | FlowState::Dispatching { .. } => String::new(),
            FlowState::AwaitingExternalResume { token, .. } => token.request_identity.to_string(),
            FlowState::AwaitingStepUp { reference } | FlowState::Finalizing { reference } => {
                reference.token().to_string()
            }
            FlowState::Terminal { outcome } => match outcome {
                DropInOutcome::Success { reference, .. } => reference.token().to_string(),
                DropInOutcome::UserCanceled => "user_canceled".to_string(),
                DropInOutcome::Error { failure } => failure.kind.to_string(),
            },
        };
        let kind = match state {
            FlowState::Terminal { outcome } => match outcome {
                DropInOutcome::Success { reference, .. } => {
                    format!("success:{}", reference.kind())
                }
                DropInOutcome::UserCanceled => "canceled".to_string(),
                DropInOutcome::Error { .. } => "error".to_string(),
            },
            other => other.brand().map(|b| b.to_string()).unwrap_or_default(),
        };
        Self {
            step,
            state: state.name(),
            kind,
            detail,
        }
    }
}

/// Writes the trail of flow states as CSV.
///
/// One row per state, numbered in the order the flow entered them.
pub struct StateWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> StateWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_states<'a>(
        &mut self,
        states: impl IntoIterator<Item = &'a FlowState>,
    ) -> Result<()> {
        for (i, state) in states.into_iter().enumerate() {
            self.writer.serialize(StateRow::from_state(i + 1, state))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::outcome::FlowFailure;
    use crate::domain::payment_method::{PaymentMethodKind, PaymentMethodReference};

    fn render(states: &[FlowState]) -> String {
        let mut buf = Vec::new();
        StateWriter::new(&mut buf).write_states(states).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_writes_header_and_rows() {
        let reference = PaymentMethodReference::new(PaymentMethodKind::Card, "tok_card");
        let output = render(&[
            FlowState::Dispatching {
                brand: PaymentMethodKind::Card,
            },
            FlowState::Finalizing {
                reference: reference.clone(),
            },
            FlowState::Terminal {
                outcome: DropInOutcome::Success {
                    reference,
                    device_data: None,
                },
            },
        ]);

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "step,state,kind,detail");
        assert_eq!(lines[1], "1,dispatching,card,");
        assert_eq!(lines[2], "2,finalizing,card,tok_card");
        assert_eq!(lines[3], "3,terminal,success:card,tok_card");
    }

    #[test]
    fn test_error_rows() {
        let output = render(&[FlowState::Terminal {
            outcome: DropInOutcome::Error {
                failure: FlowFailure::lost_context("no token"),
            },
        }]);
        assert!(output.contains("1,terminal,error,lost_context"));
    }
}
