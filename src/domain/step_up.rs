//! Step-up verification policy.
//!
//! Decides whether a freshly tokenized payment method must pass an extra
//! authentication challenge before the flow may finish with it.

use rust_decimal::Decimal;

use super::payment_method::{PaymentMethodKind, PaymentMethodReference};
use super::request::{DropInRequest, FlowRequest};

#[derive(Debug, PartialEq, Clone)]
pub struct StepUpDecision {
    pub required: bool,
    pub amount: Option<Decimal>,
    pub nonce: String,
}

impl StepUpDecision {
    fn skip(reference: &PaymentMethodReference) -> Self {
        Self {
            required: false,
            amount: None,
            nonce: reference.token().to_string(),
        }
    }

    /// Parameters for the step-up flow source.
    pub fn flow_request(&self) -> FlowRequest {
        FlowRequest::StepUp {
            nonce: self.nonce.clone(),
            amount: self.amount,
        }
    }
}

/// Whether `reference` can be challenged at all.
///
/// Network-tokenized wallet credentials already carry strong customer
/// authentication.
pub fn is_eligible(reference: &PaymentMethodReference) -> bool {
    match reference.kind() {
        PaymentMethodKind::Card => true,
        PaymentMethodKind::WalletPay => !reference.is_network_tokenized(),
        _ => false,
    }
}

/// Evaluates the step-up rules in order. Never requires a second step-up
/// within one flow instance.
pub fn decide(
    reference: &PaymentMethodReference,
    request: &DropInRequest,
    already_performed: bool,
) -> StepUpDecision {
    if already_performed || !request.step_up_requested || !is_eligible(reference) {
        return StepUpDecision::skip(reference);
    }

    let amount = request
        .step_up_request
        .as_ref()
        .and_then(|step_up| step_up.amount)
        .or(request.amount)
        .map(Decimal::from);

    StepUpDecision {
        required: true,
        amount,
        nonce: reference.token().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::request::{Amount, StepUpRequest};
    use rust_decimal_macros::dec;

    const ALL_KINDS: [PaymentMethodKind; 5] = [
        PaymentMethodKind::Card,
        PaymentMethodKind::PayPal,
        PaymentMethodKind::Venmo,
        PaymentMethodKind::WalletPay,
        PaymentMethodKind::Other,
    ];

    fn step_up_config() -> DropInRequest {
        DropInRequest {
            step_up_requested: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_never_steps_up_twice() {
        let configs = [DropInRequest::default(), step_up_config()];
        for kind in ALL_KINDS {
            for tokenized in [false, true] {
                let reference = if kind == PaymentMethodKind::WalletPay {
                    PaymentMethodReference::wallet_pay("tok", tokenized)
                } else {
                    PaymentMethodReference::new(kind, "tok")
                };
                for config in &configs {
                    assert!(!decide(&reference, config, true).required);
                }
            }
        }
    }

    #[test]
    fn test_card_requires_step_up_when_requested() {
        let reference = PaymentMethodReference::new(PaymentMethodKind::Card, "tok_card");
        let decision = decide(&reference, &step_up_config(), false);
        assert!(decision.required);
        assert_eq!(decision.nonce, "tok_card");
    }

    #[test]
    fn test_not_requested_means_not_required() {
        let reference = PaymentMethodReference::new(PaymentMethodKind::Card, "tok_card");
        assert!(!decide(&reference, &DropInRequest::default(), false).required);
    }

    #[test]
    fn test_network_tokenized_wallet_pay_skips_step_up() {
        let reference = PaymentMethodReference::wallet_pay("tok_wallet", true);
        assert!(!decide(&reference, &step_up_config(), false).required);
        assert!(!decide(&reference, &DropInRequest::default(), false).required);

        let plain = PaymentMethodReference::wallet_pay("tok_wallet", false);
        assert!(decide(&plain, &step_up_config(), false).required);
    }

    #[test]
    fn test_wallets_and_other_kinds_never_step_up() {
        for kind in [
            PaymentMethodKind::PayPal,
            PaymentMethodKind::Venmo,
            PaymentMethodKind::Other,
        ] {
            let reference = PaymentMethodReference::new(kind, "tok");
            assert!(!decide(&reference, &step_up_config(), false).required);
        }
    }

    #[test]
    fn test_amount_precedence() {
        let reference = PaymentMethodReference::new(PaymentMethodKind::Card, "tok_card");

        let mut config = step_up_config();
        assert_eq!(decide(&reference, &config, false).amount, None);

        config.amount = Some(Amount::new(dec!(10.00)).unwrap());
        assert_eq!(decide(&reference, &config, false).amount, Some(dec!(10.00)));

        config.step_up_request = Some(StepUpRequest { amount: None });
        assert_eq!(decide(&reference, &config, false).amount, Some(dec!(10.00)));

        config.step_up_request = Some(StepUpRequest {
            amount: Some(Amount::new(dec!(2.50)).unwrap()),
        });
        let decision = decide(&reference, &config, false);
        assert_eq!(decision.amount, Some(dec!(2.50)));
        assert_eq!(
            decision.flow_request(),
            FlowRequest::StepUp {
                nonce: "tok_card".to_string(),
                amount: Some(dec!(2.50)),
            }
        );
    }
}
