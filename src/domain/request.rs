use crate::error::DropInError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::payment_method::{PaymentMethodKind, PaymentMethodReference};

/// Represents a positive monetary amount for a checkout.
///
/// Wraps `rust_decimal::Decimal` so that zero or negative amounts can never
/// reach a flow source or the step-up challenge.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, DropInError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(DropInError::ValidationError(
                "Amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = DropInError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

/// Credentials the merchant app launched drop-in with.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Authorization {
    ClientToken(String),
    TokenizationKey(String),
}

/// Parameters for the step-up (3-D Secure style) challenge.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
#[serde(default)]
pub struct StepUpRequest {
    pub amount: Option<Amount>,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum PayPalFlow {
    /// One-time payment for a known amount.
    Checkout,
    /// Billing agreement, vaulted for later charges.
    Vault,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
#[serde(default)]
pub struct PayPalRequest {
    pub amount: Option<Amount>,
    pub currency_code: Option<String>,
}

impl PayPalRequest {
    pub fn flow(&self) -> PayPalFlow {
        if self.amount.is_some() {
            PayPalFlow::Checkout
        } else {
            PayPalFlow::Vault
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
#[serde(default)]
pub struct WalletPayRequest {
    pub total_price: Option<Amount>,
    pub currency_code: Option<String>,
    pub email_required: bool,
}

/// The merchant's configuration for one drop-in flow instance.
///
/// Supplied once, before the flow leaves `Idle`, and never mutated
/// afterwards.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(default)]
pub struct DropInRequest {
    pub authorization: Option<Authorization>,
    pub amount: Option<Amount>,
    pub step_up_requested: bool,
    pub step_up_request: Option<StepUpRequest>,
    pub paypal_request: Option<PayPalRequest>,
    pub wallet_pay_request: Option<WalletPayRequest>,
    pub collect_device_data: bool,
    pub vault_venmo: bool,
    pub vault_manager_enabled: bool,
    pub card_enabled: bool,
    pub paypal_enabled: bool,
    pub venmo_enabled: bool,
    pub wallet_pay_enabled: bool,
}

impl Default for DropInRequest {
    fn default() -> Self {
        Self {
            authorization: None,
            amount: None,
            step_up_requested: false,
            step_up_request: None,
            paypal_request: None,
            wallet_pay_request: None,
            collect_device_data: false,
            vault_venmo: false,
            vault_manager_enabled: false,
            card_enabled: true,
            paypal_enabled: true,
            venmo_enabled: true,
            wallet_pay_enabled: true,
        }
    }
}

impl DropInRequest {
    pub fn is_enabled(&self, kind: PaymentMethodKind) -> bool {
        match kind {
            PaymentMethodKind::Card => self.card_enabled,
            PaymentMethodKind::PayPal => self.paypal_enabled,
            PaymentMethodKind::Venmo => self.venmo_enabled,
            PaymentMethodKind::WalletPay => self.wallet_pay_enabled,
            PaymentMethodKind::Other => false,
        }
    }

    /// Brands that may be offered for fresh tokenization, in display order.
    pub fn enabled_methods(&self) -> Vec<PaymentMethodKind> {
        [
            PaymentMethodKind::Card,
            PaymentMethodKind::PayPal,
            PaymentMethodKind::Venmo,
            PaymentMethodKind::WalletPay,
        ]
        .into_iter()
        .filter(|kind| self.is_enabled(*kind))
        .collect()
    }

    /// Builds the brand-specific parameters for a fresh tokenization.
    ///
    /// Returns `None` for vaulted selections, which need no flow source.
    pub fn flow_request(&self, intent: &SelectionIntent) -> Option<FlowRequest> {
        match intent {
            SelectionIntent::Card(entry) => Some(FlowRequest::Card {
                entry: entry.clone(),
            }),
            SelectionIntent::PayPal => Some(FlowRequest::PayPal(
                self.paypal_request.clone().unwrap_or_default(),
            )),
            SelectionIntent::Venmo => Some(FlowRequest::Venmo {
                vault: self.vault_venmo,
            }),
            SelectionIntent::WalletPay => Some(FlowRequest::WalletPay(
                self.wallet_pay_request.clone().unwrap_or_default(),
            )),
            SelectionIntent::Vaulted(_) => None,
        }
    }
}

/// Card form contents, already validated by the card form itself.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct CardEntry(pub serde_json::Value);

/// What the user picked on the selection surface.
#[derive(Debug, PartialEq, Clone)]
pub enum SelectionIntent {
    Card(CardEntry),
    PayPal,
    Venmo,
    WalletPay,
    Vaulted(PaymentMethodReference),
}

impl SelectionIntent {
    pub fn brand(&self) -> PaymentMethodKind {
        match self {
            Self::Card(_) => PaymentMethodKind::Card,
            Self::PayPal => PaymentMethodKind::PayPal,
            Self::Venmo => PaymentMethodKind::Venmo,
            Self::WalletPay => PaymentMethodKind::WalletPay,
            Self::Vaulted(reference) => reference.kind(),
        }
    }

    /// Intent for a fresh tokenization of `kind`.
    pub fn for_kind(kind: PaymentMethodKind) -> Option<Self> {
        match kind {
            PaymentMethodKind::Card => Some(Self::Card(CardEntry::default())),
            PaymentMethodKind::PayPal => Some(Self::PayPal),
            PaymentMethodKind::Venmo => Some(Self::Venmo),
            PaymentMethodKind::WalletPay => Some(Self::WalletPay),
            PaymentMethodKind::Other => None,
        }
    }
}

/// Parameters handed to a flow source when it is started.
#[derive(Debug, PartialEq, Clone)]
pub enum FlowRequest {
    Card { entry: CardEntry },
    PayPal(PayPalRequest),
    Venmo { vault: bool },
    WalletPay(WalletPayRequest),
    StepUp { nonce: String, amount: Option<Decimal> },
}
