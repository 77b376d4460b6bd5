use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DropInError;

/// The payment brands drop-in knows how to present and tokenize.
///
/// Doubles as the `brand` of a selection and the `kind` of a tokenized
/// reference. `Other` covers vaulted methods of brands drop-in cannot start
/// itself.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodKind {
    Card,
    #[serde(rename = "paypal")]
    PayPal,
    Venmo,
    WalletPay,
    Other,
}

impl PaymentMethodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::PayPal => "paypal",
            Self::Venmo => "venmo",
            Self::WalletPay => "wallet_pay",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for PaymentMethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethodKind {
    type Err = DropInError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "card" => Ok(Self::Card),
            "paypal" => Ok(Self::PayPal),
            "venmo" => Ok(Self::Venmo),
            "wallet_pay" | "walletpay" => Ok(Self::WalletPay),
            "other" => Ok(Self::Other),
            other => Err(DropInError::ValidationError(format!(
                "Unknown payment method kind: {}",
                other
            ))),
        }
    }
}

/// A tokenized payment method ("nonce").
///
/// Immutable once created. Only flow sources create fresh references; the
/// engine carries them untouched until they are handed to the caller.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct PaymentMethodReference {
    kind: PaymentMethodKind,
    token: String,
    #[serde(default)]
    is_network_tokenized: bool,
    #[serde(default)]
    details: serde_json::Value,
}

impl PaymentMethodReference {
    pub fn new(kind: PaymentMethodKind, token: impl Into<String>) -> Self {
        Self {
            kind,
            token: token.into(),
            is_network_tokenized: false,
            details: serde_json::Value::Null,
        }
    }

    /// Creates a wallet-pay reference. The network-tokenized flag is reported
    /// by the wallet itself and taken at face value.
    pub fn wallet_pay(token: impl Into<String>, is_network_tokenized: bool) -> Self {
        Self {
            is_network_tokenized,
            ..Self::new(PaymentMethodKind::WalletPay, token)
        }
    }

    pub fn with_details(self, details: serde_json::Value) -> Self {
        Self { details, ..self }
    }

    pub fn kind(&self) -> PaymentMethodKind {
        self.kind
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Always `false` for anything but wallet-pay.
    pub fn is_network_tokenized(&self) -> bool {
        self.kind == PaymentMethodKind::WalletPay && self.is_network_tokenized
    }

    pub fn details(&self) -> &serde_json::Value {
        &self.details
    }
}
