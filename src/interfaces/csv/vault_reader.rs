use crate::domain::payment_method::{PaymentMethodKind, PaymentMethodReference};
use crate::error::{DropInError, Result};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize)]
struct VaultRow {
    kind: PaymentMethodKind,
    token: String,
    #[serde(default)]
    network_tokenized: Option<bool>,
}

impl From<VaultRow> for PaymentMethodReference {
    fn from(row: VaultRow) -> Self {
        match row.kind {
            PaymentMethodKind::WalletPay => PaymentMethodReference::wallet_pay(
                row.token,
                row.network_tokenized.unwrap_or(false),
            ),
            kind => PaymentMethodReference::new(kind, row.token),
        }
    }
}

/// Reads a customer's vaulted payment methods from a CSV source.
///
/// Expects a `kind, token, network_tokenized` header; the last column may be
/// left empty. Whitespace is trimmed.
pub struct VaultReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> VaultReader<R> {
    /// Creates a new `VaultReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads vaulted payment methods.
    pub fn payment_methods(self) -> impl Iterator<Item = Result<PaymentMethodReference>> {
        self.reader
            .into_deserialize::<VaultRow>()
            .map(|result| result.map(PaymentMethodReference::from).map_err(DropInError::from))
    }
}
