use crate::domain::payment_method::PaymentMethodKind;
use crate::domain::ports::KeyValueStoreRef;
use crate::error::Result;
use serde::{Deserialize, Serialize};

pub const LAST_USED_KEY: &str = "dropin.last_used_payment_method";

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy)]
pub struct LastUsedRecord {
    pub brand: PaymentMethodKind,
}

/// Remembers which brand last finished a flow successfully.
///
/// Last writer wins; only one flow is ever active.
#[derive(Clone)]
pub struct LastUsedCache {
    store: KeyValueStoreRef,
}

impl LastUsedCache {
    pub fn new(store: KeyValueStoreRef) -> Self {
        Self { store }
    }

    pub async fn record(&self, brand: PaymentMethodKind) -> Result<()> {
        let value = serde_json::to_vec(&LastUsedRecord { brand })?;
        self.store.put(LAST_USED_KEY, value).await
    }

    pub async fn read(&self) -> Result<Option<PaymentMethodKind>> {
        match self.store.get(LAST_USED_KEY).await? {
            Some(bytes) => {
                let record: LastUsedRecord = serde_json::from_slice(&bytes)?;
                Ok(Some(record.brand))
            }
            None => Ok(None),
        }
    }
}
