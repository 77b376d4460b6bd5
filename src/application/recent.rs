use super::last_used::LastUsedCache;
use crate::domain::outcome::FlowFailure;
use crate::domain::payment_method::{PaymentMethodKind, PaymentMethodReference};
use crate::domain::ports::{VaultedPaymentMethods, WalletReadiness};
use crate::domain::request::{Authorization, DropInRequest};

/// The customer's most recent payment method, when one is known.
///
/// A wallet-pay hit carries only the kind: the wallet has to be launched
/// again to obtain a fresh token.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct RecentPaymentMethod {
    pub kind: Option<PaymentMethodKind>,
    pub reference: Option<PaymentMethodReference>,
}

/// Looks up an existing payment method so the merchant can skip drop-in.
///
/// Requires a client token, since only client tokens identify a customer.
/// The vaulted method returned is the first one listed, which is not
/// guaranteed to be the most recently added.
pub async fn fetch_most_recent_payment_method(
    request: &DropInRequest,
    cache: &LastUsedCache,
    readiness: Option<&dyn WalletReadiness>,
    vault: &dyn VaultedPaymentMethods,
) -> Result<RecentPaymentMethod, FlowFailure> {
    if !matches!(request.authorization, Some(Authorization::ClientToken(_))) {
        return Err(FlowFailure::configuration(
            "fetching the most recent payment method must be called with a client token",
        ));
    }

    let last_used = cache.read().await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Ignoring unreadable last-used payment method");
        None
    });

    if last_used == Some(PaymentMethodKind::WalletPay)
        && let Some(readiness) = readiness
        && readiness.is_ready().await
    {
        return Ok(RecentPaymentMethod {
            kind: Some(PaymentMethodKind::WalletPay),
            reference: None,
        });
    }

    let vaulted = vault.list().await?;
    Ok(match vaulted.into_iter().next() {
        Some(reference) => RecentPaymentMethod {
            kind: Some(reference.kind()),
            reference: Some(reference),
        },
        None => RecentPaymentMethod::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::outcome::FlowErrorKind;
    use crate::infrastructure::in_memory::InMemoryKeyValueStore;
    use crate::infrastructure::simulated::{StaticVault, StaticWalletReadiness};
    use std::sync::Arc;

    fn client_token_request() -> DropInRequest {
        DropInRequest {
            authorization: Some(Authorization::ClientToken("ct".to_string())),
            ..Default::default()
        }
    }

    fn cache() -> LastUsedCache {
        LastUsedCache::new(Arc::new(InMemoryKeyValueStore::new()))
    }

    #[tokio::test]
    async fn test_requires_client_token() {
        let request = DropInRequest {
            authorization: Some(Authorization::TokenizationKey("tk".to_string())),
            ..Default::default()
        };
        let vault = StaticVault::new(vec![]);
        let err = fetch_most_recent_payment_method(&request, &cache(), None, &vault)
            .await
            .unwrap_err();
        assert_eq!(err.kind, FlowErrorKind::ConfigurationError);
    }

    #[tokio::test]
    async fn test_ready_wallet_pay_short_circuits() {
        let cache = cache();
        cache.record(PaymentMethodKind::WalletPay).await.unwrap();
        let vault = StaticVault::new(vec![PaymentMethodReference::new(
            PaymentMethodKind::Card,
            "tok_card",
        )]);

        let recent = fetch_most_recent_payment_method(
            &client_token_request(),
            &cache,
            Some(&StaticWalletReadiness::new(true)),
            &vault,
        )
        .await
        .unwrap();
        assert_eq!(recent.kind, Some(PaymentMethodKind::WalletPay));
        assert!(recent.reference.is_none());
    }

    #[tokio::test]
    async fn test_unready_wallet_falls_back_to_vault() {
        let cache = cache();
        cache.record(PaymentMethodKind::WalletPay).await.unwrap();
        let card = PaymentMethodReference::new(PaymentMethodKind::Card, "tok_card");
        let vault = StaticVault::new(vec![
            card.clone(),
            PaymentMethodReference::new(PaymentMethodKind::PayPal, "tok_pp"),
        ]);

        let recent = fetch_most_recent_payment_method(
            &client_token_request(),
            &cache,
            Some(&StaticWalletReadiness::new(false)),
            &vault,
        )
        .await
        .unwrap();
        assert_eq!(recent.kind, Some(PaymentMethodKind::Card));
        assert_eq!(recent.reference, Some(card));
    }

    #[tokio::test]
    async fn test_empty_vault() {
        let vault = StaticVault::new(vec![]);
        let recent =
            fetch_most_recent_payment_method(&client_token_request(), &cache(), None, &vault)
                .await
                .unwrap();
        assert_eq!(recent, RecentPaymentMethod::default());
    }
}
