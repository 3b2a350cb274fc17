use super::{approved_id, request_wallet_token};
use crate::backend::{BoxFuture, WalletBackend};
use crate::error::WalletError;
use crate::proto::{AmountContext, ChargeResponse, PaymentMethod, WalletToken};
use crate::wallet::{Approval, Completion, LaunchInstruction, WalletCallback, WalletFlow};

/// Options for [`WidgetFlow`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetConfig {
    /// Merchant service id the widget is loaded with.
    pub service_id: String,
}

impl WidgetConfig {
    /// Creates a config for the given service id.
    #[must_use]
    pub fn new(service_id: impl Into<String>) -> Self {
        Self {
            service_id: service_id.into(),
        }
    }
}

/// Click to Pay or Mastercard SRC checkout in an embedded web widget.
///
/// The widget is loaded with the wallet token and the configured service id,
/// so no backend callback is needed. On completion it yields a one-time token
/// which is handed back to the host as [`Completion::Tokenized`] without a
/// capture call. The widget's events are decoded by
/// [`EventBridge`](crate::bridge::EventBridge).
#[derive(Debug, Clone)]
pub struct WidgetFlow<B> {
    backend: B,
    method: PaymentMethod,
    config: WidgetConfig,
}

impl<B> WidgetFlow<B> {
    /// Creates a Click to Pay flow.
    pub const fn click_to_pay(backend: B, config: WidgetConfig) -> Self {
        Self {
            backend,
            method: PaymentMethod::ClickToPay,
            config,
        }
    }

    /// Creates a Mastercard SRC flow.
    pub const fn mastercard_src(backend: B, config: WidgetConfig) -> Self {
        Self {
            backend,
            method: PaymentMethod::MastercardSrc,
            config,
        }
    }
}

impl<B: WalletBackend> WalletFlow for WidgetFlow<B> {
    fn method(&self) -> PaymentMethod {
        self.method
    }

    fn request_token<'a>(
        &'a self,
        amount: &'a AmountContext,
    ) -> BoxFuture<'a, Result<WalletToken, WalletError>> {
        Box::pin(request_wallet_token(&self.backend, self.method, amount))
    }

    fn request_callback<'a>(
        &'a self,
        _token: &'a WalletToken,
    ) -> BoxFuture<'a, Result<WalletCallback, WalletError>> {
        let service_id = self.config.service_id.trim();
        let callback = if service_id.is_empty() {
            Err(WalletError::InvalidCallback {
                integration: self.method.into(),
                reason: "no widget service id configured".to_owned(),
            })
        } else {
            Ok(WalletCallback {
                method: self.method,
                charge_id: None,
                instruction: LaunchInstruction::RefToken(service_id.to_owned()),
            })
        };
        Box::pin(async move { callback })
    }

    fn capture<'a>(
        &'a self,
        _token: &'a WalletToken,
        _callback: &'a WalletCallback,
        approval: &'a Approval,
    ) -> BoxFuture<'a, Result<Completion, WalletError>> {
        let completion = approved_id(self.method.into(), &approval.payment_method_id)
            .map(|token| Completion::Tokenized { token });
        Box::pin(async move { completion })
    }

    fn decline<'a>(
        &'a self,
        _token: &'a WalletToken,
        _callback: &'a WalletCallback,
    ) -> BoxFuture<'a, Result<Option<ChargeResponse>, WalletError>> {
        Box::pin(async { Ok(None) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::ClickToPayBridge;
    use crate::error::Integration;
    use crate::testing::{Call, FakeBackend};
    use crate::wallet::{OrchestratorError, StateKind, WalletOrchestrator};

    fn amount() -> AmountContext {
        AmountContext::new(rust_decimal::Decimal::ONE, "AUD")
    }

    #[tokio::test]
    async fn test_widget_only_calls_backend_for_token() {
        let flow = WidgetFlow::mastercard_src(FakeBackend::new(), WidgetConfig::new("svc_1"));
        let amount = AmountContext::new(rust_decimal::Decimal::ONE, "AUD");
        let token = flow.request_token(&amount).await.unwrap();
        let callback = flow.request_callback(&token).await.unwrap();
        assert_eq!(callback.instruction, LaunchInstruction::RefToken("svc_1".into()));

        let completion = flow
            .capture(&token, &callback, &Approval::new("src_tok_1"))
            .await
            .unwrap();
        assert_eq!(
            completion,
            Completion::Tokenized {
                token: "src_tok_1".into()
            }
        );
        assert_eq!(flow.decline(&token, &callback).await.unwrap(), None);
        assert_eq!(flow.backend.calls(), [Call::Token(PaymentMethod::MastercardSrc)]);
    }

    #[tokio::test]
    async fn test_missing_service_id_is_rejected() {
        let flow = WidgetFlow::click_to_pay(FakeBackend::new(), WidgetConfig::new(""));
        let err = flow.request_callback(&WalletToken::new("tok_1")).await.unwrap_err();
        assert_eq!(err.integration(), Integration::ClickToPay);
    }

    #[tokio::test]
    async fn test_decoded_widget_events_drive_the_orchestrator() {
        let bridge = ClickToPayBridge::new();
        let orchestrator =
            WalletOrchestrator::new(WidgetFlow::click_to_pay(FakeBackend::new(), WidgetConfig::new("svc_1")));
        let launch = orchestrator.start(&amount()).await.unwrap();
        assert_eq!(launch, LaunchInstruction::RefToken("svc_1".into()));

        for raw in [r#"{"event":"iframeLoaded"}"#, r#"{"event":"checkoutPopupOpen"}"#] {
            assert_eq!(bridge.decode(raw).external_result(), None, "{raw}");
        }

        let result = bridge
            .decode(r#"{"event":"checkoutCompleted","data":{"token":"t1","sourceType":"card"}}"#)
            .external_result()
            .unwrap();
        let completion = orchestrator.on_external_result(result.clone()).await.unwrap();
        assert_eq!(completion, Completion::Tokenized { token: "t1".into() });

        let err = orchestrator.on_external_result(result).await.unwrap_err();
        assert_eq!(
            err,
            OrchestratorError::UnexpectedResult {
                state: StateKind::Success
            }
        );
        assert_eq!(orchestrator.take_completion(), Some(completion));
    }

    #[tokio::test]
    async fn test_critical_widget_error_fails_the_attempt() {
        let bridge = ClickToPayBridge::new();
        let orchestrator =
            WalletOrchestrator::new(WidgetFlow::click_to_pay(FakeBackend::new(), WidgetConfig::new("svc_1")));
        orchestrator.start(&amount()).await.unwrap();

        let result = bridge
            .decode(r#"{"event":"checkoutError","data":{"errorType":"criticalError","message":"Service unavailable"}}"#)
            .external_result()
            .unwrap();
        let err = orchestrator.on_external_result(result).await.unwrap_err();
        let model = err.error_model().unwrap();
        assert_eq!(model.code(), "click_to_pay");
        assert_eq!(model.display_message(), "Service unavailable");
        assert_eq!(
            orchestrator.flow().backend.calls(),
            [Call::Token(PaymentMethod::ClickToPay)]
        );
    }
}
