use super::{approved_id, capture_charge, decline_charge, fetch_callback, request_wallet_token, require};
use crate::backend::{BoxFuture, WalletBackend};
use crate::error::{Integration, WalletError};
use crate::proto::{AmountContext, CallbackRequest, CaptureRequest, ChargeResponse, PaymentMethod, WalletToken};
use crate::wallet::{Approval, Completion, LaunchInstruction, WalletCallback, WalletFlow};

/// FlyPay checkout in the system browser, keyed by the order id the backend creates.
#[derive(Debug, Clone)]
pub struct FlyPayFlow<B> {
    backend: B,
}

impl<B> FlyPayFlow<B> {
    /// Creates a flow.
    pub const fn new(backend: B) -> Self {
        Self { backend }
    }
}

impl<B: WalletBackend> WalletFlow for FlyPayFlow<B> {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::FlyPay
    }

    fn request_token<'a>(
        &'a self,
        amount: &'a AmountContext,
    ) -> BoxFuture<'a, Result<WalletToken, WalletError>> {
        Box::pin(request_wallet_token(&self.backend, PaymentMethod::FlyPay, amount))
    }

    fn request_callback<'a>(
        &'a self,
        token: &'a WalletToken,
    ) -> BoxFuture<'a, Result<WalletCallback, WalletError>> {
        Box::pin(async move {
            let request = CallbackRequest::session(PaymentMethod::FlyPay);
            let data = fetch_callback(&self.backend, token, &request).await?;
            let order_id = require(Integration::FlyPay, data.id, "id")?;
            Ok(WalletCallback {
                method: PaymentMethod::FlyPay,
                charge_id: Some(order_id.clone()),
                instruction: LaunchInstruction::OrderId(order_id),
            })
        })
    }

    fn capture<'a>(
        &'a self,
        token: &'a WalletToken,
        _callback: &'a WalletCallback,
        approval: &'a Approval,
    ) -> BoxFuture<'a, Result<Completion, WalletError>> {
        Box::pin(async move {
            let request = CaptureRequest {
                payment_method_id: approved_id(Integration::FlyPay, &approval.payment_method_id)?,
                payer_id: None,
            };
            capture_charge(&self.backend, PaymentMethod::FlyPay, token, &request).await
        })
    }

    fn decline<'a>(
        &'a self,
        token: &'a WalletToken,
        callback: &'a WalletCallback,
    ) -> BoxFuture<'a, Result<Option<ChargeResponse>, WalletError>> {
        Box::pin(decline_charge(&self.backend, token, callback))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BackendError, Stage};
    use crate::proto::CallbackData;
    use crate::testing::FakeBackend;

    #[tokio::test]
    async fn test_order_id_is_launch_instruction_and_charge() {
        let flow = FlyPayFlow::new(FakeBackend::new().with_callback(Ok(CallbackData {
            id: Some("order_77".into()),
            ..CallbackData::default()
        })));
        let callback = flow.request_callback(&WalletToken::new("tok_1")).await.unwrap();
        assert_eq!(callback.instruction, LaunchInstruction::OrderId("order_77".into()));
        assert_eq!(callback.charge_id.as_deref(), Some("order_77"));
    }

    #[tokio::test]
    async fn test_callback_failure_is_tagged() {
        let flow = FlyPayFlow::new(
            FakeBackend::new().with_callback(Err(BackendError::UnknownHost("api.invalid".into()))),
        );
        let err = flow.request_callback(&WalletToken::new("tok_1")).await.unwrap_err();
        assert_eq!(
            err,
            WalletError::Backend {
                integration: Integration::FlyPay,
                stage: Stage::Callback,
                source: BackendError::UnknownHost("api.invalid".into()),
            }
        );
    }
}
