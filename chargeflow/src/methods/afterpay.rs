use super::{approved_id, capture_charge, decline_charge, fetch_callback, request_wallet_token, require};
use crate::backend::{BoxFuture, WalletBackend};
use crate::error::{Integration, WalletError};
use crate::proto::{AmountContext, CallbackRequest, CaptureRequest, ChargeResponse, PaymentMethod, WalletToken};
use crate::wallet::{Approval, Completion, LaunchInstruction, WalletCallback, WalletFlow};

/// Afterpay checkout through the native Afterpay SDK.
///
/// The SDK is launched with the callback's reference token and returns an
/// approval token, which is captured as the payment method id.
#[derive(Debug, Clone)]
pub struct AfterpayFlow<B> {
    backend: B,
}

impl<B> AfterpayFlow<B> {
    /// Creates a flow.
    pub const fn new(backend: B) -> Self {
        Self { backend }
    }
}

impl<B: WalletBackend> WalletFlow for AfterpayFlow<B> {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Afterpay
    }

    fn request_token<'a>(
        &'a self,
        amount: &'a AmountContext,
    ) -> BoxFuture<'a, Result<WalletToken, WalletError>> {
        Box::pin(request_wallet_token(&self.backend, PaymentMethod::Afterpay, amount))
    }

    fn request_callback<'a>(
        &'a self,
        token: &'a WalletToken,
    ) -> BoxFuture<'a, Result<WalletCallback, WalletError>> {
        Box::pin(async move {
            let request = CallbackRequest::session(PaymentMethod::Afterpay);
            let data = fetch_callback(&self.backend, token, &request).await?;
            let ref_token = require(Integration::Afterpay, data.ref_token, "ref_token")?;
            Ok(WalletCallback {
                method: PaymentMethod::Afterpay,
                charge_id: data.id,
                instruction: LaunchInstruction::RefToken(ref_token),
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
                payment_method_id: approved_id(Integration::Afterpay, &approval.payment_method_id)?,
                payer_id: None,
            };
            capture_charge(&self.backend, PaymentMethod::Afterpay, token, &request).await
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
    use crate::testing::{Call, FakeBackend};

    #[tokio::test]
    async fn test_launches_with_ref_token_and_captures_approval_token() {
        let flow = AfterpayFlow::new(FakeBackend::new());
        let token = WalletToken::new("tok_1");
        let callback = flow.request_callback(&token).await.unwrap();
        assert_eq!(callback.instruction, LaunchInstruction::RefToken("ref_1".into()));

        // A payer id from a confused host is not forwarded.
        let approval = Approval::new("ap_token_1").with_payer("ignored");
        let completion = flow.capture(&token, &callback, &approval).await.unwrap();
        assert_eq!(completion.charge().unwrap().id, "CH1");

        let calls = flow.backend.calls();
        assert_eq!(
            calls.last(),
            Some(&Call::Capture {
                token: "tok_1".into(),
                request: CaptureRequest {
                    payment_method_id: "ap_token_1".into(),
                    payer_id: None,
                },
            })
        );
    }
}
