use super::{approved_id, capture_charge, decline_charge, fetch_callback, request_wallet_token, require};
use crate::backend::{BoxFuture, WalletBackend};
use crate::error::{Integration, WalletError};
use crate::proto::{
    AmountContext, CallbackRequest, CallbackRequestType, CaptureRequest, ChargeResponse, PaymentMethod,
    WalletToken,
};
use crate::wallet::{Approval, Completion, LaunchInstruction, WalletCallback, WalletFlow};

/// Google Pay payment sheet.
///
/// The backend binds a transaction up front. The payment sheet returns an
/// encrypted Google Pay token, captured as the payment method id.
#[derive(Debug, Clone)]
pub struct GooglePayFlow<B> {
    backend: B,
}

impl<B> GooglePayFlow<B> {
    /// Creates a flow.
    pub const fn new(backend: B) -> Self {
        Self { backend }
    }
}

impl<B: WalletBackend> WalletFlow for GooglePayFlow<B> {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::GooglePay
    }

    fn request_token<'a>(
        &'a self,
        amount: &'a AmountContext,
    ) -> BoxFuture<'a, Result<WalletToken, WalletError>> {
        Box::pin(request_wallet_token(&self.backend, PaymentMethod::GooglePay, amount))
    }

    fn request_callback<'a>(
        &'a self,
        token: &'a WalletToken,
    ) -> BoxFuture<'a, Result<WalletCallback, WalletError>> {
        Box::pin(async move {
            let request = CallbackRequest {
                request_type: CallbackRequestType::CreateTransaction,
                ..CallbackRequest::session(PaymentMethod::GooglePay)
            };
            let data = fetch_callback(&self.backend, token, &request).await?;
            let order_id = require(Integration::GooglePay, data.id, "id")?;
            Ok(WalletCallback {
                method: PaymentMethod::GooglePay,
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
                payment_method_id: approved_id(Integration::GooglePay, &approval.payment_method_id)?,
                payer_id: None,
            };
            capture_charge(&self.backend, PaymentMethod::GooglePay, token, &request).await
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
