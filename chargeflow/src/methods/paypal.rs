use url::Url;

use super::{approved_id, capture_charge, decline_charge, fetch_callback, request_wallet_token, require};
use crate::backend::{BoxFuture, WalletBackend};
use crate::error::{Integration, WalletError};
use crate::proto::{AmountContext, CallbackRequest, CaptureRequest, ChargeResponse, PaymentMethod, WalletToken};
use crate::wallet::{Approval, Completion, LaunchInstruction, WalletCallback, WalletFlow};

/// Options for [`PayPalFlow`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PayPalConfig {
    /// Ask PayPal to collect a shipping address.
    pub request_shipping: bool,
}

/// PayPal checkout in the system browser.
///
/// The callback carries the PayPal approval URL. When the browser returns, the
/// host reports the `paymentId` and `PayerID` query parameters as an
/// [`Approval`] and both are sent to capture.
#[derive(Debug, Clone)]
pub struct PayPalFlow<B> {
    backend: B,
    config: PayPalConfig,
}

impl<B> PayPalFlow<B> {
    /// Creates a flow with default options.
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, PayPalConfig::default())
    }

    /// Creates a flow with the given options.
    pub const fn with_config(backend: B, config: PayPalConfig) -> Self {
        Self { backend, config }
    }
}

impl<B: WalletBackend> WalletFlow for PayPalFlow<B> {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::PayPal
    }

    fn request_token<'a>(
        &'a self,
        amount: &'a AmountContext,
    ) -> BoxFuture<'a, Result<WalletToken, WalletError>> {
        Box::pin(request_wallet_token(&self.backend, PaymentMethod::PayPal, amount))
    }

    fn request_callback<'a>(
        &'a self,
        token: &'a WalletToken,
    ) -> BoxFuture<'a, Result<WalletCallback, WalletError>> {
        Box::pin(async move {
            let request = CallbackRequest {
                request_shipping: Some(self.config.request_shipping),
                ..CallbackRequest::session(PaymentMethod::PayPal)
            };
            let data = fetch_callback(&self.backend, token, &request).await?;
            let raw = require(Integration::PayPal, data.callback_url, "callback_url")?;
            let url = Url::parse(&raw).map_err(|e| WalletError::InvalidCallback {
                integration: Integration::PayPal,
                reason: format!("`callback_url` is not a valid URL: {e}"),
            })?;
            Ok(WalletCallback {
                method: PaymentMethod::PayPal,
                charge_id: data.id,
                instruction: LaunchInstruction::RedirectUrl(url),
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
            let payment_method_id = approved_id(Integration::PayPal, &approval.payment_method_id)?;
            let payer_id = approval
                .payer_id
                .clone()
                .filter(|id| !id.trim().is_empty())
                .ok_or_else(|| WalletError::InvalidApproval {
                    integration: Integration::PayPal,
                    reason: "approval is missing `payer_id`".to_owned(),
                })?;
            let request = CaptureRequest {
                payment_method_id,
                payer_id: Some(payer_id),
            };
            capture_charge(&self.backend, PaymentMethod::PayPal, token, &request).await
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
