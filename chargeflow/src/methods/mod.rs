//! [`WalletFlow`](crate::wallet::WalletFlow) implementations for each supported wallet.
//!
//! | Flow                | Callback                 | Launch          | Capture                            |
//! |---------------------|--------------------------|-----------------|------------------------------------|
//! | [`PayPalFlow`]      | backend `CREATE_SESSION` | `RedirectUrl`   | `payment_method_id` + `payer_id`   |
//! | [`AfterpayFlow`]    | backend `CREATE_SESSION` | `RefToken`      | `payment_method_id`                |
//! | [`GooglePayFlow`]   | backend `CREATE_TRANSACTION` | `OrderId`   | `payment_method_id`                |
//! | [`FlyPayFlow`]      | backend `CREATE_SESSION` | `OrderId`       | `payment_method_id`                |
//! | [`WidgetFlow`]      | local service id         | `RefToken`      | none, the widget returns a token   |
//!
//! All flows are generic over a [`WalletBackend`] and fail with a
//! [`WalletError`] tagged with the integration and stage.

use crate::backend::WalletBackend;
use crate::error::{Integration, Stage, WalletError};
use crate::proto::{
    AmountContext, CallbackData, CallbackRequest, CaptureRequest, ChargeResponse, PaymentMethod,
    WalletToken,
};
use crate::wallet::{Completion, WalletCallback};

mod afterpay;
mod flypay;
mod google_pay;
mod paypal;
mod widget;

pub use afterpay::*;
pub use flypay::*;
pub use google_pay::*;
pub use paypal::*;
pub use widget::*;

async fn request_wallet_token<B: WalletBackend>(
    backend: &B,
    method: PaymentMethod,
    amount: &AmountContext,
) -> Result<WalletToken, WalletError> {
    backend
        .create_wallet_token(method, amount)
        .await
        .map_err(WalletError::at(method.into(), Stage::WalletToken))
}

async fn fetch_callback<B: WalletBackend>(
    backend: &B,
    token: &WalletToken,
    request: &CallbackRequest,
) -> Result<CallbackData, WalletError> {
    backend
        .wallet_callback(token, request)
        .await
        .map_err(WalletError::at(request.wallet_type.into(), Stage::Callback))
}

async fn capture_charge<B: WalletBackend>(
    backend: &B,
    method: PaymentMethod,
    token: &WalletToken,
    request: &CaptureRequest,
) -> Result<Completion, WalletError> {
    backend
        .capture_wallet_charge(token, request)
        .await
        .map(Completion::Charged)
        .map_err(WalletError::at(method.into(), Stage::Capture))
}

async fn decline_charge<B: WalletBackend>(
    backend: &B,
    token: &WalletToken,
    callback: &WalletCallback,
) -> Result<Option<ChargeResponse>, WalletError> {
    let Some(charge_id) = callback.charge_id.as_deref() else {
        return Ok(None);
    };
    backend
        .decline_wallet_charge(token, charge_id)
        .await
        .map(Some)
        .map_err(WalletError::at(callback.method.into(), Stage::Decline))
}

/// Unwraps a callback field the external flow cannot launch without.
fn require(integration: Integration, value: Option<String>, field: &str) -> Result<String, WalletError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| WalletError::InvalidCallback {
            integration,
            reason: format!("callback is missing `{field}`"),
        })
}

/// Rejects an approval without a payment method id.
fn approved_id(integration: Integration, payment_method_id: &str) -> Result<String, WalletError> {
    if payment_method_id.trim().is_empty() {
        return Err(WalletError::InvalidApproval {
            integration,
            reason: "approval is missing `payment_method_id`".to_owned(),
        });
    }
    Ok(payment_method_id.to_owned())
}
