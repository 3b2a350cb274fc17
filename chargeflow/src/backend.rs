//! Backend capability consumed by the wallet flows.
//!
//! The orchestrator never talks HTTP itself. Each wallet flow is handed a
//! [`WalletBackend`] and drives the token, callback, capture and decline calls
//! through it. `chargeflow-http` provides the production implementation; tests
//! substitute in-memory fakes.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::BackendError;
use crate::proto::{
    AmountContext, CallbackData, CallbackRequest, CaptureRequest, ChargeResponse, PaymentMethod,
    WalletToken,
};

/// A boxed, `Send` future, used to keep the capability traits dyn-compatible.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Remote operations needed to run a wallet payment.
///
/// All methods are async because the primary implementation
/// (`HttpWalletBackend`) performs network I/O.
pub trait WalletBackend: Send + Sync {
    /// Issues a wallet token for one payment attempt.
    fn create_wallet_token<'a>(
        &'a self,
        method: PaymentMethod,
        amount: &'a AmountContext,
    ) -> BoxFuture<'a, Result<WalletToken, BackendError>>;

    /// Asks the backend to prepare the external flow (session, order, transaction).
    fn wallet_callback<'a>(
        &'a self,
        token: &'a WalletToken,
        request: &'a CallbackRequest,
    ) -> BoxFuture<'a, Result<CallbackData, BackendError>>;

    /// Captures the charge once the external flow has approved it.
    fn capture_wallet_charge<'a>(
        &'a self,
        token: &'a WalletToken,
        request: &'a CaptureRequest,
    ) -> BoxFuture<'a, Result<ChargeResponse, BackendError>>;

    /// Declines a pending charge after the external flow failed.
    fn decline_wallet_charge<'a>(
        &'a self,
        token: &'a WalletToken,
        charge_id: &'a str,
    ) -> BoxFuture<'a, Result<ChargeResponse, BackendError>>;
}

impl<T: WalletBackend + ?Sized> WalletBackend for Arc<T> {
    fn create_wallet_token<'a>(
        &'a self,
        method: PaymentMethod,
        amount: &'a AmountContext,
    ) -> BoxFuture<'a, Result<WalletToken, BackendError>> {
        (**self).create_wallet_token(method, amount)
    }

    fn wallet_callback<'a>(
        &'a self,
        token: &'a WalletToken,
        request: &'a CallbackRequest,
    ) -> BoxFuture<'a, Result<CallbackData, BackendError>> {
        (**self).wallet_callback(token, request)
    }

    fn capture_wallet_charge<'a>(
        &'a self,
        token: &'a WalletToken,
        request: &'a CaptureRequest,
    ) -> BoxFuture<'a, Result<ChargeResponse, BackendError>> {
        (**self).capture_wallet_charge(token, request)
    }

    fn decline_wallet_charge<'a>(
        &'a self,
        token: &'a WalletToken,
        charge_id: &'a str,
    ) -> BoxFuture<'a, Result<ChargeResponse, BackendError>> {
        (**self).decline_wallet_charge(token, charge_id)
    }
}
