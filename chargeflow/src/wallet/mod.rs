//! Wallet transaction orchestration.
//!
//! Every wallet payment goes through the same steps: request a wallet token,
//! request a method-specific callback, hand control to an external flow (native
//! SDK, system browser or embedded widget), then capture or decline based on
//! the flow's result. [`WalletOrchestrator`] runs that state machine once;
//! what differs per payment method is supplied through [`WalletFlow`].
//!
//! # State graph
//!
//! ```text
//! Idle ─start→ Loading(Token) ─→ Loading(Callback) ─→ AwaitingExternalFlow
//! AwaitingExternalFlow ─Success→ Loading(Capture) ─→ Success | Error
//! AwaitingExternalFlow ─UserCancelled | TransportError→ Error
//! any ─reset→ Idle
//! ```

use url::Url;

use crate::backend::BoxFuture;
use crate::error::WalletError;
use crate::proto::{AmountContext, ChargeResponse, PaymentMethod, WalletToken};

mod listener;
mod orchestrator;
mod state;

pub use listener::*;
pub use orchestrator::*;
pub use state::*;

/// How the host should launch the external flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchInstruction {
    /// Open this URL in a browser (PayPal).
    RedirectUrl(Url),
    /// Hand this reference token to a native SDK or widget (Afterpay, Click to Pay).
    RefToken(String),
    /// Complete this order in a payment sheet or browser (Google Pay, FlyPay).
    OrderId(String),
}

/// Backend-provided instructions for one payment attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletCallback {
    /// Method the callback was issued for.
    pub method: PaymentMethod,
    /// Pending charge created by the backend, if any.
    pub charge_id: Option<String>,
    /// How to launch the external flow.
    pub instruction: LaunchInstruction,
}

/// Identifiers the external flow returns on approval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Approval {
    /// Provider identifier of the approved payment.
    pub payment_method_id: String,
    /// PayPal payer identifier.
    pub payer_id: Option<String>,
}

impl Approval {
    /// Creates an approval without a payer id.
    #[must_use]
    pub fn new(payment_method_id: impl Into<String>) -> Self {
        Self {
            payment_method_id: payment_method_id.into(),
            payer_id: None,
        }
    }

    /// Sets the payer id.
    #[must_use]
    pub fn with_payer(mut self, payer_id: impl Into<String>) -> Self {
        self.payer_id = Some(payer_id.into());
        self
    }
}

/// Outcome reported by the external flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalResult {
    /// The user approved the payment.
    Success(Approval),
    /// The user backed out.
    UserCancelled,
    /// The flow failed.
    TransportError {
        /// Provider error code, if any.
        code: Option<String>,
        /// Provider error message, if any.
        message: Option<String>,
    },
}

/// Successful end of a payment attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The backend captured the charge.
    Charged(ChargeResponse),
    /// The widget produced a token for the host to charge later.
    Tokenized {
        /// Token issued by the widget.
        token: String,
    },
}

impl Completion {
    /// Returns the charge, if one was captured.
    #[must_use]
    pub const fn charge(&self) -> Option<&ChargeResponse> {
        match self {
            Self::Charged(charge) => Some(charge),
            Self::Tokenized { .. } => None,
        }
    }
}

/// Per-method capability driven by [`WalletOrchestrator`].
///
/// All methods are async (returning [`BoxFuture`]) so that flows can be boxed
/// as `dyn WalletFlow`. Implementations for each supported wallet live in
/// [`crate::methods`].
pub trait WalletFlow: Send + Sync {
    /// Method this flow drives.
    fn method(&self) -> PaymentMethod;

    /// Requests a wallet token for the attempt.
    fn request_token<'a>(
        &'a self,
        amount: &'a AmountContext,
    ) -> BoxFuture<'a, Result<WalletToken, WalletError>>;

    /// Requests the callback describing how to launch the external flow.
    fn request_callback<'a>(
        &'a self,
        token: &'a WalletToken,
    ) -> BoxFuture<'a, Result<WalletCallback, WalletError>>;

    /// Returns what the host needs to launch the external flow.
    fn launch_instruction(&self, callback: &WalletCallback) -> LaunchInstruction {
        callback.instruction.clone()
    }

    /// Finalizes the charge after the external flow approved it.
    fn capture<'a>(
        &'a self,
        token: &'a WalletToken,
        callback: &'a WalletCallback,
        approval: &'a Approval,
    ) -> BoxFuture<'a, Result<Completion, WalletError>>;

    /// Aborts the pending charge after the external flow failed.
    ///
    /// Returns `Ok(None)` when there is nothing to decline.
    fn decline<'a>(
        &'a self,
        token: &'a WalletToken,
        callback: &'a WalletCallback,
    ) -> BoxFuture<'a, Result<Option<ChargeResponse>, WalletError>>;
}

impl<T: WalletFlow + ?Sized> WalletFlow for Box<T> {
    fn method(&self) -> PaymentMethod {
        (**self).method()
    }

    fn request_token<'a>(
        &'a self,
        amount: &'a AmountContext,
    ) -> BoxFuture<'a, Result<WalletToken, WalletError>> {
        (**self).request_token(amount)
    }

    fn request_callback<'a>(
        &'a self,
        token: &'a WalletToken,
    ) -> BoxFuture<'a, Result<WalletCallback, WalletError>> {
        (**self).request_callback(token)
    }

    fn launch_instruction(&self, callback: &WalletCallback) -> LaunchInstruction {
        (**self).launch_instruction(callback)
    }

    fn capture<'a>(
        &'a self,
        token: &'a WalletToken,
        callback: &'a WalletCallback,
        approval: &'a Approval,
    ) -> BoxFuture<'a, Result<Completion, WalletError>> {
        (**self).capture(token, callback, approval)
    }

    fn decline<'a>(
        &'a self,
        token: &'a WalletToken,
        callback: &'a WalletCallback,
    ) -> BoxFuture<'a, Result<Option<ChargeResponse>, WalletError>> {
        (**self).decline(token, callback)
    }
}
