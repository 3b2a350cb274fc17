//! Typed failures raised at use-case boundaries.
//!
//! Backend and transport failures are caught where a backend call is made and
//! re-raised as a [`WalletError`] tagged with the integration and stage that
//! failed. The orchestrator never hands these to the host directly: they are
//! first normalized into an [`ErrorModel`](crate::taxonomy::ErrorModel).

use std::fmt;

use crate::proto::{ApiErrorEnvelope, PaymentMethod};

/// Failure of a single backend call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The request did not complete in time.
    #[error("request timed out: {0}")]
    Timeout(String),
    /// The backend host name could not be resolved.
    #[error("unknown host: {0}")]
    UnknownHost(String),
    /// Any other transport-level failure.
    #[error("I/O error: {0}")]
    Io(String),
    /// The response body could not be decoded.
    #[error("failed to deserialize response: {0}")]
    Serialization(String),
    /// The backend answered with a non-success status.
    #[error("backend returned HTTP {status}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Parsed error body, when it matched a known shape.
        envelope: Option<ApiErrorEnvelope>,
        /// Raw response body.
        body: String,
    },
}

/// Payment integrations the SDK talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Integration {
    /// Card tokenisation.
    CardTokenisation,
    /// Gift card tokenisation.
    GiftCardTokenisation,
    /// 3-D Secure authentication.
    ThreeDs,
    /// PayPal checkout.
    PayPal,
    /// PayPal vault (saved PayPal accounts).
    PayPalVault,
    /// Google Pay.
    GooglePay,
    /// FlyPay.
    FlyPay,
    /// Afterpay.
    Afterpay,
    /// Click to Pay.
    ClickToPay,
    /// Mastercard SRC.
    MastercardSrc,
}

impl Integration {
    /// Returns a human-readable name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CardTokenisation => "Card tokenisation",
            Self::GiftCardTokenisation => "Gift card tokenisation",
            Self::ThreeDs => "3DS",
            Self::PayPal => "PayPal",
            Self::PayPalVault => "PayPal vault",
            Self::GooglePay => "Google Pay",
            Self::FlyPay => "FlyPay",
            Self::Afterpay => "Afterpay",
            Self::ClickToPay => "Click to Pay",
            Self::MastercardSrc => "Mastercard SRC",
        }
    }
}

impl fmt::Display for Integration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<PaymentMethod> for Integration {
    fn from(method: PaymentMethod) -> Self {
        match method {
            PaymentMethod::PayPal => Self::PayPal,
            PaymentMethod::Afterpay => Self::Afterpay,
            PaymentMethod::GooglePay => Self::GooglePay,
            PaymentMethod::FlyPay => Self::FlyPay,
            PaymentMethod::ClickToPay => Self::ClickToPay,
            PaymentMethod::MastercardSrc => Self::MastercardSrc,
        }
    }
}

/// Step of a payment attempt at which a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Wallet token issuance.
    WalletToken,
    /// Callback acquisition.
    Callback,
    /// The external flow (SDK, browser or widget).
    ExternalFlow,
    /// Charge capture.
    Capture,
    /// Charge decline.
    Decline,
    /// Card or gift card tokenisation.
    Tokenisation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::WalletToken => "wallet token",
            Self::Callback => "callback",
            Self::ExternalFlow => "external flow",
            Self::Capture => "capture",
            Self::Decline => "decline",
            Self::Tokenisation => "tokenisation",
        })
    }
}

/// Closed set of failures a payment use case can raise.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    /// A backend call failed.
    #[error("{integration} {stage} request failed: {source}")]
    Backend {
        /// Integration the call was made for.
        integration: Integration,
        /// Step that issued the call.
        stage: Stage,
        /// The underlying failure.
        #[source]
        source: BackendError,
    },
    /// The callback lacked what the external flow needs to launch.
    #[error("{integration} callback cannot be launched: {reason}")]
    InvalidCallback {
        /// Integration the callback was requested for.
        integration: Integration,
        /// What was missing or malformed.
        reason: String,
    },
    /// The external flow reported success without the fields capture needs.
    #[error("{integration} approval is incomplete: {reason}")]
    InvalidApproval {
        /// Integration that produced the approval.
        integration: Integration,
        /// What was missing.
        reason: String,
    },
    /// The external flow reported an error.
    #[error("{integration} external flow failed: {}", .message.as_deref().unwrap_or("no details"))]
    ExternalFlow {
        /// Integration whose flow failed.
        integration: Integration,
        /// Provider error code, if any.
        code: Option<String>,
        /// Provider error message, if any.
        message: Option<String>,
    },
    /// The user backed out of the external flow.
    #[error("{method} flow cancelled by the user")]
    Cancelled {
        /// Method whose flow was cancelled.
        method: PaymentMethod,
    },
}

impl WalletError {
    /// Returns a mapper that tags a [`BackendError`] with where it happened.
    ///
    /// ```
    /// use chargeflow::error::{BackendError, Integration, Stage, WalletError};
    ///
    /// let failure: Result<(), BackendError> = Err(BackendError::Io("reset".into()));
    /// let err = failure.map_err(WalletError::at(Integration::PayPal, Stage::Callback)).unwrap_err();
    /// assert!(matches!(err, WalletError::Backend { stage: Stage::Callback, .. }));
    /// ```
    pub fn at(integration: Integration, stage: Stage) -> impl FnOnce(BackendError) -> Self {
        move |source| Self::Backend {
            integration,
            stage,
            source,
        }
    }

    /// Returns the integration the failure belongs to.
    #[must_use]
    pub fn integration(&self) -> Integration {
        match self {
            Self::Backend { integration, .. }
            | Self::InvalidCallback { integration, .. }
            | Self::InvalidApproval { integration, .. }
            | Self::ExternalFlow { integration, .. } => *integration,
            Self::Cancelled { method } => (*method).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_display_includes_context() {
        let err = WalletError::Backend {
            integration: Integration::Afterpay,
            stage: Stage::Capture,
            source: BackendError::Timeout("POST /charges/wallet/capture".into()),
        };
        assert_eq!(
            err.to_string(),
            "Afterpay capture request failed: request timed out: POST /charges/wallet/capture"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_external_flow_display_without_message() {
        let err = WalletError::ExternalFlow {
            integration: Integration::FlyPay,
            code: Some("E42".into()),
            message: None,
        };
        assert_eq!(err.to_string(), "FlyPay external flow failed: no details");
    }

    #[test]
    fn test_cancelled_integration_follows_method() {
        let err = WalletError::Cancelled {
            method: PaymentMethod::MastercardSrc,
        };
        assert_eq!(err.integration(), Integration::MastercardSrc);
    }
}
