//! Normalization of heterogeneous failures into one displayable error model.
//!
//! Two total functions live here:
//!
//! - failure → [`ErrorModel`], via `From<&WalletError>` for the typed failures
//!   raised inside the SDK and [`ErrorModel::from_error`] for anything else
//! - [`ErrorModel`] → message, via [`ErrorModel::display_message`]
//!
//! Both are pure and never panic; they run on the path that renders errors to
//! the user.
//!
//! # Mapping precedence
//!
//! 1. A [`WalletError`] maps to its integration's category, keeping any
//!    message the provider or backend supplied. Transport faults inside it
//!    (timeout, unknown host, I/O) map to the matching connection category and
//!    undecodable responses to [`ErrorModel::Serialization`].
//! 2. A bare [`BackendError`] or [`std::io::Error`] maps to a connection
//!    category.
//! 3. A [`serde_json::Error`] maps to [`ErrorModel::Serialization`].
//! 4. Anything else maps to [`ErrorModel::Unknown`].

use std::fmt;

use crate::error::{BackendError, Integration, Stage, WalletError};
use crate::proto::PaymentMethod;

/// The underlying cause wrapped by an [`ErrorModel`] category.
///
/// `message` is user-facing text supplied by a backend or provider and is
/// preferred by [`ErrorModel::display_message`]. `detail` is diagnostic text
/// (transport errors, parser output) that is never shown to the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cause {
    /// Step of the attempt that failed.
    pub stage: Option<Stage>,
    /// Machine-readable code from the backend or provider.
    pub code: Option<String>,
    /// User-facing message from the backend or provider.
    pub message: Option<String>,
    /// Diagnostic detail.
    pub detail: Option<String>,
}

impl Cause {
    /// Creates an empty cause.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the stage.
    #[must_use]
    pub const fn with_stage(mut self, stage: Stage) -> Self {
        self.stage = Some(stage);
        self
    }

    /// Sets the code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Sets the user-facing message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Sets the diagnostic detail.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Returns the user-facing message if it is present and not blank.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref().map(str::trim).filter(|m| !m.is_empty())
    }
}

/// Closed set of error categories surfaced to the host application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorModel {
    /// The backend did not answer in time.
    ConnectionTimeout(Cause),
    /// The backend host could not be resolved.
    UnknownHost(Cause),
    /// Any other connection failure.
    Io(Cause),
    /// A response or event could not be decoded.
    Serialization(Cause),
    /// Card tokenisation failed.
    CardTokenisation(Cause),
    /// Gift card tokenisation failed.
    GiftCardTokenisation(Cause),
    /// 3DS authentication failed or was rejected.
    ThreeDs(Cause),
    /// PayPal failed.
    PayPal(Cause),
    /// PayPal vault failed.
    PayPalVault(Cause),
    /// Google Pay failed.
    GooglePay(Cause),
    /// FlyPay failed.
    FlyPay(Cause),
    /// Afterpay failed.
    Afterpay(Cause),
    /// Click to Pay failed.
    ClickToPay(Cause),
    /// Mastercard SRC failed.
    MastercardSrc(Cause),
    /// The user cancelled the external flow.
    Cancellation(PaymentMethod),
    /// Nothing more specific applies.
    Unknown(Cause),
}

impl ErrorModel {
    /// Builds the category for an integration.
    #[must_use]
    pub const fn integration(integration: Integration, cause: Cause) -> Self {
        match integration {
            Integration::CardTokenisation => Self::CardTokenisation(cause),
            Integration::GiftCardTokenisation => Self::GiftCardTokenisation(cause),
            Integration::ThreeDs => Self::ThreeDs(cause),
            Integration::PayPal => Self::PayPal(cause),
            Integration::PayPalVault => Self::PayPalVault(cause),
            Integration::GooglePay => Self::GooglePay(cause),
            Integration::FlyPay => Self::FlyPay(cause),
            Integration::Afterpay => Self::Afterpay(cause),
            Integration::ClickToPay => Self::ClickToPay(cause),
            Integration::MastercardSrc => Self::MastercardSrc(cause),
        }
    }

    /// Maps a backend failure that happened while serving `integration`.
    ///
    /// Transport faults keep their connection category regardless of the
    /// integration. An error body in a known shape is attributed to the
    /// integration; an unparseable one is [`ErrorModel::Unknown`].
    #[must_use]
    pub fn from_backend(integration: Option<Integration>, stage: Option<Stage>, err: &BackendError) -> Self {
        let cause = Cause {
            stage,
            ..Cause::default()
        };
        match err {
            BackendError::Timeout(detail) => Self::ConnectionTimeout(cause.with_detail(detail)),
            BackendError::UnknownHost(detail) => Self::UnknownHost(cause.with_detail(detail)),
            BackendError::Io(detail) => Self::Io(cause.with_detail(detail)),
            BackendError::Serialization(detail) => Self::Serialization(cause.with_detail(detail)),
            BackendError::Api {
                status,
                envelope,
                body,
            } => {
                let Some(envelope) = envelope else {
                    return Self::Unknown(cause.with_code(status.to_string()).with_detail(body));
                };
                let cause = Cause {
                    code: Some(envelope.code().map_or_else(|| status.to_string(), str::to_owned)),
                    message: envelope.message(),
                    ..cause
                };
                match integration {
                    Some(integration) => Self::integration(integration, cause),
                    None => Self::Unknown(cause),
                }
            }
        }
    }

    /// Maps an arbitrary error, walking its source chain.
    ///
    /// The first recognized error in the chain decides the category; an
    /// entirely unrecognized chain becomes [`ErrorModel::Unknown`] wrapping the
    /// outermost error's text as detail.
    #[must_use]
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        let chain = std::iter::successors(Some(err), |e| e.source());
        for current in chain {
            if let Some(wallet) = current.downcast_ref::<WalletError>() {
                return Self::from(wallet);
            }
            if let Some(backend) = current.downcast_ref::<BackendError>() {
                return Self::from_backend(None, None, backend);
            }
            if let Some(io) = current.downcast_ref::<std::io::Error>() {
                return Self::from_io(io);
            }
            if let Some(json) = current.downcast_ref::<serde_json::Error>() {
                return Self::Serialization(Cause::new().with_detail(json.to_string()));
            }
            if let Some(model) = current.downcast_ref::<Self>() {
                return model.clone();
            }
        }
        Self::Unknown(Cause::new().with_detail(err.to_string()))
    }

    fn from_io(err: &std::io::Error) -> Self {
        use std::io::ErrorKind;

        let cause = Cause::new().with_detail(err.to_string());
        match err.kind() {
            ErrorKind::TimedOut => Self::ConnectionTimeout(cause),
            ErrorKind::HostUnreachable | ErrorKind::AddrNotAvailable => Self::UnknownHost(cause),
            ErrorKind::InvalidData | ErrorKind::UnexpectedEof => Self::Serialization(cause),
            _ => Self::Io(cause),
        }
    }

    /// Returns the wrapped cause. [`ErrorModel::Cancellation`] has none.
    #[must_use]
    pub const fn cause(&self) -> Option<&Cause> {
        match self {
            Self::ConnectionTimeout(cause)
            | Self::UnknownHost(cause)
            | Self::Io(cause)
            | Self::Serialization(cause)
            | Self::CardTokenisation(cause)
            | Self::GiftCardTokenisation(cause)
            | Self::ThreeDs(cause)
            | Self::PayPal(cause)
            | Self::PayPalVault(cause)
            | Self::GooglePay(cause)
            | Self::FlyPay(cause)
            | Self::Afterpay(cause)
            | Self::ClickToPay(cause)
            | Self::MastercardSrc(cause)
            | Self::Unknown(cause) => Some(cause),
            Self::Cancellation(_) => None,
        }
    }

    /// Returns `true` for [`ErrorModel::Cancellation`].
    #[must_use]
    pub const fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancellation(_))
    }

    /// Returns `true` for the connection categories.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout(_) | Self::UnknownHost(_) | Self::Io(_)
        )
    }

    /// Returns the stable `snake_case` category code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::ConnectionTimeout(_) => "connection_timeout",
            Self::UnknownHost(_) => "unknown_host",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
            Self::CardTokenisation(_) => "card_tokenisation",
            Self::GiftCardTokenisation(_) => "gift_card_tokenisation",
            Self::ThreeDs(_) => "three_ds",
            Self::PayPal(_) => "paypal",
            Self::PayPalVault(_) => "paypal_vault",
            Self::GooglePay(_) => "google_pay",
            Self::FlyPay(_) => "flypay",
            Self::Afterpay(_) => "afterpay",
            Self::ClickToPay(_) => "click_to_pay",
            Self::MastercardSrc(_) => "mastercard_src",
            Self::Cancellation(_) => "cancellation",
            Self::Unknown(_) => "unknown",
        }
    }

    /// Returns the hard-coded message used when the cause has none.
    #[must_use]
    pub const fn fallback_message(&self) -> &'static str {
        match self {
            Self::ConnectionTimeout(_) => "The connection timed out. Please try again.",
            Self::UnknownHost(_) => {
                "Unable to reach the payment service. Please check your internet connection."
            }
            Self::Io(_) => "A network error occurred. Please check your connection and try again.",
            Self::Serialization(_) => "We received an unexpected response. Please try again.",
            Self::CardTokenisation(_) => "We could not process your card details.",
            Self::GiftCardTokenisation(_) => "We could not process your gift card details.",
            Self::ThreeDs(_) => "Card authentication failed.",
            Self::PayPal(_) => "Your PayPal payment could not be completed.",
            Self::PayPalVault(_) => "We could not link your PayPal account.",
            Self::GooglePay(_) => "Your Google Pay payment could not be completed.",
            Self::FlyPay(_) => "Your FlyPay payment could not be completed.",
            Self::Afterpay(_) => "Your Afterpay payment could not be completed.",
            Self::ClickToPay(_) => "Click to Pay could not complete your checkout.",
            Self::MastercardSrc(_) => "Mastercard checkout could not be completed.",
            Self::Cancellation(_) => "The payment was cancelled.",
            Self::Unknown(_) => "Something went wrong. Please try again.",
        }
    }

    /// Returns the message to show the user. Never empty.
    ///
    /// Uses the cause's message when it has a non-blank one, otherwise the
    /// category's fallback.
    #[must_use]
    pub fn display_message(&self) -> String {
        self.cause()
            .and_then(Cause::message)
            .unwrap_or_else(|| self.fallback_message())
            .to_owned()
    }
}

impl fmt::Display for ErrorModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_message())
    }
}

impl std::error::Error for ErrorModel {}

impl From<&WalletError> for ErrorModel {
    fn from(err: &WalletError) -> Self {
        match err {
            WalletError::Backend {
                integration,
                stage,
                source,
            } => Self::from_backend(Some(*integration), Some(*stage), source),
            WalletError::InvalidCallback {
                integration,
                reason,
            } => Self::integration(
                *integration,
                Cause::new().with_stage(Stage::Callback).with_detail(reason),
            ),
            WalletError::InvalidApproval {
                integration,
                reason,
            } => Self::integration(
                *integration,
                Cause::new().with_stage(Stage::Capture).with_detail(reason),
            ),
            WalletError::ExternalFlow {
                integration,
                code,
                message,
            } => Self::integration(
                *integration,
                Cause {
                    stage: Some(Stage::ExternalFlow),
                    code: code.clone(),
                    message: message.clone(),
                    detail: None,
                },
            ),
            WalletError::Cancelled { method } => Self::Cancellation(*method),
        }
    }
}

impl From<WalletError> for ErrorModel {
    fn from(err: WalletError) -> Self {
        Self::from(&err)
    }
}
