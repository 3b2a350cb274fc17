use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{BridgeError, BridgeProtocol};
use crate::error::Integration;
use crate::wallet::{Approval, ExternalResult};

/// Kinds of checkout widget events, shared by Click to Pay and Mastercard SRC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckoutEventKind {
    /// `iframeLoaded`
    IframeLoaded,
    /// `checkoutReady`
    CheckoutReady,
    /// `checkoutPopupOpen`
    CheckoutPopupOpen,
    /// `checkoutPopupClose`
    CheckoutPopupClose,
    /// `checkoutCompleted`
    CheckoutCompleted,
    /// `checkoutError`
    CheckoutError,
}

impl CheckoutEventKind {
    /// Every kind.
    pub const ALL: [Self; 6] = [
        Self::IframeLoaded,
        Self::CheckoutReady,
        Self::CheckoutPopupOpen,
        Self::CheckoutPopupClose,
        Self::CheckoutCompleted,
        Self::CheckoutError,
    ];

    /// Returns the discriminator wire value.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::IframeLoaded => "iframeLoaded",
            Self::CheckoutReady => "checkoutReady",
            Self::CheckoutPopupOpen => "checkoutPopupOpen",
            Self::CheckoutPopupClose => "checkoutPopupClose",
            Self::CheckoutCompleted => "checkoutCompleted",
            Self::CheckoutError => "checkoutError",
        }
    }

    /// Looks up a discriminator value.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }
}

/// Click to Pay widget protocol, discriminated by `event`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickToPay;

/// Payload of a completed Click to Pay checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickToPayCompleted {
    /// One-time token for the selected card.
    pub token: String,
    /// Kind of payment source (e.g. `"card"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    /// Masked card description for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_summary: Option<String>,
}

/// Event posted by the Click to Pay widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickToPayEvent {
    /// The widget iframe finished loading.
    IframeLoaded,
    /// The checkout can be opened.
    CheckoutReady,
    /// The checkout popup opened.
    CheckoutPopupOpen,
    /// The checkout popup closed.
    CheckoutPopupClose,
    /// The user selected a card.
    CheckoutCompleted(ClickToPayCompleted),
    /// The widget failed, or the message could not be decoded.
    CheckoutError(BridgeError),
}

impl ClickToPayEvent {
    /// Returns the event kind.
    #[must_use]
    pub const fn kind(&self) -> CheckoutEventKind {
        match self {
            Self::IframeLoaded => CheckoutEventKind::IframeLoaded,
            Self::CheckoutReady => CheckoutEventKind::CheckoutReady,
            Self::CheckoutPopupOpen => CheckoutEventKind::CheckoutPopupOpen,
            Self::CheckoutPopupClose => CheckoutEventKind::CheckoutPopupClose,
            Self::CheckoutCompleted(_) => CheckoutEventKind::CheckoutCompleted,
            Self::CheckoutError(_) => CheckoutEventKind::CheckoutError,
        }
    }

    /// Converts a terminal event into the result fed to the orchestrator.
    ///
    /// Returns `None` for progress events and for user errors, which the
    /// widget recovers from on its own.
    #[must_use]
    pub fn external_result(&self) -> Option<ExternalResult> {
        match self {
            Self::CheckoutCompleted(completed) => {
                Some(ExternalResult::Success(Approval::new(completed.token.clone())))
            }
            Self::CheckoutError(error) => checkout_failure(error),
            Self::IframeLoaded | Self::CheckoutReady | Self::CheckoutPopupOpen | Self::CheckoutPopupClose => None,
        }
    }
}

pub(super) fn checkout_failure(error: &BridgeError) -> Option<ExternalResult> {
    error.is_critical().then(|| ExternalResult::TransportError {
        code: error.code.clone(),
        message: error.message.clone(),
    })
}

impl BridgeProtocol for ClickToPay {
    const NAME: &'static str = "Click to Pay";
    const DISCRIMINATOR: &'static str = "event";
    const INTEGRATION: Integration = Integration::ClickToPay;

    type Kind = CheckoutEventKind;
    type Event = ClickToPayEvent;

    fn kind_from_tag(tag: &str) -> Option<CheckoutEventKind> {
        CheckoutEventKind::from_tag(tag)
    }

    fn decode_kind(kind: CheckoutEventKind, data: Value) -> Result<ClickToPayEvent, serde_json::Error> {
        Ok(match kind {
            CheckoutEventKind::IframeLoaded => ClickToPayEvent::IframeLoaded,
            CheckoutEventKind::CheckoutReady => ClickToPayEvent::CheckoutReady,
            CheckoutEventKind::CheckoutPopupOpen => ClickToPayEvent::CheckoutPopupOpen,
            CheckoutEventKind::CheckoutPopupClose => ClickToPayEvent::CheckoutPopupClose,
            CheckoutEventKind::CheckoutCompleted => {
                ClickToPayEvent::CheckoutCompleted(serde_json::from_value(data)?)
            }
            CheckoutEventKind::CheckoutError => ClickToPayEvent::CheckoutError(serde_json::from_value(data)?),
        })
    }

    fn error_event(error: BridgeError) -> ClickToPayEvent {
        ClickToPayEvent::CheckoutError(error)
    }
}
