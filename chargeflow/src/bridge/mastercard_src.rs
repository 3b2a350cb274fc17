use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::click_to_pay::checkout_failure;
use super::{BridgeError, BridgeProtocol, CheckoutEventKind};
use crate::error::Integration;
use crate::wallet::{Approval, ExternalResult};

/// Mastercard SRC widget protocol, discriminated by `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MastercardSrc;

/// Masked card details in a completed SRC checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskedCard {
    /// Last four digits of the card number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pan_last_four_digits: Option<String>,
    /// Card brand or product name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_card_descriptor: Option<String>,
    /// Expiry month.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pan_expiration_month: Option<String>,
    /// Expiry year.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pan_expiration_year: Option<String>,
}

/// Checkout details in a completed SRC checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SrcCheckoutData {
    /// The selected card.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub masked_card: Option<MaskedCard>,
}

/// Payload of a completed Mastercard SRC checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SrcCompleted {
    /// One-time token for the selected card.
    pub token: String,
    /// Kind of payment source (e.g. `"card"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    /// Checkout details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout_data: Option<SrcCheckoutData>,
}

impl SrcCompleted {
    /// Returns a display summary of the selected card, e.g. `"Mastercard •••• 5454"`.
    #[must_use]
    pub fn card_summary(&self) -> Option<String> {
        let card = self.checkout_data.as_ref()?.masked_card.as_ref()?;
        let last_four = card.pan_last_four_digits.as_deref()?;
        Some(match card.payment_card_descriptor.as_deref() {
            Some(brand) if !brand.trim().is_empty() => format!("{} •••• {last_four}", brand.trim()),
            _ => format!("•••• {last_four}"),
        })
    }
}

/// Event posted by the Mastercard SRC widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MastercardSrcEvent {
    /// The widget iframe finished loading.
    IframeLoaded,
    /// The checkout can be opened.
    CheckoutReady,
    /// The checkout popup opened.
    CheckoutPopupOpen,
    /// The checkout popup closed.
    CheckoutPopupClose,
    /// The user selected a card.
    CheckoutCompleted(SrcCompleted),
    /// The widget failed, or the message could not be decoded.
    CheckoutError(BridgeError),
}

impl MastercardSrcEvent {
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

impl BridgeProtocol for MastercardSrc {
    const NAME: &'static str = "Mastercard SRC";
    const DISCRIMINATOR: &'static str = "type";
    const INTEGRATION: Integration = Integration::MastercardSrc;

    type Kind = CheckoutEventKind;
    type Event = MastercardSrcEvent;

    fn kind_from_tag(tag: &str) -> Option<CheckoutEventKind> {
        CheckoutEventKind::from_tag(tag)
    }

    fn decode_kind(kind: CheckoutEventKind, data: Value) -> Result<MastercardSrcEvent, serde_json::Error> {
        Ok(match kind {
            CheckoutEventKind::IframeLoaded => MastercardSrcEvent::IframeLoaded,
            CheckoutEventKind::CheckoutReady => MastercardSrcEvent::CheckoutReady,
            CheckoutEventKind::CheckoutPopupOpen => MastercardSrcEvent::CheckoutPopupOpen,
            CheckoutEventKind::CheckoutPopupClose => MastercardSrcEvent::CheckoutPopupClose,
            CheckoutEventKind::CheckoutCompleted => {
                MastercardSrcEvent::CheckoutCompleted(serde_json::from_value(data)?)
            }
            CheckoutEventKind::CheckoutError => MastercardSrcEvent::CheckoutError(serde_json::from_value(data)?),
        })
    }

    fn error_event(error: BridgeError) -> MastercardSrcEvent {
        MastercardSrcEvent::CheckoutError(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{BridgeErrorKind, MastercardSrcBridge};

    #[test]
    fn test_completed_decodes_snake_case_payload() {
        let event = MastercardSrcBridge::new().decode(
            r#"{
                "type": "checkoutCompleted",
                "data": {
                    "token": "src_tok_1",
                    "source_type": "card",
                    "checkout_data": {
                        "masked_card": { "pan_last_four_digits": "5454", "payment_card_descriptor": "Mastercard" }
                    }
                }
            }"#,
        );
        let MastercardSrcEvent::CheckoutCompleted(completed) = &event else {
            panic!("expected completed, got {event:?}");
        };
        assert_eq!(completed.token, "src_tok_1");
        assert_eq!(completed.source_type.as_deref(), Some("card"));
        assert_eq!(completed.card_summary().as_deref(), Some("Mastercard •••• 5454"));
        assert_eq!(
            event.external_result(),
            Some(ExternalResult::Success(Approval::new("src_tok_1")))
        );
    }

    #[test]
    fn test_card_summary_without_details() {
        let completed = SrcCompleted {
            token: "t".into(),
            source_type: None,
            checkout_data: None,
        };
        assert_eq!(completed.card_summary(), None);
    }

    #[test]
    fn test_iframe_loaded() {
        let event = MastercardSrcBridge::new().decode(r#"{"type":"iframeLoaded"}"#);
        assert_eq!(event, MastercardSrcEvent::IframeLoaded);
    }

    #[test]
    fn test_event_field_is_not_the_discriminator() {
        let MastercardSrcEvent::CheckoutError(error) =
            MastercardSrcBridge::new().decode(r#"{"event":"checkoutCompleted","data":{"token":"x"}}"#)
        else {
            panic!("expected a checkout error");
        };
        assert_eq!(error.kind, BridgeErrorKind::CriticalError);
        assert_eq!(error.message.as_deref(), Some("event has no `type` field"));
    }

    #[test]
    fn test_upstream_critical_error() {
        let event = MastercardSrcBridge::new()
            .decode(r#"{"type":"checkoutError","data":{"error_type":"critical_error","message":"Timed out"}}"#);
        assert_eq!(
            event.external_result(),
            Some(ExternalResult::TransportError {
                code: None,
                message: Some("Timed out".into()),
            })
        );
    }
}
