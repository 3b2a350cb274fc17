//! Typed decoding of JSON events posted by embedded payment widgets.
//!
//! Widgets (3DS challenge, Click to Pay, Mastercard SRC) post untyped JSON
//! messages to the host. Each protocol selects the payload schema with a
//! string discriminator:
//!
//! ```json
//! { "event": "checkoutCompleted", "data": { "token": "ctp_tok_1", "sourceType": "card" } }
//! { "type": "checkoutCompleted", "data": { "token": "src_tok_1", "source_type": "card" } }
//! ```
//!
//! Decoding happens in two phases: the discriminator is read and looked up in
//! the protocol's closed set of event kinds, then the `data` object is decoded
//! with the schema for that kind.
//!
//! [`EventBridge::decode`] never fails. Invalid JSON, a missing or unknown
//! discriminator and a payload that does not match its schema all produce the
//! protocol's error event carrying a [`BridgeErrorKind::CriticalError`], the
//! same shape a widget uses to report its own critical errors.

use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Integration, Stage};
use crate::taxonomy::{Cause, ErrorModel};

mod click_to_pay;
mod mastercard_src;
mod three_ds;

pub use click_to_pay::*;
pub use mastercard_src::*;
pub use three_ds::*;

/// Severity of a widget error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BridgeErrorKind {
    /// Recoverable in the widget (e.g. invalid input). The flow continues.
    #[serde(alias = "user_error")]
    UserError,
    /// The flow cannot continue.
    #[serde(alias = "critical_error")]
    CriticalError,
}

/// Error payload carried by every protocol's error event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeError {
    /// Severity.
    #[serde(rename = "errorType", alias = "error_type")]
    pub kind: BridgeErrorKind,
    /// Human-readable message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Provider error code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl BridgeError {
    /// Creates a critical error with the given message.
    #[must_use]
    pub fn critical(message: impl Into<String>) -> Self {
        Self {
            kind: BridgeErrorKind::CriticalError,
            message: Some(message.into()),
            code: None,
        }
    }

    /// Returns `true` for [`BridgeErrorKind::CriticalError`].
    #[must_use]
    pub const fn is_critical(&self) -> bool {
        matches!(self.kind, BridgeErrorKind::CriticalError)
    }

    /// Maps the error into the taxonomy under `integration`.
    #[must_use]
    pub fn to_error_model(&self, integration: Integration) -> ErrorModel {
        ErrorModel::integration(
            integration,
            Cause {
                stage: Some(Stage::ExternalFlow),
                code: self.code.clone(),
                message: self.message.clone(),
                detail: None,
            },
        )
    }
}

/// Reason an inbound event could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The input is not JSON.
    #[error("invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    /// The input is JSON but not an object.
    #[error("event is not a JSON object")]
    NotAnObject,
    /// The discriminator field is absent.
    #[error("event has no `{0}` field")]
    MissingDiscriminator(&'static str),
    /// The discriminator field is not a string.
    #[error("event `{0}` field is not a string")]
    InvalidDiscriminator(&'static str),
    /// The discriminator value is not part of the protocol.
    #[error("unknown {protocol} event `{tag}`")]
    UnknownEvent {
        /// Protocol name.
        protocol: &'static str,
        /// The unrecognized value.
        tag: String,
    },
    /// The payload does not match the schema for its event.
    #[error("invalid `{tag}` payload: {source}")]
    InvalidPayload {
        /// The event the payload was decoded for.
        tag: String,
        /// Schema error.
        #[source]
        source: serde_json::Error,
    },
}

/// A widget event protocol.
///
/// Implementors declare the discriminator field, the closed set of event
/// kinds, and how each kind's payload is decoded.
pub trait BridgeProtocol {
    /// Protocol name, used in diagnostics.
    const NAME: &'static str;
    /// Field holding the event kind.
    const DISCRIMINATOR: &'static str;
    /// Integration errors are attributed to.
    const INTEGRATION: Integration;

    /// Closed set of event kinds.
    type Kind: Copy + fmt::Debug;
    /// Decoded event.
    type Event;

    /// Looks up a discriminator value.
    fn kind_from_tag(tag: &str) -> Option<Self::Kind>;

    /// Decodes the `data` payload of an event of the given kind.
    ///
    /// # Errors
    ///
    /// Returns the schema error if `data` does not match the kind's payload.
    fn decode_kind(kind: Self::Kind, data: Value) -> Result<Self::Event, serde_json::Error>;

    /// Wraps an error payload in the protocol's error event.
    fn error_event(error: BridgeError) -> Self::Event;
}

/// Decodes a raw widget message, reporting why it was rejected.
///
/// # Errors
///
/// Returns a [`DecodeError`] describing the first check that failed.
pub fn try_decode<P: BridgeProtocol>(raw: &str) -> Result<P::Event, DecodeError> {
    let value: Value = serde_json::from_str(raw).map_err(DecodeError::InvalidJson)?;
    let Value::Object(mut object) = value else {
        return Err(DecodeError::NotAnObject);
    };
    let tag = match object.get(P::DISCRIMINATOR) {
        Some(Value::String(tag)) => tag.clone(),
        Some(_) => return Err(DecodeError::InvalidDiscriminator(P::DISCRIMINATOR)),
        None => return Err(DecodeError::MissingDiscriminator(P::DISCRIMINATOR)),
    };
    let kind = P::kind_from_tag(&tag).ok_or_else(|| DecodeError::UnknownEvent {
        protocol: P::NAME,
        tag: tag.clone(),
    })?;
    let data = object.remove("data").unwrap_or(Value::Null);
    P::decode_kind(kind, data).map_err(|source| DecodeError::InvalidPayload { tag, source })
}

/// Decodes a raw widget message into exactly one event. Never fails.
pub fn decode<P: BridgeProtocol>(raw: &str) -> P::Event {
    try_decode::<P>(raw).unwrap_or_else(|err| {
        #[cfg(feature = "telemetry")]
        tracing::warn!(protocol = P::NAME, error = %err, "undecodable widget event");
        P::error_event(BridgeError::critical(err.to_string()))
    })
}

/// Stateless decoder for one widget protocol.
///
/// Zero-sized and `Copy`; a single value can be shared by any number of
/// widget instances.
pub struct EventBridge<P>(PhantomData<fn() -> P>);

/// Decoder for 3DS challenge widget events.
pub type ThreeDsBridge = EventBridge<ThreeDs>;
/// Decoder for Click to Pay widget events.
pub type ClickToPayBridge = EventBridge<ClickToPay>;
/// Decoder for Mastercard SRC widget events.
pub type MastercardSrcBridge = EventBridge<MastercardSrc>;

impl<P> EventBridge<P> {
    /// Creates a bridge.
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<P: BridgeProtocol> EventBridge<P> {
    /// Decodes a raw widget message. See [`decode`].
    #[must_use]
    pub fn decode(&self, raw: &str) -> P::Event {
        decode::<P>(raw)
    }

    /// Maps an error reported by this protocol's widget to the taxonomy.
    #[must_use]
    pub fn error_model(&self, error: &BridgeError) -> ErrorModel {
        error.to_error_model(P::INTEGRATION)
    }
}

impl<P> Clone for EventBridge<P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for EventBridge<P> {}

impl<P> Default for EventBridge<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: BridgeProtocol> fmt::Debug for EventBridge<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EventBridge").field(&P::NAME).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_send_sync_copy<T: Send + Sync + Copy>() {}

    #[test]
    fn test_bridges_are_shareable() {
        is_send_sync_copy::<ThreeDsBridge>();
        is_send_sync_copy::<ClickToPayBridge>();
        is_send_sync_copy::<MastercardSrcBridge>();
    }

    #[test]
    fn test_decode_error_messages() {
        let err = try_decode::<ClickToPay>("[1, 2]").unwrap_err();
        assert_eq!(err.to_string(), "event is not a JSON object");

        let err = try_decode::<MastercardSrc>(r#"{"event":"checkoutReady"}"#).unwrap_err();
        assert_eq!(err.to_string(), "event has no `type` field");

        let err = try_decode::<ClickToPay>(r#"{"event":7}"#).unwrap_err();
        assert_eq!(err.to_string(), "event `event` field is not a string");

        let err = try_decode::<ThreeDs>(r#"{"event":"chargeAuthMaybe"}"#).unwrap_err();
        assert_eq!(err.to_string(), "unknown 3DS event `chargeAuthMaybe`");
    }

    #[test]
    fn test_bridge_error_wire_names() {
        let error: BridgeError =
            serde_json::from_str(r#"{"errorType":"userError","message":"Card number is invalid"}"#).unwrap();
        assert_eq!(error.kind, BridgeErrorKind::UserError);
        assert!(!error.is_critical());

        let error: BridgeError =
            serde_json::from_str(r#"{"error_type":"critical_error","code":"E1"}"#).unwrap();
        assert!(error.is_critical());
        assert_eq!(error.code.as_deref(), Some("E1"));
    }

    #[test]
    fn test_bridge_error_to_error_model_keeps_message() {
        let model = BridgeError::critical("Session expired").to_error_model(Integration::ClickToPay);
        assert_eq!(model.code(), "click_to_pay");
        assert_eq!(model.display_message(), "Session expired");

        let silent = BridgeError {
            kind: BridgeErrorKind::CriticalError,
            message: None,
            code: None,
        };
        let model = silent.to_error_model(Integration::MastercardSrc);
        assert_eq!(model.display_message(), model.fallback_message());
    }

    #[test]
    fn test_error_model_is_attributed_to_the_bridge_integration() {
        let error = BridgeError::critical("Widget crashed");
        assert_eq!(ThreeDsBridge::new().error_model(&error).code(), "three_ds");
        assert_eq!(ClickToPayBridge::new().error_model(&error).code(), "click_to_pay");
        assert_eq!(MastercardSrcBridge::new().error_model(&error).code(), "mastercard_src");
    }
}
