use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{BridgeError, BridgeProtocol};
use crate::error::{Integration, Stage};
use crate::taxonomy::{Cause, ErrorModel};

/// 3DS challenge widget protocol, discriminated by `event`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreeDs;

/// Kinds of 3DS events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThreeDsEventKind {
    /// `chargeAuthSuccess`
    AuthSuccess,
    /// `chargeAuthReject`
    AuthReject,
    /// `chargeAuthChallenge`
    AuthChallenge,
    /// `chargeAuthDecoupled`
    AuthDecoupled,
    /// `chargeAuthInfo`
    AuthInfo,
    /// `error`
    Error,
}

impl ThreeDsEventKind {
    /// Every kind.
    pub const ALL: [Self; 6] = [
        Self::AuthSuccess,
        Self::AuthReject,
        Self::AuthChallenge,
        Self::AuthDecoupled,
        Self::AuthInfo,
        Self::Error,
    ];

    /// Returns the `event` wire value.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::AuthSuccess => "chargeAuthSuccess",
            Self::AuthReject => "chargeAuthReject",
            Self::AuthChallenge => "chargeAuthChallenge",
            Self::AuthDecoupled => "chargeAuthDecoupled",
            Self::AuthInfo => "chargeAuthInfo",
            Self::Error => "error",
        }
    }
}

/// Authentication status reported by the 3DS widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreeDsAuth {
    /// 3DS charge the status belongs to.
    #[serde(rename = "charge3dsId")]
    pub charge3ds_id: String,
    /// Provider status string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Decoupled authentication: the cardholder approves out of band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreeDsDecoupled {
    /// 3DS charge the status belongs to.
    #[serde(rename = "charge3dsId")]
    pub charge3ds_id: String,
    /// Provider status string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Instructions to show the cardholder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Informational message from the 3DS widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreeDsInfo {
    /// 3DS charge the message belongs to.
    #[serde(rename = "charge3dsId", default, skip_serializing_if = "Option::is_none")]
    pub charge3ds_id: Option<String>,
    /// The message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

/// Event posted by the 3DS widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreeDsEvent {
    /// Authentication succeeded.
    AuthSuccess(ThreeDsAuth),
    /// Authentication was rejected.
    AuthReject(ThreeDsAuth),
    /// The issuer presented a challenge.
    AuthChallenge(ThreeDsAuth),
    /// Authentication continues out of band.
    AuthDecoupled(ThreeDsDecoupled),
    /// Informational message.
    AuthInfo(ThreeDsInfo),
    /// The widget failed, or the message could not be decoded.
    Error(BridgeError),
}

/// Successful 3DS authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreeDsResult {
    /// Authenticated 3DS charge.
    pub charge3ds_id: String,
    /// Provider status string.
    pub status: Option<String>,
    /// `true` when the cardholder approved out of band.
    pub decoupled: bool,
}

impl ThreeDsEvent {
    /// Returns the event kind.
    #[must_use]
    pub const fn kind(&self) -> ThreeDsEventKind {
        match self {
            Self::AuthSuccess(_) => ThreeDsEventKind::AuthSuccess,
            Self::AuthReject(_) => ThreeDsEventKind::AuthReject,
            Self::AuthChallenge(_) => ThreeDsEventKind::AuthChallenge,
            Self::AuthDecoupled(_) => ThreeDsEventKind::AuthDecoupled,
            Self::AuthInfo(_) => ThreeDsEventKind::AuthInfo,
            Self::Error(_) => ThreeDsEventKind::Error,
        }
    }

    /// Returns the final outcome, or `None` while authentication is ongoing.
    #[must_use]
    pub fn outcome(&self) -> Option<Result<ThreeDsResult, ErrorModel>> {
        match self {
            Self::AuthSuccess(auth) => Some(Ok(ThreeDsResult {
                charge3ds_id: auth.charge3ds_id.clone(),
                status: auth.status.clone(),
                decoupled: false,
            })),
            Self::AuthDecoupled(auth) => Some(Ok(ThreeDsResult {
                charge3ds_id: auth.charge3ds_id.clone(),
                status: auth.status.clone(),
                decoupled: true,
            })),
            Self::AuthReject(auth) => {
                let mut cause = Cause::new().with_stage(Stage::ExternalFlow);
                cause.code = auth.status.clone();
                Some(Err(ErrorModel::ThreeDs(cause)))
            }
            Self::Error(error) => Some(Err(error.to_error_model(ThreeDs::INTEGRATION))),
            Self::AuthChallenge(_) | Self::AuthInfo(_) => None,
        }
    }
}

impl BridgeProtocol for ThreeDs {
    const NAME: &'static str = "3DS";
    const DISCRIMINATOR: &'static str = "event";
    const INTEGRATION: Integration = Integration::ThreeDs;

    type Kind = ThreeDsEventKind;
    type Event = ThreeDsEvent;

    fn kind_from_tag(tag: &str) -> Option<ThreeDsEventKind> {
        ThreeDsEventKind::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    fn decode_kind(kind: ThreeDsEventKind, data: Value) -> Result<ThreeDsEvent, serde_json::Error> {
        Ok(match kind {
            ThreeDsEventKind::AuthSuccess => ThreeDsEvent::AuthSuccess(serde_json::from_value(data)?),
            ThreeDsEventKind::AuthReject => ThreeDsEvent::AuthReject(serde_json::from_value(data)?),
            ThreeDsEventKind::AuthChallenge => ThreeDsEvent::AuthChallenge(serde_json::from_value(data)?),
            ThreeDsEventKind::AuthDecoupled => ThreeDsEvent::AuthDecoupled(serde_json::from_value(data)?),
            ThreeDsEventKind::AuthInfo => ThreeDsEvent::AuthInfo(serde_json::from_value(data)?),
            ThreeDsEventKind::Error => ThreeDsEvent::Error(serde_json::from_value(data)?),
        })
    }

    fn error_event(error: BridgeError) -> ThreeDsEvent {
        ThreeDsEvent::Error(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{BridgeErrorKind, ThreeDsBridge};

    const BRIDGE: ThreeDsBridge = ThreeDsBridge::new();

    #[test]
    fn test_success_is_an_outcome() {
        let event = BRIDGE.decode(
            r#"{"event":"chargeAuthSuccess","data":{"charge3dsId":"3ds_1","status":"authenticated"}}"#,
        );
        assert_eq!(
            event,
            ThreeDsEvent::AuthSuccess(ThreeDsAuth {
                charge3ds_id: "3ds_1".into(),
                status: Some("authenticated".into()),
            })
        );
        assert_eq!(
            event.outcome(),
            Some(Ok(ThreeDsResult {
                charge3ds_id: "3ds_1".into(),
                status: Some("authenticated".into()),
                decoupled: false,
            }))
        );
    }

    #[test]
    fn test_decoupled_carries_description() {
        let event = BRIDGE.decode(
            r#"{"event":"chargeAuthDecoupled","data":{"charge3dsId":"3ds_2","description":"Approve in your banking app"}}"#,
        );
        let ThreeDsEvent::AuthDecoupled(auth) = &event else {
            panic!("expected decoupled, got {event:?}");
        };
        assert_eq!(auth.description.as_deref(), Some("Approve in your banking app"));
        assert!(event.outcome().unwrap().unwrap().decoupled);
    }

    #[test]
    fn test_reject_maps_to_three_ds_error() {
        let event = BRIDGE.decode(
            r#"{"event":"chargeAuthReject","data":{"charge3dsId":"3ds_3","status":"not_authenticated"}}"#,
        );
        let model = event.outcome().unwrap().unwrap_err();
        assert_eq!(model.code(), "three_ds");
        assert_eq!(model.display_message(), "Card authentication failed.");
    }

    #[test]
    fn test_widget_error_maps_to_three_ds_error() {
        let event = BRIDGE.decode(
            r#"{"event":"error","data":{"errorType":"criticalError","message":"Issuer unavailable"}}"#,
        );
        let model = event.outcome().unwrap().unwrap_err();
        assert_eq!(model.code(), "three_ds");
        assert_eq!(model.display_message(), "Issuer unavailable");
    }

    #[test]
    fn test_challenge_and_info_are_not_outcomes() {
        let challenge =
            BRIDGE.decode(r#"{"event":"chargeAuthChallenge","data":{"charge3dsId":"3ds_4"}}"#);
        assert_eq!(challenge.kind(), ThreeDsEventKind::AuthChallenge);
        assert!(challenge.outcome().is_none());

        let info = BRIDGE.decode(r#"{"event":"chargeAuthInfo","data":{"info":"Loading issuer page"}}"#);
        assert_eq!(
            info,
            ThreeDsEvent::AuthInfo(ThreeDsInfo {
                charge3ds_id: None,
                info: Some("Loading issuer page".into()),
            })
        );
        assert!(info.outcome().is_none());
    }

    #[test]
    fn test_malformed_input_becomes_critical_error() {
        for raw in [
            "",
            "not json",
            "null",
            r#"{"data":{}}"#,
            r#"{"event":"chargeAuthMaybe"}"#,
            r#"{"event":"chargeAuthSuccess","data":{"status":"authenticated"}}"#,
        ] {
            let ThreeDsEvent::Error(error) = BRIDGE.decode(raw) else {
                panic!("expected an error event for {raw:?}");
            };
            assert_eq!(error.kind, BridgeErrorKind::CriticalError, "{raw:?}");
            assert!(error.message.is_some_and(|m| !m.is_empty()), "{raw:?}");
        }
    }

    #[test]
    fn test_every_kind_round_trips_its_tag() {
        for kind in ThreeDsEventKind::ALL {
            assert_eq!(ThreeDs::kind_from_tag(kind.tag()), Some(kind));
        }
    }
}
