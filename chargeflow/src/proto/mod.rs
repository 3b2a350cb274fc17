//! Wire types exchanged with the payments backend.
//!
//! Every successful backend response is wrapped in the same envelope:
//!
//! ```json
//! { "status": 201, "resource": { "type": "charge", "data": { ... } } }
//! ```
//!
//! Failed responses carry one of the error shapes described in [`error`].
//!
//! # Key Types
//!
//! - [`PaymentMethod`] - Wallet methods driven by the orchestrator (`wallet_type` on the wire)
//! - [`WalletToken`] - Short-lived credential identifying one payment attempt
//! - [`CallbackRequest`] / [`CallbackData`] - `POST /charges/wallet/callback`
//! - [`CaptureRequest`] / [`ChargeResponse`] - `POST /charges/wallet/capture`
//! - [`CardTokenRequest`] / [`GiftCardTokenRequest`] - `POST /payment_sources/tokens`

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub mod error;
mod tokenise;

pub use error::*;
pub use tokenise::*;

/// Wallet-based payment methods the orchestrator can drive.
///
/// Serialized as the backend's `wallet_type` discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// PayPal checkout, launched in the system browser.
    #[serde(rename = "PAYPAL")]
    PayPal,
    /// Afterpay native SDK checkout.
    #[serde(rename = "AFTERPAY")]
    Afterpay,
    /// Google Pay payment sheet.
    #[serde(rename = "GOOGLE")]
    GooglePay,
    /// FlyPay checkout, launched in the system browser.
    #[serde(rename = "FLYPAY")]
    FlyPay,
    /// Click-to-Pay embedded web widget.
    #[serde(rename = "CLICK_TO_PAY")]
    ClickToPay,
    /// Mastercard SRC embedded web widget.
    #[serde(rename = "MASTERCARD_SRC")]
    MastercardSrc,
}

impl PaymentMethod {
    /// Every method, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::PayPal,
        Self::Afterpay,
        Self::GooglePay,
        Self::FlyPay,
        Self::ClickToPay,
        Self::MastercardSrc,
    ];

    /// Returns the `wallet_type` wire value.
    #[must_use]
    pub const fn wallet_type(&self) -> &'static str {
        match self {
            Self::PayPal => "PAYPAL",
            Self::Afterpay => "AFTERPAY",
            Self::GooglePay => "GOOGLE",
            Self::FlyPay => "FLYPAY",
            Self::ClickToPay => "CLICK_TO_PAY",
            Self::MastercardSrc => "MASTERCARD_SRC",
        }
    }

    /// Returns a human-readable name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::PayPal => "PayPal",
            Self::Afterpay => "Afterpay",
            Self::GooglePay => "Google Pay",
            Self::FlyPay => "FlyPay",
            Self::ClickToPay => "Click to Pay",
            Self::MastercardSrc => "Mastercard SRC",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Opaque short-lived credential issued by the backend for one payment attempt.
///
/// The `Debug` output only shows a short prefix so tokens don't end up in logs.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletToken(String);

impl WalletToken {
    /// Wraps a backend-issued token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token, for use in the `x-access-token` header.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for WalletToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(6).collect();
        write!(f, "WalletToken({prefix}…)")
    }
}

/// Amount and merchant context for a payment attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountContext {
    /// Charge amount in major units (e.g. `10.50`).
    pub amount: Decimal,

    /// ISO 4217 currency code (e.g. `"AUD"`).
    pub currency: String,

    /// Optional merchant reference attached to the charge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl AmountContext {
    /// Creates a context with no merchant reference.
    #[must_use]
    pub fn new(amount: Decimal, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
            reference: None,
        }
    }

    /// Sets the merchant reference.
    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

/// Success envelope returned by every backend endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// HTTP status echoed by the backend.
    pub status: u16,
    /// The wrapped resource.
    pub resource: Resource<T>,
}

impl<T> ApiResponse<T> {
    /// Consumes the envelope and returns the resource payload.
    pub fn into_data(self) -> T {
        self.resource.data
    }
}

/// Typed payload inside an [`ApiResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource<T> {
    /// Resource type tag (e.g. `"charge"`, `"token"`).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Resource body.
    pub data: T,
}

/// Body of `POST /payment_sources/tokens` when issuing a wallet token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletTokenRequest<'a> {
    /// Wallet the token will be used with.
    pub wallet_type: PaymentMethod,
    /// Amount and merchant context.
    #[serde(flatten)]
    pub amount: &'a AmountContext,
}

/// What the callback endpoint should prepare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallbackRequestType {
    /// Open a checkout session on the wallet provider.
    CreateSession,
    /// Bind a transaction that the native payment sheet will complete.
    CreateTransaction,
}

/// Body of `POST /charges/wallet/callback`, discriminated by `wallet_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackRequest {
    /// Wallet that will run the external flow.
    pub wallet_type: PaymentMethod,
    /// What the backend should prepare.
    pub request_type: CallbackRequestType,
    /// Whether the provider should collect a shipping address (PayPal only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_shipping: Option<bool>,
}

impl CallbackRequest {
    /// Creates a session request for the given wallet.
    #[must_use]
    pub const fn session(wallet_type: PaymentMethod) -> Self {
        Self {
            wallet_type,
            request_type: CallbackRequestType::CreateSession,
            request_shipping: None,
        }
    }
}

/// Resource data returned by the callback endpoint.
///
/// Which fields are populated depends on the wallet: PayPal returns a
/// `callback_url`, Afterpay a `ref_token`, FlyPay and Google Pay only an `id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackData {
    /// Charge or order identifier created for this attempt.
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Backend status of the pending charge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Provider URL to open in the browser.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    /// Provider reference token handed to a native SDK.
    #[serde(default, alias = "refToken", skip_serializing_if = "Option::is_none")]
    pub ref_token: Option<String>,
}

/// Body of `POST /charges/wallet/capture`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRequest {
    /// Provider approval identifier (PayPal payment id, Afterpay token, ...).
    pub payment_method_id: String,
    /// PayPal payer identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer_id: Option<String>,
}

/// Backend confirmation of a capture or decline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeResponse {
    /// Charge identifier.
    #[serde(alias = "_id")]
    pub id: String,
    /// Charge status (e.g. `"complete"`, `"declined"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Charged amount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    /// Charge currency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// Merchant reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payment_method_wire_values() {
        for method in PaymentMethod::ALL {
            let value = serde_json::to_value(method).unwrap();
            assert_eq!(value, json!(method.wallet_type()));
            let back: PaymentMethod = serde_json::from_value(value).unwrap();
            assert_eq!(back, method);
        }
    }

    #[test]
    fn test_wallet_token_debug_is_redacted() {
        let token = WalletToken::new("tok_1234567890abcdef");
        let debug = format!("{token:?}");
        assert_eq!(debug, "WalletToken(tok_12…)");
        assert!(!debug.contains("abcdef"));
    }

    #[test]
    fn test_wallet_token_request_flattens_amount() {
        let amount = AmountContext::new(Decimal::new(1050, 2), "AUD").with_reference("order-7");
        let body = serde_json::to_value(WalletTokenRequest {
            wallet_type: PaymentMethod::Afterpay,
            amount: &amount,
        })
        .unwrap();
        assert_eq!(
            body,
            json!({
                "wallet_type": "AFTERPAY",
                "amount": "10.50",
                "currency": "AUD",
                "reference": "order-7"
            })
        );
    }

    #[test]
    fn test_callback_request_shape() {
        let mut request = CallbackRequest::session(PaymentMethod::PayPal);
        request.request_shipping = Some(true);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "wallet_type": "PAYPAL",
                "request_type": "CREATE_SESSION",
                "request_shipping": true
            })
        );
    }

    #[test]
    fn test_callback_data_accepts_aliases() {
        let data: CallbackData =
            serde_json::from_value(json!({"_id": "ch_1", "refToken": "ref_9"})).unwrap();
        assert_eq!(data.id.as_deref(), Some("ch_1"));
        assert_eq!(data.ref_token.as_deref(), Some("ref_9"));
        assert!(data.callback_url.is_none());
    }

    #[test]
    fn test_charge_envelope_decodes_numeric_amount() {
        let envelope: ApiResponse<ChargeResponse> = serde_json::from_value(json!({
            "status": 201,
            "resource": {
                "type": "charge",
                "data": { "_id": "CH1", "status": "complete", "amount": 10.5, "currency": "AUD" }
            }
        }))
        .unwrap();
        assert_eq!(envelope.resource.kind.as_deref(), Some("charge"));
        let charge = envelope.into_data();
        assert_eq!(charge.id, "CH1");
        assert_eq!(charge.amount, Some(Decimal::new(105, 1)));
    }
}
