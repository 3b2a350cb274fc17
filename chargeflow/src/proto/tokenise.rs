//! Card and gift-card tokenisation requests.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Body of `POST /payment_sources/tokens` for a card.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardTokenRequest {
    /// Gateway the card will be charged through.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_id: Option<String>,
    /// Always `"card"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Cardholder name.
    pub card_name: String,
    /// Primary account number.
    pub card_number: String,
    /// Two-digit expiry month.
    pub expire_month: String,
    /// Two or four digit expiry year.
    pub expire_year: String,
    /// Card security code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_ccv: Option<String>,
}

impl CardTokenRequest {
    /// Creates a card tokenisation request.
    #[must_use]
    pub fn new(
        card_name: impl Into<String>,
        card_number: impl Into<String>,
        expire_month: impl Into<String>,
        expire_year: impl Into<String>,
    ) -> Self {
        Self {
            gateway_id: None,
            kind: "card".to_owned(),
            card_name: card_name.into(),
            card_number: card_number.into(),
            expire_month: expire_month.into(),
            expire_year: expire_year.into(),
            card_ccv: None,
        }
    }

    /// Sets the security code.
    #[must_use]
    pub fn with_ccv(mut self, ccv: impl Into<String>) -> Self {
        self.card_ccv = Some(ccv.into());
        self
    }

    /// Sets the gateway.
    #[must_use]
    pub fn with_gateway(mut self, gateway_id: impl Into<String>) -> Self {
        self.gateway_id = Some(gateway_id.into());
        self
    }
}

impl fmt::Debug for CardTokenRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardTokenRequest")
            .field("gateway_id", &self.gateway_id)
            .field("card_name", &self.card_name)
            .field("card_number", &mask_pan(&self.card_number))
            .field("expire_month", &self.expire_month)
            .field("expire_year", &self.expire_year)
            .field("card_ccv", &self.card_ccv.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Body of `POST /payment_sources/tokens` for a gift card.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiftCardTokenRequest {
    /// Gateway the gift card belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_id: Option<String>,
    /// Always `"gift_card"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Gift card number.
    pub card_number: String,
    /// Gift card PIN.
    pub card_pin: String,
    /// Whether the gateway may store the PIN for later charges.
    #[serde(default)]
    pub store_pin: bool,
}

impl GiftCardTokenRequest {
    /// Creates a gift card tokenisation request.
    #[must_use]
    pub fn new(card_number: impl Into<String>, card_pin: impl Into<String>) -> Self {
        Self {
            gateway_id: None,
            kind: "gift_card".to_owned(),
            card_number: card_number.into(),
            card_pin: card_pin.into(),
            store_pin: false,
        }
    }

    /// Sets the gateway.
    #[must_use]
    pub fn with_gateway(mut self, gateway_id: impl Into<String>) -> Self {
        self.gateway_id = Some(gateway_id.into());
        self
    }
}

impl fmt::Debug for GiftCardTokenRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GiftCardTokenRequest")
            .field("gateway_id", &self.gateway_id)
            .field("card_number", &mask_pan(&self.card_number))
            .field("card_pin", &"***")
            .field("store_pin", &self.store_pin)
            .finish()
    }
}

/// Keeps the last four digits of a card number.
fn mask_pan(number: &str) -> String {
    let digits: Vec<char> = number.chars().filter(char::is_ascii_digit).collect();
    let tail: String = digits.iter().skip(digits.len().saturating_sub(4)).collect();
    format!("****{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_request_debug_masks_secrets() {
        let request = CardTokenRequest::new("J Smith", "4111 1111 1111 1234", "09", "2030")
            .with_ccv("123");
        let debug = format!("{request:?}");
        assert!(debug.contains("****1234"));
        assert!(!debug.contains("4111"));
        assert!(!debug.contains("123\""));
    }

    #[test]
    fn test_gift_card_request_serializes_type() {
        let request = GiftCardTokenRequest::new("6280001234", "9876").with_gateway("gw_1");
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["type"], "gift_card");
        assert_eq!(value["gateway_id"], "gw_1");
        assert_eq!(value["store_pin"], false);
        assert!(!format!("{request:?}").contains("9876"));
    }
}
