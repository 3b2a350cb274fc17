//! A [`WalletBackend`] implementation that talks to the payments API over HTTP.
//!
//! [`HttpWalletBackend`] handles the token, wallet callback, capture and
//! decline endpoints, plus card and gift-card tokenisation against the same
//! tokens endpoint.
//!
//! ## Error Handling
//!
//! Every failure is returned as a [`BackendError`]:
//! - transport faults are classified as timeout, unknown host or I/O
//! - undecodable success bodies become serialization errors
//! - non-2xx responses keep the status, the raw body and the parsed error envelope

use std::fmt::Display;
use std::time::Duration;

use chargeflow::backend::{BoxFuture, WalletBackend};
use chargeflow::error::{BackendError, Integration, Stage, WalletError};
use chargeflow::proto::{
    AmountContext, ApiErrorEnvelope, ApiResponse, CallbackData, CallbackRequest, CaptureRequest,
    CardTokenRequest, ChargeResponse, GiftCardTokenRequest, PaymentMethod, WalletToken,
    WalletTokenRequest,
};
use reqwest::Client;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

#[cfg(feature = "telemetry")]
use tracing::{Span, instrument};

use crate::config::BackendConfig;
use crate::constants::{
    ACCESS_TOKEN_HEADER, PUBLIC_KEY_HEADER, TOKENS_PATH, WALLET_CALLBACK_PATH, WALLET_CAPTURE_PATH,
    WALLET_PATH,
};
use crate::error::{ConfigError, classify};

/// HTTP client for the payments backend.
///
/// # Example
///
/// ```no_run
/// use chargeflow::WalletOrchestrator;
/// use chargeflow::methods::PayPalFlow;
/// use chargeflow_http::{BackendConfig, HttpWalletBackend};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = HttpWalletBackend::new(BackendConfig::from_env()?)?;
/// let orchestrator = WalletOrchestrator::new(PayPalFlow::new(backend));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct HttpWalletBackend {
    base_url: Url,
    tokens_url: Url,
    callback_url: Url,
    capture_url: Url,
    wallet_url: Url,
    client: Client,
    public_key: Option<String>,
    headers: HeaderMap,
    timeout: Option<Duration>,
}

/// Credential attached to a request.
#[derive(Clone, Copy)]
enum Auth<'a> {
    PublicKey,
    AccessToken(&'a WalletToken),
}

/// Token data returned by the tokens endpoint, either bare or wrapped.
#[derive(Deserialize)]
#[serde(untagged)]
enum TokenData {
    Bare(String),
    Wrapped { token: String },
}

impl TokenData {
    fn into_token(self) -> String {
        match self {
            Self::Bare(token) | Self::Wrapped { token } => token,
        }
    }
}

impl HttpWalletBackend {
    /// Creates a backend client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the endpoint URLs cannot be derived from the base URL.
    pub fn new(config: BackendConfig) -> Result<Self, ConfigError> {
        let base_url = config.base_url;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::CannotBeABase(base_url.to_string()));
        }
        let join = |path: &str, context: &'static str| {
            base_url
                .join(path)
                .map_err(|source| ConfigError::UrlParse { context, source })
        };
        let tokens_url = join(TOKENS_PATH, "Failed to construct tokens URL")?;
        let callback_url = join(WALLET_CALLBACK_PATH, "Failed to construct wallet callback URL")?;
        let capture_url = join(WALLET_CAPTURE_PATH, "Failed to construct wallet capture URL")?;
        let wallet_url = join(WALLET_PATH, "Failed to construct wallet URL")?;

        Ok(Self {
            tokens_url,
            callback_url,
            capture_url,
            wallet_url,
            base_url,
            client: config.http_client.unwrap_or_default(),
            public_key: config.public_key,
            headers: config.headers,
            timeout: config.timeout,
        })
    }

    /// Returns the base URL used by this client.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the configured timeout, if any.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Returns the URL of `POST /charges/wallet/{id}/decline`.
    #[must_use]
    pub fn decline_url(&self, charge_id: &str) -> Url {
        let mut url = self.wallet_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(charge_id).push("decline");
        }
        url
    }

    /// Sends `POST /payment_sources/tokens` to issue a wallet token.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the request fails or the token cannot be decoded.
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "chargeflow.backend.create_wallet_token",
            skip_all,
            fields(wallet_type = method.wallet_type(), otel.status_code = tracing::field::Empty, error.message = tracing::field::Empty)
        )
    )]
    pub async fn create_wallet_token(
        &self,
        method: PaymentMethod,
        amount: &AmountContext,
    ) -> Result<WalletToken, BackendError> {
        let request = WalletTokenRequest {
            wallet_type: method,
            amount,
        };
        let data: TokenData = self
            .post_json(&self.tokens_url, "POST /payment_sources/tokens", Auth::PublicKey, &request)
            .await?;
        Ok(WalletToken::new(data.into_token()))
    }

    /// Sends `POST /charges/wallet/callback`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the request fails or the response cannot be decoded.
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "chargeflow.backend.wallet_callback",
            skip_all,
            fields(wallet_type = request.wallet_type.wallet_type(), otel.status_code = tracing::field::Empty, error.message = tracing::field::Empty)
        )
    )]
    pub async fn wallet_callback(
        &self,
        token: &WalletToken,
        request: &CallbackRequest,
    ) -> Result<CallbackData, BackendError> {
        self.post_json(
            &self.callback_url,
            "POST /charges/wallet/callback",
            Auth::AccessToken(token),
            request,
        )
        .await
    }

    /// Sends `POST /charges/wallet/capture`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the request fails or the response cannot be decoded.
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "chargeflow.backend.capture_wallet_charge",
            skip_all,
            fields(otel.status_code = tracing::field::Empty, error.message = tracing::field::Empty)
        )
    )]
    pub async fn capture_wallet_charge(
        &self,
        token: &WalletToken,
        request: &CaptureRequest,
    ) -> Result<ChargeResponse, BackendError> {
        self.post_json(
            &self.capture_url,
            "POST /charges/wallet/capture",
            Auth::AccessToken(token),
            request,
        )
        .await
    }

    /// Sends `POST /charges/wallet/{id}/decline` with an empty body.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the request fails or the response cannot be decoded.
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "chargeflow.backend.decline_wallet_charge",
            skip_all,
            fields(charge_id = %charge_id, otel.status_code = tracing::field::Empty, error.message = tracing::field::Empty)
        )
    )]
    pub async fn decline_wallet_charge(
        &self,
        token: &WalletToken,
        charge_id: &str,
    ) -> Result<ChargeResponse, BackendError> {
        let url = self.decline_url(charge_id);
        self.post_json(
            &url,
            "POST /charges/wallet/{id}/decline",
            Auth::AccessToken(token),
            &serde_json::Map::new(),
        )
        .await
    }

    /// Exchanges card details for a one-time card token.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::Backend`] tagged with [`Integration::CardTokenisation`].
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "chargeflow.backend.tokenise_card",
            skip_all,
            fields(otel.status_code = tracing::field::Empty, error.message = tracing::field::Empty)
        )
    )]
    pub async fn tokenise_card(&self, request: &CardTokenRequest) -> Result<String, WalletError> {
        self.post_json::<_, TokenData>(
            &self.tokens_url,
            "POST /payment_sources/tokens",
            Auth::PublicKey,
            request,
        )
        .await
        .map(TokenData::into_token)
        .map_err(WalletError::at(Integration::CardTokenisation, Stage::Tokenisation))
    }

    /// Exchanges gift card details for a one-time gift card token.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::Backend`] tagged with [`Integration::GiftCardTokenisation`].
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "chargeflow.backend.tokenise_gift_card",
            skip_all,
            fields(otel.status_code = tracing::field::Empty, error.message = tracing::field::Empty)
        )
    )]
    pub async fn tokenise_gift_card(&self, request: &GiftCardTokenRequest) -> Result<String, WalletError> {
        self.post_json::<_, TokenData>(
            &self.tokens_url,
            "POST /payment_sources/tokens",
            Auth::PublicKey,
            request,
        )
        .await
        .map(TokenData::into_token)
        .map_err(WalletError::at(Integration::GiftCardTokenisation, Stage::Tokenisation))
    }

    /// Generic POST helper that handles authentication, timeout application,
    /// envelope decoding, error classification and telemetry.
    ///
    /// `context` is a human-readable identifier used in tracing and error messages (e.g. `"POST /charges/wallet/capture"`).
    async fn post_json<T, R>(
        &self,
        url: &Url,
        context: &'static str,
        auth: Auth<'_>,
        payload: &T,
    ) -> Result<R, BackendError>
    where
        T: serde::Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let result = self.send(url, context, auth, payload).await;
        record_result_on_span(&result);
        result
    }

    async fn send<T, R>(
        &self,
        url: &Url,
        context: &'static str,
        auth: Auth<'_>,
        payload: &T,
    ) -> Result<R, BackendError>
    where
        T: serde::Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let mut req = self.client.post(url.clone()).json(payload);
        for (key, value) in &self.headers {
            req = req.header(key, value);
        }
        req = match auth {
            Auth::PublicKey => match &self.public_key {
                Some(key) => req.header(PUBLIC_KEY_HEADER, key.as_str()),
                None => req,
            },
            Auth::AccessToken(token) => req.header(ACCESS_TOKEN_HEADER, token.as_str()),
        };
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }

        let response = req.send().await.map_err(|e| classify(context, &e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| classify(context, &e))?;

        if status.is_success() {
            serde_json::from_str::<ApiResponse<R>>(&body)
                .map(ApiResponse::into_data)
                .map_err(|e| BackendError::Serialization(format!("{context}: {e}")))
        } else {
            Err(BackendError::Api {
                status: status.as_u16(),
                envelope: ApiErrorEnvelope::parse(&body),
                body,
            })
        }
    }
}

impl WalletBackend for HttpWalletBackend {
    fn create_wallet_token<'a>(
        &'a self,
        method: PaymentMethod,
        amount: &'a AmountContext,
    ) -> BoxFuture<'a, Result<WalletToken, BackendError>> {
        Box::pin(Self::create_wallet_token(self, method, amount))
    }

    fn wallet_callback<'a>(
        &'a self,
        token: &'a WalletToken,
        request: &'a CallbackRequest,
    ) -> BoxFuture<'a, Result<CallbackData, BackendError>> {
        Box::pin(Self::wallet_callback(self, token, request))
    }

    fn capture_wallet_charge<'a>(
        &'a self,
        token: &'a WalletToken,
        request: &'a CaptureRequest,
    ) -> BoxFuture<'a, Result<ChargeResponse, BackendError>> {
        Box::pin(Self::capture_wallet_charge(self, token, request))
    }

    fn decline_wallet_charge<'a>(
        &'a self,
        token: &'a WalletToken,
        charge_id: &'a str,
    ) -> BoxFuture<'a, Result<ChargeResponse, BackendError>> {
        Box::pin(Self::decline_wallet_charge(self, token, charge_id))
    }
}

impl TryFrom<&str> for HttpWalletBackend {
    type Error = ConfigError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(BackendConfig::try_from(value)?)
    }
}

/// Records the outcome of a request on a tracing span, including status and errors.
#[cfg(feature = "telemetry")]
fn record_result_on_span<R, E: Display>(result: &Result<R, E>) {
    let span = Span::current();
    match result {
        Ok(_) => {
            span.record("otel.status_code", "OK");
        }
        Err(err) => {
            span.record("otel.status_code", "ERROR");
            span.record("error.message", tracing::field::display(err));
            tracing::event!(tracing::Level::WARN, error = %err, "Request to payments backend failed");
        }
    }
}

/// Records the outcome of a request on a tracing span, including status and errors.
/// Noop if telemetry feature is off.
#[cfg(not(feature = "telemetry"))]
fn record_result_on_span<R, E: Display>(_result: &Result<R, E>) {}
