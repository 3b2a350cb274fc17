//! HTTP-specific constants for the payments backend.

/// Header carrying the merchant public key on token issuance.
pub const PUBLIC_KEY_HEADER: &str = "x-user-public-key";

/// Header carrying the wallet token on callback, capture and decline.
pub const ACCESS_TOKEN_HEADER: &str = "x-access-token";

/// Sandbox API base URL.
pub const SANDBOX_BASE_URL: &str = "https://api-sandbox.paydock.com/v1/";

/// Production API base URL.
pub const PRODUCTION_BASE_URL: &str = "https://api.paydock.com/v1/";

/// Token issuance endpoint, relative to the base URL.
pub const TOKENS_PATH: &str = "payment_sources/tokens";

/// Wallet callback endpoint, relative to the base URL.
pub const WALLET_CALLBACK_PATH: &str = "charges/wallet/callback";

/// Wallet capture endpoint, relative to the base URL.
pub const WALLET_CAPTURE_PATH: &str = "charges/wallet/capture";

/// Prefix of the wallet decline endpoint (`charges/wallet/{id}/decline`).
pub const WALLET_PATH: &str = "charges/wallet/";

/// Environment variable overriding the base URL.
pub const ENV_BASE_URL: &str = "CHARGEFLOW_BASE_URL";

/// Environment variable holding the merchant public key.
pub const ENV_PUBLIC_KEY: &str = "CHARGEFLOW_PUBLIC_KEY";

/// Environment variable holding the request timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "CHARGEFLOW_TIMEOUT_SECS";
