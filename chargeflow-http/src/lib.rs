//! HTTP transport for the chargeflow wallet orchestration SDK.
//!
//! Implements [`chargeflow::backend::WalletBackend`] over the payments REST
//! API with `reqwest`, classifying transport failures and parsing error
//! envelopes so the core crate can normalize them.
//!
//! # Modules
//!
//! - [`backend`] - [`HttpWalletBackend`], the REST client
//! - [`config`] - [`BackendConfig`], built in code or from the environment
//! - [`constants`] - Header names, base URLs, endpoint paths, environment variables
//! - [`error`] - Configuration errors
//!
//! # Feature Flags
//!
//! - `telemetry` - Records a tracing span per backend request

pub mod backend;
pub mod config;
pub mod constants;
pub mod error;

pub use backend::HttpWalletBackend;
pub use config::BackendConfig;
pub use error::ConfigError;
