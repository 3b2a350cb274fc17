#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Wallet transaction orchestration for client-side payment SDKs.
//!
//! This crate drives wallet payments (PayPal, Afterpay, Google Pay, FlyPay,
//! Click to Pay, Mastercard SRC) from token issuance to capture, decodes the
//! JSON events posted by embedded payment widgets, and normalizes every
//! failure into a single displayable error model. It is transport-agnostic:
//! backend calls go through the [`backend::WalletBackend`] trait, implemented
//! over HTTP by the `chargeflow-http` crate.
//!
//! # Overview
//!
//! A payment attempt requests a short-lived wallet token, requests a
//! method-specific callback describing how to launch the external flow,
//! waits for the host to run that flow, then captures or declines the charge.
//! [`wallet::WalletOrchestrator`] runs this state machine and reports exactly
//! one outcome per attempt.
//!
//! # Modules
//!
//! - [`backend`] - Backend capability trait consumed by the flows
//! - [`bridge`] - Typed decoding of 3DS, Click to Pay and Mastercard SRC widget events
//! - [`error`] - Typed failures raised at use-case boundaries
//! - [`methods`] - Per-method flow implementations
//! - [`proto`] - Wire types exchanged with the backend
//! - [`taxonomy`] - Normalization of failures into [`taxonomy::ErrorModel`]
//! - [`wallet`] - The orchestrator, its states and listener trait
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation for debugging and monitoring

pub mod backend;
pub mod bridge;
pub mod error;
pub mod methods;
pub mod proto;
pub mod taxonomy;
pub mod wallet;

#[cfg(test)]
mod testing;

pub use taxonomy::ErrorModel;
pub use wallet::WalletOrchestrator;
