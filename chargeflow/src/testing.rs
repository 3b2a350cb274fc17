//! In-memory fakes shared by the unit tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use crate::backend::{BoxFuture, WalletBackend};
use crate::error::BackendError;
use crate::proto::{
    AmountContext, CallbackData, CallbackRequest, CaptureRequest, ChargeResponse, PaymentMethod,
    WalletToken,
};
use crate::taxonomy::ErrorModel;
use crate::wallet::{Completion, StateKind, WalletListener, WalletState};

/// A backend call as seen by [`FakeBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Token(PaymentMethod),
    Callback {
        token: String,
        request: CallbackRequest,
    },
    Capture {
        token: String,
        request: CaptureRequest,
    },
    Decline {
        token: String,
        charge_id: String,
    },
}

/// Holds a capture open until the test releases it.
#[derive(Debug, Clone, Default)]
pub struct CaptureGate {
    pub started: Arc<Notify>,
    pub release: Arc<Notify>,
}

pub fn charge(id: &str, status: &str) -> ChargeResponse {
    ChargeResponse {
        id: id.to_owned(),
        status: Some(status.to_owned()),
        amount: None,
        currency: Some("AUD".to_owned()),
        reference: None,
    }
}

/// Scripted backend that records every call.
///
/// By default every call succeeds: tokens are `tok_1`, `tok_2`, ..., the
/// callback carries charge `CH1` with both a `callback_url` and a `ref_token`,
/// and capture and decline return charge `CH1`.
#[derive(Debug)]
pub struct FakeBackend {
    next_token: AtomicU32,
    token_error: Option<BackendError>,
    callback: Result<CallbackData, BackendError>,
    capture: Result<ChargeResponse, BackendError>,
    decline: Result<ChargeResponse, BackendError>,
    capture_gate: Option<CaptureGate>,
    calls: Mutex<Vec<Call>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            next_token: AtomicU32::new(1),
            token_error: None,
            callback: Ok(CallbackData {
                id: Some("CH1".into()),
                status: Some("pending".into()),
                callback_url: Some("https://x/y".into()),
                ref_token: Some("ref_1".into()),
            }),
            capture: Ok(charge("CH1", "complete")),
            decline: Ok(charge("CH1", "declined")),
            capture_gate: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_first_token(self, first: u32) -> Self {
        self.next_token.store(first, Ordering::SeqCst);
        self
    }

    pub fn with_token_error(mut self, err: BackendError) -> Self {
        self.token_error = Some(err);
        self
    }

    pub fn with_callback(mut self, callback: Result<CallbackData, BackendError>) -> Self {
        self.callback = callback;
        self
    }

    pub fn with_capture(mut self, capture: Result<ChargeResponse, BackendError>) -> Self {
        self.capture = capture;
        self
    }

    pub fn with_decline(mut self, decline: Result<ChargeResponse, BackendError>) -> Self {
        self.decline = decline;
        self
    }

    pub fn with_capture_gate(mut self, gate: CaptureGate) -> Self {
        self.capture_gate = Some(gate);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn token_requests(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Token(_)))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl WalletBackend for FakeBackend {
    fn create_wallet_token<'a>(
        &'a self,
        method: PaymentMethod,
        _amount: &'a AmountContext,
    ) -> BoxFuture<'a, Result<WalletToken, BackendError>> {
        Box::pin(async move {
            self.record(Call::Token(method));
            if let Some(err) = &self.token_error {
                return Err(err.clone());
            }
            let n = self.next_token.fetch_add(1, Ordering::SeqCst);
            Ok(WalletToken::new(format!("tok_{n}")))
        })
    }

    fn wallet_callback<'a>(
        &'a self,
        token: &'a WalletToken,
        request: &'a CallbackRequest,
    ) -> BoxFuture<'a, Result<CallbackData, BackendError>> {
        Box::pin(async move {
            self.record(Call::Callback {
                token: token.as_str().to_owned(),
                request: request.clone(),
            });
            self.callback.clone()
        })
    }

    fn capture_wallet_charge<'a>(
        &'a self,
        token: &'a WalletToken,
        request: &'a CaptureRequest,
    ) -> BoxFuture<'a, Result<ChargeResponse, BackendError>> {
        Box::pin(async move {
            self.record(Call::Capture {
                token: token.as_str().to_owned(),
                request: request.clone(),
            });
            if let Some(gate) = &self.capture_gate {
                gate.started.notify_one();
                gate.release.notified().await;
            }
            self.capture.clone()
        })
    }

    fn decline_wallet_charge<'a>(
        &'a self,
        token: &'a WalletToken,
        charge_id: &'a str,
    ) -> BoxFuture<'a, Result<ChargeResponse, BackendError>> {
        Box::pin(async move {
            self.record(Call::Decline {
                token: token.as_str().to_owned(),
                charge_id: charge_id.to_owned(),
            });
            self.decline.clone()
        })
    }
}

/// Listener that records everything it is told.
#[derive(Debug, Default)]
pub struct Recorder {
    states: Mutex<Vec<WalletState>>,
    completions: Mutex<Vec<Result<Completion, ErrorModel>>>,
}

impl Recorder {
    pub fn kinds(&self) -> Vec<StateKind> {
        self.states.lock().unwrap().iter().map(WalletState::kind).collect()
    }

    pub fn completions(&self) -> Vec<Result<Completion, ErrorModel>> {
        self.completions.lock().unwrap().clone()
    }
}

impl WalletListener for Recorder {
    fn on_state_change(&self, _method: PaymentMethod, state: &WalletState) {
        self.states.lock().unwrap().push(state.clone());
    }

    fn on_completion(&self, _method: PaymentMethod, result: &Result<Completion, ErrorModel>) {
        self.completions.lock().unwrap().push(result.clone());
    }
}
