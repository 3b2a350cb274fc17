use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{
    Completion, ExternalResult, LaunchInstruction, LoadingStage, OrchestratorError, WalletCallback,
    WalletFlow, WalletListener, WalletState,
};
use crate::error::{Integration, WalletError};
use crate::proto::{AmountContext, ChargeResponse, PaymentMethod, WalletToken};
use crate::taxonomy::ErrorModel;

/// Mutable part of an orchestration, guarded by a mutex that is never held
/// across an `.await`.
#[derive(Debug, Default)]
struct Session {
    state: WalletState,
    token: Option<WalletToken>,
    callback: Option<WalletCallback>,
    /// Bumped on every `start`, `reset` and `cancel`. A backend call whose
    /// generation no longer matches has been superseded and its result is
    /// dropped.
    generation: u64,
}

/// Runs one wallet payment attempt at a time for a single payment method.
///
/// The orchestrator owns the wallet token and callback of the current attempt
/// and makes sure exactly one terminal state is reached per `start`:
///
/// 1. [`start`](Self::start) requests a token and a callback, then returns the
///    [`LaunchInstruction`] the host uses to open the external flow.
/// 2. The host reports the flow's outcome through
///    [`on_external_result`](Self::on_external_result), which captures,
///    cancels or fails the attempt.
/// 3. The host reads a success with [`take_completion`](Self::take_completion)
///    or discards the attempt with [`reset`](Self::reset).
///
/// Backend calls are never cancelled. When the host resets or cancels while a
/// call is in flight, the call is allowed to finish and its result is
/// discarded.
///
/// # Example
///
/// ```no_run
/// use chargeflow::methods::PayPalFlow;
/// use chargeflow::proto::AmountContext;
/// use chargeflow::wallet::{Approval, ExternalResult, WalletOrchestrator};
/// # use chargeflow::backend::WalletBackend;
/// # async fn run(backend: impl WalletBackend, amount: AmountContext) -> Result<(), Box<dyn std::error::Error>> {
///
/// let orchestrator = WalletOrchestrator::new(PayPalFlow::new(backend));
/// let launch = orchestrator.start(&amount).await?;
/// // ... open `launch` in the browser, wait for the return deep link ...
/// let approval = Approval::new("PAY-1").with_payer("PAYER-1");
/// let completion = orchestrator.on_external_result(ExternalResult::Success(approval)).await?;
/// # Ok(())
/// # }
/// ```
pub struct WalletOrchestrator<F> {
    flow: F,
    listeners: Vec<Arc<dyn WalletListener>>,
    session: Mutex<Session>,
}

impl<F: WalletFlow> fmt::Debug for WalletOrchestrator<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let session = self.lock();
        f.debug_struct("WalletOrchestrator")
            .field("method", &self.flow.method())
            .field("state", &session.state.kind())
            .field("generation", &session.generation)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl<F: WalletFlow> WalletOrchestrator<F> {
    /// Creates an idle orchestrator for the given flow.
    pub fn new(flow: F) -> Self {
        Self {
            flow,
            listeners: Vec::new(),
            session: Mutex::new(Session::default()),
        }
    }

    /// Registers a listener. Listeners are notified in registration order.
    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn WalletListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Returns the payment method this orchestrator drives.
    #[must_use]
    pub fn method(&self) -> PaymentMethod {
        self.flow.method()
    }

    /// Returns the underlying flow.
    #[must_use]
    pub const fn flow(&self) -> &F {
        &self.flow
    }

    /// Returns a snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> WalletState {
        self.lock().state.clone()
    }

    /// Returns `true` when no attempt is in progress.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self.lock().state, WalletState::Idle)
    }

    /// Returns `true` while a wallet token is held for the current attempt.
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.lock().token.is_some()
    }

    /// Returns `true` while a callback is held for the current attempt.
    #[must_use]
    pub fn has_callback(&self) -> bool {
        self.lock().callback.is_some()
    }

    /// Starts a payment attempt.
    ///
    /// Requests a wallet token, then a callback, and moves to
    /// [`WalletState::AwaitingExternalFlow`].
    ///
    /// # Errors
    ///
    /// - [`OrchestratorError::Busy`] if the orchestrator is not idle
    /// - [`OrchestratorError::Failed`] if the token or callback request failed
    /// - [`OrchestratorError::Superseded`] if the attempt was reset or
    ///   cancelled while a request was in flight
    pub async fn start(&self, amount: &AmountContext) -> Result<LaunchInstruction, OrchestratorError> {
        let loading = WalletState::Loading(LoadingStage::Token);
        let generation = {
            let mut session = self.lock();
            if !matches!(session.state, WalletState::Idle) {
                return Err(OrchestratorError::Busy {
                    state: session.state.kind(),
                });
            }
            session.generation = session.generation.wrapping_add(1);
            session.token = None;
            session.callback = None;
            session.state = loading.clone();
            session.generation
        };
        self.emit_state(&loading);

        let token = match self.flow.request_token(amount).await {
            Ok(token) => token,
            Err(err) => return Err(self.fail(generation, &err)),
        };
        self.advance(
            generation,
            WalletState::Loading(LoadingStage::Callback),
            |session| session.token = Some(token.clone()),
        )?;

        let callback = match self.flow.request_callback(&token).await {
            Ok(callback) => callback,
            Err(err) => return Err(self.fail(generation, &err)),
        };
        let instruction = self.flow.launch_instruction(&callback);
        self.advance(
            generation,
            WalletState::AwaitingExternalFlow(instruction.clone()),
            |session| session.callback = Some(callback),
        )?;
        Ok(instruction)
    }

    /// Resolves the external flow of the current attempt.
    ///
    /// Only the first result for an attempt is accepted.
    ///
    /// - `Success` captures the charge and ends in `Success`, or in `Error` if
    ///   the capture fails.
    /// - `UserCancelled` ends in `Error(Cancellation)` without calling the
    ///   backend.
    /// - `TransportError` ends in `Error`, then declines the pending charge if
    ///   there is one. The decline is best effort.
    ///
    /// # Errors
    ///
    /// - [`OrchestratorError::UnexpectedResult`] if no external flow is pending
    /// - [`OrchestratorError::Failed`] if the attempt ended in `Error`
    /// - [`OrchestratorError::Superseded`] if the attempt was reset or
    ///   cancelled while the capture was in flight
    pub async fn on_external_result(&self, result: ExternalResult) -> Result<Completion, OrchestratorError> {
        let method = self.flow.method();
        match result {
            ExternalResult::Success(approval) => {
                let next = WalletState::Loading(LoadingStage::Capture);
                let (generation, token, callback) = self.resolve(next.clone())?;
                self.emit_state(&next);

                match self.flow.capture(&token, &callback, &approval).await {
                    Ok(completion) => {
                        self.settle(generation, &Ok(completion.clone()))?;
                        Ok(completion)
                    }
                    Err(err) => Err(self.fail(generation, &err)),
                }
            }
            ExternalResult::UserCancelled => {
                let model = ErrorModel::from(WalletError::Cancelled { method });
                self.resolve(WalletState::Error(model.clone()))?;
                #[cfg(feature = "telemetry")]
                tracing::info!(%method, "external flow cancelled by the user");
                self.notify_terminal(&Err(model.clone()));
                Err(OrchestratorError::Failed(model))
            }
            ExternalResult::TransportError { code, message } => {
                let model = ErrorModel::from(WalletError::ExternalFlow {
                    integration: Integration::from(method),
                    code,
                    message,
                });
                let (_, token, callback) = self.resolve(WalletState::Error(model.clone()))?;
                #[cfg(feature = "telemetry")]
                tracing::warn!(%method, error = %model.display_message(), "external flow failed");
                self.notify_terminal(&Err(model.clone()));

                let declined = self.flow.decline(&token, &callback).await;
                record_decline(method, &declined);
                Err(OrchestratorError::Failed(model))
            }
        }
    }

    /// Cancels the current attempt on behalf of the host (e.g. back navigation).
    ///
    /// Moves a loading or awaiting attempt to `Error(Cancellation)`. The result
    /// of any backend call still in flight is discarded. Returns `false` when
    /// there was nothing to cancel.
    pub fn cancel(&self) -> bool {
        let model = ErrorModel::from(WalletError::Cancelled {
            method: self.flow.method(),
        });
        {
            let mut session = self.lock();
            if !matches!(
                session.state,
                WalletState::Loading(_) | WalletState::AwaitingExternalFlow(_)
            ) {
                return false;
            }
            session.generation = session.generation.wrapping_add(1);
            session.state = WalletState::Error(model.clone());
        }
        #[cfg(feature = "telemetry")]
        tracing::info!(method = %self.flow.method(), "attempt cancelled by the host");
        self.notify_terminal(&Err(model));
        true
    }

    /// Reads a successful completion once and returns to `Idle`.
    ///
    /// Returns `None` unless the state is [`WalletState::Success`].
    pub fn take_completion(&self) -> Option<Completion> {
        let completion = {
            let mut session = self.lock();
            match std::mem::take(&mut session.state) {
                WalletState::Success(completion) => {
                    session.token = None;
                    session.callback = None;
                    completion
                }
                other => {
                    session.state = other;
                    return None;
                }
            }
        };
        self.emit_state(&WalletState::Idle);
        Some(completion)
    }

    /// Discards the current attempt and returns to `Idle`.
    ///
    /// Safe to call from any state. Clears the token and callback. A backend
    /// call still in flight is not cancelled; its result is discarded when it
    /// arrives.
    pub fn reset(&self) {
        let changed = {
            let mut session = self.lock();
            session.generation = session.generation.wrapping_add(1);
            session.token = None;
            session.callback = None;
            let changed = !matches!(session.state, WalletState::Idle);
            session.state = WalletState::Idle;
            changed
        };
        if changed {
            #[cfg(feature = "telemetry")]
            tracing::debug!(method = %self.flow.method(), "attempt reset");
            self.emit_state(&WalletState::Idle);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Moves to a non-terminal state if `generation` is still current.
    fn advance(
        &self,
        generation: u64,
        next: WalletState,
        update: impl FnOnce(&mut Session),
    ) -> Result<(), OrchestratorError> {
        {
            let mut session = self.lock();
            if session.generation != generation {
                return Err(self.superseded());
            }
            update(&mut session);
            session.state = next.clone();
        }
        self.emit_state(&next);
        Ok(())
    }

    /// Claims the pending external flow, moving to `next`.
    fn resolve(&self, next: WalletState) -> Result<(u64, WalletToken, WalletCallback), OrchestratorError> {
        let mut session = self.lock();
        let state = session.state.kind();
        if !matches!(session.state, WalletState::AwaitingExternalFlow(_)) {
            return Err(OrchestratorError::UnexpectedResult { state });
        }
        let (Some(token), Some(callback)) = (session.token.clone(), session.callback.clone()) else {
            return Err(OrchestratorError::UnexpectedResult { state });
        };
        session.state = next;
        Ok((session.generation, token, callback))
    }

    fn fail(&self, generation: u64, err: &WalletError) -> OrchestratorError {
        let model = ErrorModel::from(err);
        #[cfg(feature = "telemetry")]
        tracing::warn!(method = %self.flow.method(), error = %err, "wallet attempt failed");
        match self.settle(generation, &Err(model.clone())) {
            Ok(()) => OrchestratorError::Failed(model),
            Err(superseded) => superseded,
        }
    }

    /// Stores a terminal state and notifies listeners if `generation` is
    /// still current.
    fn settle(&self, generation: u64, result: &Result<Completion, ErrorModel>) -> Result<(), OrchestratorError> {
        {
            let mut session = self.lock();
            if session.generation != generation {
                return Err(self.superseded());
            }
            session.state = match result {
                Ok(completion) => WalletState::Success(completion.clone()),
                Err(model) => WalletState::Error(model.clone()),
            };
        }
        self.notify_terminal(result);
        Ok(())
    }

    /// Emits the terminal state and the completion. The state must already be
    /// stored in the session.
    fn notify_terminal(&self, result: &Result<Completion, ErrorModel>) {
        let state = match result {
            Ok(completion) => WalletState::Success(completion.clone()),
            Err(model) => WalletState::Error(model.clone()),
        };
        self.emit_state(&state);
        let method = self.flow.method();
        for listener in &self.listeners {
            listener.on_completion(method, result);
        }
    }

    fn superseded(&self) -> OrchestratorError {
        #[cfg(feature = "telemetry")]
        tracing::info!(method = %self.flow.method(), "discarding result of a superseded attempt");
        OrchestratorError::Superseded
    }

    fn emit_state(&self, state: &WalletState) {
        let method = self.flow.method();
        #[cfg(feature = "telemetry")]
        tracing::debug!(%method, state = %state.kind(), "wallet state changed");
        for listener in &self.listeners {
            listener.on_state_change(method, state);
        }
    }
}

/// Logs the outcome of a best-effort decline.
#[cfg(feature = "telemetry")]
fn record_decline(method: PaymentMethod, declined: &Result<Option<ChargeResponse>, WalletError>) {
    match declined {
        Ok(Some(charge)) => tracing::debug!(%method, charge_id = %charge.id, "pending charge declined"),
        Ok(None) => {}
        Err(err) => tracing::warn!(%method, error = %err, "decline after external failure failed"),
    }
}

/// Noop if telemetry feature is off.
#[cfg(not(feature = "telemetry"))]
const fn record_decline(_method: PaymentMethod, _declined: &Result<Option<ChargeResponse>, WalletError>) {}
