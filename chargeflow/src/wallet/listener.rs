use super::{Completion, WalletState};
use crate::proto::PaymentMethod;
use crate::taxonomy::ErrorModel;

/// Observer of an orchestration, implemented by the host adapter.
///
/// All methods have default no-op implementations. Override only the ones you
/// need. Listeners are called synchronously after the orchestrator releases its
/// internal lock, so they may read or drive the orchestrator (for example call
/// `reset` from `on_completion`) but must not block.
///
/// Notifications are delivered in order for calls made from one task.
/// Notifications caused by calls on different threads are not ordered with
/// respect to each other: a `reset` on one thread can reach listeners before
/// the transition it superseded. Hosts that drive an orchestrator from several
/// threads should treat [`WalletOrchestrator::state`] as the source of truth.
///
/// [`WalletOrchestrator::state`]: crate::wallet::WalletOrchestrator::state
pub trait WalletListener: Send + Sync {
    /// Called on every state transition.
    fn on_state_change(&self, _method: PaymentMethod, _state: &WalletState) {}

    /// Called exactly once when an attempt reaches a terminal state.
    fn on_completion(&self, _method: PaymentMethod, _result: &Result<Completion, ErrorModel>) {}
}
