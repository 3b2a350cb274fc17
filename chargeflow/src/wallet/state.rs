use std::fmt;

use super::{Completion, LaunchInstruction};
use crate::taxonomy::ErrorModel;

/// Backend call the orchestrator is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadingStage {
    /// Wallet token issuance.
    Token,
    /// Callback acquisition.
    Callback,
    /// Charge capture.
    Capture,
}

/// UI-facing state of one orchestration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum WalletState {
    /// Nothing in progress.
    #[default]
    Idle,
    /// A backend call is in flight.
    Loading(LoadingStage),
    /// The host is running the external flow.
    AwaitingExternalFlow(LaunchInstruction),
    /// The attempt completed. Terminal until read or reset.
    Success(Completion),
    /// The attempt failed. Terminal until reset.
    Error(ErrorModel),
}

/// Payload-free discriminant of [`WalletState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKind {
    /// See [`WalletState::Idle`].
    Idle,
    /// See [`WalletState::Loading`].
    Loading,
    /// See [`WalletState::AwaitingExternalFlow`].
    AwaitingExternalFlow,
    /// See [`WalletState::Success`].
    Success,
    /// See [`WalletState::Error`].
    Error,
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::AwaitingExternalFlow => "awaiting external flow",
            Self::Success => "success",
            Self::Error => "error",
        })
    }
}

impl WalletState {
    /// Returns the discriminant.
    #[must_use]
    pub const fn kind(&self) -> StateKind {
        match self {
            Self::Idle => StateKind::Idle,
            Self::Loading(_) => StateKind::Loading,
            Self::AwaitingExternalFlow(_) => StateKind::AwaitingExternalFlow,
            Self::Success(_) => StateKind::Success,
            Self::Error(_) => StateKind::Error,
        }
    }

    /// Returns `true` for [`WalletState::Success`] and [`WalletState::Error`].
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Success(_) | Self::Error(_))
    }
}

/// Misuse of the orchestrator, or a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrchestratorError {
    /// `start` was called while an attempt is already in progress or unread.
    #[error("cannot start a new attempt while {state}")]
    Busy {
        /// State at the time of the call.
        state: StateKind,
    },
    /// An external result arrived when none was expected.
    #[error("unexpected external result while {state}")]
    UnexpectedResult {
        /// State at the time of the call.
        state: StateKind,
    },
    /// The attempt was reset or cancelled before this call finished.
    #[error("attempt was reset or cancelled")]
    Superseded,
    /// The attempt failed.
    #[error("{0}")]
    Failed(ErrorModel),
}

impl OrchestratorError {
    /// Returns the error model of a failed attempt.
    #[must_use]
    pub const fn error_model(&self) -> Option<&ErrorModel> {
        match self {
            Self::Failed(model) => Some(model),
            _ => None,
        }
    }
}
