//! Lifecycle state of a service.
//!
//! The transitions are validated: [`ServiceState::can_transition_to`] is the single place
//! that defines which state may follow which. `RECONFIGURING` is transient and returns to
//! the state held before it, so the caller has to remember that state (see
//! [`ServiceState::can_return_from_reconfiguring`]).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ApiError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceState {
    /// Registered, never started.
    #[default]
    Available,
    /// Handed to the substrate, waiting for the deployment to settle.
    Deploying,
    /// Deployed, the service implementation is coming up.
    Starting,
    /// Processing data.
    Running,
    /// On the way between running and passivated (either direction).
    Passivating,
    /// Alive but not processing data.
    Passivated,
    /// Applying new parameter values.
    Reconfiguring,
    /// Shutting down.
    Stopping,
    /// Shut down, may be started again.
    Stopped,
    /// Deployment, start or stop failed. Left only by an explicit restart, stop or removal.
    Failed,
    /// About to be removed together with its artifact.
    Undeploying,
}

impl ServiceState {
    pub const ALL: [ServiceState; 11] = [
        ServiceState::Available,
        ServiceState::Deploying,
        ServiceState::Starting,
        ServiceState::Running,
        ServiceState::Passivating,
        ServiceState::Passivated,
        ServiceState::Reconfiguring,
        ServiceState::Stopping,
        ServiceState::Stopped,
        ServiceState::Failed,
        ServiceState::Undeploying,
    ];

    /// Whether the state machine allows moving from `self` to `next`.
    ///
    /// Staying in the same state is always allowed. Leaving `Reconfiguring` is accepted
    /// towards every state `Reconfiguring` may be entered from; whether it is the *right*
    /// one is checked by the caller with [`ServiceState::can_return_from_reconfiguring`].
    pub fn can_transition_to(self, next: ServiceState) -> bool {
        use ServiceState::*;
        if self == next {
            return true;
        }
        match self {
            Available => matches!(next, Deploying | Starting | Undeploying),
            // Stopping: `stop_service` catching a deployment that is still in flight
            Deploying => matches!(next, Starting | Failed | Stopping),
            Starting => matches!(next, Running | Failed | Stopping | Reconfiguring),
            Running => matches!(next, Passivating | Reconfiguring | Stopping),
            Passivating => matches!(next, Passivated | Running),
            Passivated => matches!(next, Passivating | Reconfiguring | Stopping),
            Reconfiguring => next.can_return_from_reconfiguring(),
            Stopping => matches!(next, Stopped | Failed),
            Stopped => matches!(next, Deploying | Starting | Undeploying),
            Failed => matches!(next, Deploying | Starting | Stopping | Undeploying),
            Undeploying => false,
        }
    }

    /// States a service may hold before entering `Reconfiguring`, i.e. the ones it returns to.
    pub fn can_return_from_reconfiguring(self) -> bool {
        matches!(
            self,
            ServiceState::Starting | ServiceState::Running | ServiceState::Passivated
        )
    }

    /// Validates the transition `self -> next`.
    pub fn transition(self, next: ServiceState) -> Result<ServiceState> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(ApiError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Whether a service in this state may be (re)started.
    pub fn is_startable(self) -> bool {
        matches!(
            self,
            ServiceState::Available | ServiceState::Stopped | ServiceState::Failed
        )
    }

    /// Whether a service in this state is alive, i.e. has to be stopped before removal.
    pub fn is_alive(self) -> bool {
        !matches!(
            self,
            ServiceState::Available
                | ServiceState::Stopped
                | ServiceState::Failed
                | ServiceState::Undeploying
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ServiceState::Available => "AVAILABLE",
            ServiceState::Deploying => "DEPLOYING",
            ServiceState::Starting => "STARTING",
            ServiceState::Running => "RUNNING",
            ServiceState::Passivating => "PASSIVATING",
            ServiceState::Passivated => "PASSIVATED",
            ServiceState::Reconfiguring => "RECONFIGURING",
            ServiceState::Stopping => "STOPPING",
            ServiceState::Stopped => "STOPPED",
            ServiceState::Failed => "FAILED",
            ServiceState::Undeploying => "UNDEPLOYING",
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceState {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self> {
        let upper = s.trim().to_ascii_uppercase();
        ServiceState::ALL
            .iter()
            .copied()
            .find(|state| state.as_str() == upper)
            .ok_or_else(|| ApiError::UnknownState(s.to_string()))
    }
}
