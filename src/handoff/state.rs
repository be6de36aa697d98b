//! Handoff state machine
//!
//! The server keeps no per-browser state, so these states describe where a
//! browser sits in the flow rather than anything stored. The controller uses
//! them to log each transition it drives.

use std::fmt;

/// Where a browser is in the SAML handoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffState {
    Anonymous,
    AwaitingIdpRedirect,
    AwaitingCallback,
    Authenticated,
    Failed,
}

/// Events that move a browser between handoff states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffEvent {
    /// Broker returned a redirect target for the organization
    RedirectResolved,
    /// Browser came back from the identity provider through the broker
    IdpReturned,
    /// One-time code redeemed and session established
    CodeRedeemed,
    /// Broker error or malformed callback
    Failure,
    Logout,
}

impl HandoffState {
    /// Apply an event, returning `None` for transitions the flow does not allow
    #[must_use]
    pub fn transition(self, event: HandoffEvent) -> Option<HandoffState> {
        use HandoffEvent as E;
        use HandoffState as S;

        match (self, event) {
            (_, E::Logout) => Some(S::Anonymous),
            (_, E::Failure) => Some(S::Failed),
            (S::Failed, _) => None,
            // Signing in again from an existing session starts a fresh handoff
            (S::Anonymous | S::Authenticated, E::RedirectResolved) => Some(S::AwaitingIdpRedirect),
            (S::AwaitingIdpRedirect, E::IdpReturned) => Some(S::AwaitingCallback),
            (S::AwaitingCallback, E::CodeRedeemed) => Some(S::Authenticated),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, HandoffState::Failed)
    }
}

impl fmt::Display for HandoffState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HandoffState::Anonymous => "anonymous",
            HandoffState::AwaitingIdpRedirect => "awaiting_idp_redirect",
            HandoffState::AwaitingCallback => "awaiting_callback",
            HandoffState::Authenticated => "authenticated",
            HandoffState::Failed => "failed",
        };
        f.write_str(name)
    }
}
