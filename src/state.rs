// MIT License - Copyright (c) 2026 Peter Wright
// Lares4 WebSocket client

//! Client lifecycle.
//!
//! ```text
//! Disconnected → Connecting → AwaitingLogin → Authenticated → Bootstrapping → Ready
//!       │             │              │                │               │          │
//!       └─────────────┴──────────────┴────────────────┴───────────────┴──────────┴──→ Closed
//! ```
//!
//! `Closed` is terminal.

use std::fmt;

use crate::error::{Lares4Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Nothing opened yet
    #[default]
    Disconnected,
    /// Transport being opened
    Connecting,
    /// Login sent, waiting for the single reply
    AwaitingLogin,
    /// Login token received
    Authenticated,
    /// Bootstrap queries in flight
    Bootstrapping,
    /// Snapshot loaded, applying push updates
    Ready,
    /// Closed by the caller or after a fatal failure
    Closed,
}

impl ConnectionState {
    pub fn can_transition_to(&self, next: ConnectionState) -> bool {
        use ConnectionState::*;

        match (self, next) {
            (Closed, _) => false,
            (_, Closed) => true,
            (Disconnected, Connecting) => true,
            (Connecting, AwaitingLogin) => true,
            (AwaitingLogin, Authenticated) => true,
            (Authenticated, Bootstrapping) => true,
            (Bootstrapping, Ready) => true,
            _ => false,
        }
    }

    pub fn transition_to(&mut self, next: ConnectionState) -> Result<()> {
        if self.can_transition_to(next) {
            *self = next;
            Ok(())
        } else {
            Err(Lares4Error::InvalidTransition {
                from: *self,
                to: next,
            })
        }
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        matches!(self, ConnectionState::Ready)
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        matches!(self, ConnectionState::Closed)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::Connecting => "Connecting",
            ConnectionState::AwaitingLogin => "AwaitingLogin",
            ConnectionState::Authenticated => "Authenticated",
            ConnectionState::Bootstrapping => "Bootstrapping",
            ConnectionState::Ready => "Ready",
            ConnectionState::Closed => "Closed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConnectionState::*;

    #[test]
    fn test_happy_path() {
        let mut state = ConnectionState::default();
        for next in [Connecting, AwaitingLogin, Authenticated, Bootstrapping, Ready, Closed] {
            assert!(state.transition_to(next).is_ok(), "{state} -> {next}");
            assert_eq!(state, next);
        }
    }

    #[test]
    fn test_skipping_steps_is_rejected() {
        let mut state = Connecting;
        assert!(matches!(
            state.transition_to(Ready),
            Err(Lares4Error::InvalidTransition {
                from: Connecting,
                to: Ready
            })
        ));
        assert_eq!(state, Connecting);
        assert!(!AwaitingLogin.can_transition_to(Bootstrapping));
        assert!(!Ready.can_transition_to(Bootstrapping));
    }

    #[test]
    fn test_closed_from_anywhere() {
        for state in [Disconnected, Connecting, AwaitingLogin, Authenticated, Bootstrapping, Ready] {
            assert!(state.can_transition_to(Closed));
        }
    }

    #[test]
    fn test_closed_is_terminal() {
        for next in [Disconnected, Connecting, Ready, Closed] {
            assert!(!Closed.can_transition_to(next));
        }
    }

    #[test]
    fn test_predicates() {
        assert!(Ready.is_ready());
        assert!(!Bootstrapping.is_ready());
        assert!(Closed.is_closed());
    }
}
