//! Connection / session state.
//!
//! One [`Session`] lives for as long as the application is mounted. Socket
//! events mutate it; every change is published on a watch channel so any
//! number of readers see the latest state. Last event wins.

use serde::Serialize;
use tokio::sync::watch;
use tracing::info;

/// Event name the host wallet emits once its handshake succeeds.
pub const AUTH_SUCCESS_EVENT: &str = "nomo_authentication_success";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    Connect,
    Disconnect,
    AuthenticationSuccess,
    /// Any other named event, e.g. a loader reload trigger.
    Message(String),
}

impl SocketEvent {
    pub fn from_name(name: &str) -> Self {
        match name {
            "connect" => SocketEvent::Connect,
            "disconnect" => SocketEvent::Disconnect,
            AUTH_SUCCESS_EVENT => SocketEvent::AuthenticationSuccess,
            other => SocketEvent::Message(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub is_connected: bool,
    pub is_loading: bool,
    pub is_authenticated: bool,
}

/// What the shell should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    AuthPrompt,
    App,
}

pub struct Session {
    tx: watch::Sender<SessionState>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(SessionState::default());
        Self { tx }
    }

    pub fn state(&self) -> SessionState {
        *self.tx.borrow()
    }

    /// Register a listener. Dropping the receiver unregisters it.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    /// Apply one socket event. Returns `true` if the state changed.
    pub fn apply(&self, event: &SocketEvent) -> bool {
        self.tx.send_if_modified(|state| {
            let before = *state;
            match event {
                SocketEvent::Connect => state.is_connected = true,
                SocketEvent::Disconnect => state.is_connected = false,
                SocketEvent::AuthenticationSuccess => state.is_authenticated = true,
                SocketEvent::Message(_) => {}
            }
            let changed = *state != before;
            if changed {
                info!(?event, connected = state.is_connected,
                      authenticated = state.is_authenticated, "session changed");
            }
            changed
        })
    }

    /// Outside the host wallet (`fallback_mode`) the user has to
    /// authenticate before seeing the app, unless a connection already
    /// exists.
    pub fn gate(&self, fallback_mode: bool) -> Gate {
        let state = self.state();
        if fallback_mode && !state.is_connected && !state.is_authenticated {
            Gate::AuthPrompt
        } else {
            Gate::App
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_disconnected_and_not_loading() {
        let s = Session::new();
        assert_eq!(s.state(), SessionState::default());
        assert!(!s.state().is_loading);
    }

    #[test]
    fn last_event_wins() {
        let s = Session::new();
        assert!(s.apply(&SocketEvent::Connect));
        assert!(!s.apply(&SocketEvent::Connect));
        assert!(s.apply(&SocketEvent::Disconnect));
        assert!(!s.state().is_connected);
        assert!(!s.apply(&SocketEvent::Message("npaidentity_changed".into())));
    }

    #[test]
    fn gate_follows_connection_and_auth() {
        let s = Session::new();
        assert_eq!(s.gate(true), Gate::AuthPrompt);
        assert_eq!(s.gate(false), Gate::App);
        s.apply(&SocketEvent::AuthenticationSuccess);
        assert_eq!(s.gate(true), Gate::App);

        let s = Session::new();
        s.apply(&SocketEvent::Connect);
        assert_eq!(s.gate(true), Gate::App);
    }

    #[test]
    fn event_names_map_to_variants() {
        assert_eq!(SocketEvent::from_name("connect"), SocketEvent::Connect);
        assert_eq!(
            SocketEvent::from_name(AUTH_SUCCESS_EVENT),
            SocketEvent::AuthenticationSuccess
        );
        assert_eq!(
            SocketEvent::from_name("npabeneficiary_changed"),
            SocketEvent::Message("npabeneficiary_changed".into())
        );
    }

    #[tokio::test]
    async fn subscribers_see_changes() {
        let s = Session::new();
        let mut rx = s.subscribe();
        s.apply(&SocketEvent::Connect);
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_connected);
    }
}
