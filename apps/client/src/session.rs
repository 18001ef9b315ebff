//! Session store: resolves once per process whether a real identity exists.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::api::AuthApi;
use crate::guest::guest_identity;
use crate::models::user::Identity;
use crate::storage::{write_login_hint, HintStore};

/// Current principal. Authenticated and guest are separate variants, so at
/// most one of them can be active.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    /// Initial check has not settled yet; protected content must stay hidden.
    #[default]
    Pending,
    Anonymous,
    Authenticated(Identity),
    Guest(Identity),
}

impl SessionState {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, SessionState::Pending)
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, SessionState::Guest(_))
    }

    pub fn user(&self) -> Option<&Identity> {
        match self {
            SessionState::Authenticated(identity) | SessionState::Guest(identity) => Some(identity),
            SessionState::Pending | SessionState::Anonymous => None,
        }
    }
}

/// Owns the session state. `check_session`, `login`, `logout` and
/// `enter_guest` are the only mutators; consumers read via `snapshot` or
/// `subscribe`.
pub struct SessionStore {
    auth: Arc<dyn AuthApi>,
    storage: Arc<dyn HintStore>,
    state: watch::Sender<SessionState>,
}

impl SessionStore {
    pub fn new(auth: Arc<dyn AuthApi>, storage: Arc<dyn HintStore>) -> Self {
        let (state, _) = watch::channel(SessionState::Pending);
        Self {
            auth,
            storage,
            state,
        }
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Waits until the session has left `Pending` and returns the settled state.
    pub async fn wait_resolved(&self) -> SessionState {
        let mut rx = self.state.subscribe();
        // Bound to a local so the watch `Ref` is dropped before `rx`.
        let settled = match rx.wait_for(SessionState::is_resolved).await {
            Ok(state) => state.clone(),
            // The sender lives in `self`, so it cannot be dropped while we wait.
            Err(_) => self.snapshot(),
        };
        settled
    }

    /// Resolves the session against the "who am I" endpoint. Failure of any
    /// kind is an expected anonymous visitor, not an error.
    pub async fn check_session(&self) -> SessionState {
        let next = match self.auth.me().await {
            Ok(identity) => {
                info!("Session resolved for user {}", identity.id);
                SessionState::Authenticated(identity)
            }
            Err(e) => {
                debug!("No active session: {e}");
                SessionState::Anonymous
            }
        };
        self.state.send_replace(next.clone());
        next
    }

    /// Re-reads the identity after an external credential exchange and
    /// records the outcome as the login hint.
    pub async fn login(&self) -> SessionState {
        let next = self.check_session().await;
        write_login_hint(self.storage.as_ref(), next.is_logged_in());
        next
    }

    /// Always ends logged out, whatever the backend answers.
    pub async fn logout(&self) {
        if let Err(e) = self.auth.logout().await {
            debug!("Logout request failed, clearing local session anyway: {e}");
        }
        self.state.send_replace(SessionState::Anonymous);
        write_login_hint(self.storage.as_ref(), false);
        info!("Logged out");
    }

    /// Switches to guest mode, replacing any authenticated identity.
    pub fn enter_guest(&self) -> SessionState {
        let next = SessionState::Guest(guest_identity());
        self.state.send_replace(next.clone());
        info!("Entered guest mode");
        next
    }
}
