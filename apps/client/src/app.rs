use std::sync::Arc;

use tracing::info;

use crate::api::{AuthApi, SpacesApi};
use crate::directory::{FetchOutcome, SpaceDirectory};
use crate::router::Navigator;
use crate::session::{SessionState, SessionStore};
use crate::storage::HintStore;
use crate::switcher::SpaceSwitcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartMode {
    /// Resolve the session against the backend.
    Session,
    /// Skip the backend and browse as a guest.
    Guest,
}

/// The services for one client process, constructed once at bootstrap and
/// shared with every consumer.
#[derive(Clone)]
pub struct App {
    pub session: Arc<SessionStore>,
    pub directory: Arc<SpaceDirectory>,
    pub switcher: SpaceSwitcher,
}

impl App {
    pub fn new<A>(api: Arc<A>, storage: Arc<dyn HintStore>, navigator: Arc<dyn Navigator>) -> Self
    where
        A: AuthApi + SpacesApi + 'static,
    {
        let session = Arc::new(SessionStore::new(api.clone(), storage.clone()));
        let directory = Arc::new(SpaceDirectory::new(
            api.clone(),
            session.clone(),
            storage,
            navigator,
        ));
        let switcher = SpaceSwitcher::new(api, session.clone(), directory.clone());
        Self {
            session,
            directory,
            switcher,
        }
    }

    /// Resolves the session, then loads the directory. The fetch branches on
    /// guest vs. real identity, so it never starts before the session settles.
    pub async fn start(&self, mode: StartMode) -> (SessionState, FetchOutcome) {
        let session = match mode {
            StartMode::Session => self.session.check_session().await,
            StartMode::Guest => self.session.enter_guest(),
        };
        let outcome = self.directory.fetch_spaces().await;
        info!("Startup finished: {outcome:?}");
        (session, outcome)
    }

    pub async fn login(&self) -> (SessionState, FetchOutcome) {
        let session = self.session.login().await;
        let outcome = self.directory.fetch_spaces().await;
        (session, outcome)
    }

    pub async fn logout(&self) {
        self.session.logout().await;
        self.directory.clear();
    }
}
