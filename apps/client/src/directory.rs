//! Space directory: the spaces visible to the current identity plus the
//! pointer to the active one.
//!
//! The active space is stored as an id and resolved by lookup, so there is
//! only one copy of each space to keep up to date.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::api::SpacesApi;
use crate::errors::ClientError;
use crate::guest::guest_space;
use crate::models::space::{Member, Space, SpaceId, GUEST_SPACE_ID};
use crate::router::{is_login_route, is_within_space, parse_space_id, space_root, Navigator};
use crate::session::{SessionState, SessionStore};
use crate::storage::{clear_space_hint, read_space_hint, write_space_hint, HintStore};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectoryState {
    pub spaces: Vec<Space>,
    pub current_id: Option<SpaceId>,
    pub is_loading: bool,
    pub error: bool,
}

impl DirectoryState {
    pub fn current_space(&self) -> Option<&Space> {
        let id = self.current_id?;
        self.spaces.iter().find(|s| s.id == id)
    }

    pub fn contains(&self, id: SpaceId) -> bool {
        self.spaces.iter().any(|s| s.id == id)
    }

    fn install_guest(&mut self) {
        let space = guest_space();
        self.current_id = Some(space.id);
        self.spaces = vec![space];
    }
}

/// Which rule picked the active space after a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectedVia {
    Hint,
    Url,
    First,
}

/// Branch taken by a directory fetch. Fetching never fails outward; the
/// outcome (and the published state) says what happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    SkippedLoginRoute,
    SkippedInFlight,
    SkippedUnresolved,
    Guest,
    Selected {
        id: SpaceId,
        via: SelectedVia,
        navigated: bool,
    },
    Empty,
    Failed,
    FailedToGuest,
    /// The directory was cleared or the session changed while the request
    /// was out; the response was discarded without touching any state.
    Stale,
}

/// Marks a fetch as in flight. Dropping it clears both the in-flight flag and
/// `is_loading`, including when the fetch future is cancelled mid-request.
struct FetchGuard<'a> {
    directory: &'a SpaceDirectory,
    epoch: u64,
}

impl<'a> FetchGuard<'a> {
    fn acquire(directory: &'a SpaceDirectory) -> Option<Self> {
        directory
            .fetching
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        directory.state.send_modify(|s| {
            s.is_loading = true;
            s.error = false;
        });
        Some(FetchGuard {
            directory,
            epoch: directory.epoch.load(Ordering::Acquire),
        })
    }
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        self.directory.state.send_modify(|s| s.is_loading = false);
        self.directory.fetching.store(false, Ordering::Release);
    }
}

pub struct SpaceDirectory {
    api: Arc<dyn SpacesApi>,
    session: Arc<SessionStore>,
    storage: Arc<dyn HintStore>,
    navigator: Arc<dyn Navigator>,
    state: watch::Sender<DirectoryState>,
    fetching: AtomicBool,
    /// Bumped by `clear`; a fetch that started under an older epoch is stale.
    epoch: AtomicU64,
}

impl SpaceDirectory {
    pub fn new(
        api: Arc<dyn SpacesApi>,
        session: Arc<SessionStore>,
        storage: Arc<dyn HintStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let (state, _) = watch::channel(DirectoryState::default());
        Self {
            api,
            session,
            storage,
            navigator,
            state,
            fetching: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> DirectoryState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DirectoryState> {
        self.state.subscribe()
    }

    pub fn current_space(&self) -> Option<Space> {
        self.state.borrow().current_space().cloned()
    }

    /// Loads the directory and picks the active space.
    ///
    /// Selection order: persisted hint, then the `/space/{id}` segment of the
    /// current path, then the first space returned.
    pub async fn fetch_spaces(&self) -> FetchOutcome {
        if is_login_route(&self.navigator.current_path()) {
            debug!("On login route, skipping space fetch");
            return FetchOutcome::SkippedLoginRoute;
        }

        let session = self.session.snapshot();
        if !session.is_resolved() {
            warn!("Space fetch requested before the session resolved, skipping");
            return FetchOutcome::SkippedUnresolved;
        }

        let Some(guard) = FetchGuard::acquire(self) else {
            debug!("Space fetch already in flight, skipping");
            return FetchOutcome::SkippedInFlight;
        };

        if session.is_guest() {
            self.state.send_modify(DirectoryState::install_guest);
            return FetchOutcome::Guest;
        }

        let result = self.api.list_spaces().await;

        if self.epoch.load(Ordering::Acquire) != guard.epoch {
            debug!("Directory cleared during space fetch, discarding response");
            return FetchOutcome::Stale;
        }

        let now = self.session.snapshot();
        match result {
            Err(e) => self.apply_failure(e, &session, &now),
            Ok(_) if now.is_guest() => {
                info!("Session switched to guest during space fetch, installing guest space");
                self.state.send_modify(DirectoryState::install_guest);
                FetchOutcome::Guest
            }
            Ok(_) if now != session => {
                debug!("Session changed during space fetch, discarding response");
                FetchOutcome::Stale
            }
            Ok(spaces) => self.apply_fetched(spaces),
        }
    }

    /// Retry affordance for the UI after a failed fetch.
    pub async fn retry(&self) -> FetchOutcome {
        self.fetch_spaces().await
    }

    fn apply_empty(&self) -> FetchOutcome {
        info!("No spaces for current identity");
        self.state.send_modify(|s| {
            s.spaces.clear();
            s.current_id = None;
        });
        clear_space_hint(self.storage.as_ref());
        FetchOutcome::Empty
    }

    fn apply_fetched(&self, mut spaces: Vec<Space>) -> FetchOutcome {
        dedup_by_id(&mut spaces);

        let path = self.navigator.current_path();
        let hint = read_space_hint(self.storage.as_ref());
        let Some((id, via)) = select_initial(&spaces, hint, &path) else {
            return self.apply_empty();
        };

        let navigated = match via {
            SelectedVia::Hint => {
                if is_within_space(&path, id) {
                    false
                } else {
                    self.navigator.navigate(&space_root(id));
                    true
                }
            }
            SelectedVia::Url => {
                write_space_hint(self.storage.as_ref(), id);
                false
            }
            SelectedVia::First => {
                write_space_hint(self.storage.as_ref(), id);
                self.navigator.navigate(&space_root(id));
                true
            }
        };

        info!(
            "Loaded {} spaces, active space {id} ({via:?})",
            spaces.len()
        );
        self.state.send_modify(|s| {
            s.spaces = spaces;
            s.current_id = Some(id);
        });

        FetchOutcome::Selected { id, via, navigated }
    }

    fn apply_failure(
        &self,
        e: ClientError,
        started: &SessionState,
        now: &SessionState,
    ) -> FetchOutcome {
        error!("Failed to fetch spaces: {e}");
        if now.is_guest() {
            self.state.send_modify(|s| {
                s.error = true;
                s.install_guest();
            });
            return FetchOutcome::FailedToGuest;
        }
        if now != started {
            debug!("Session changed during failed space fetch, leaving directory as is");
            return FetchOutcome::Stale;
        }
        self.state.send_modify(|s| {
            s.error = true;
            s.spaces.clear();
            s.current_id = None;
        });
        FetchOutcome::Failed
    }

    /// Makes `id` the active space, persists it as the hint and navigates to
    /// its root. Returns false when `id` is not in the directory.
    pub fn switch_space(&self, id: SpaceId) -> bool {
        let mut switched = false;
        self.state.send_if_modified(|s| {
            if !s.contains(id) {
                return false;
            }
            s.current_id = Some(id);
            switched = true;
            true
        });

        if !switched {
            warn!("Ignoring switch to space {id}: not in directory");
            return false;
        }

        if id != GUEST_SPACE_ID {
            write_space_hint(self.storage.as_ref(), id);
        }
        self.navigator.navigate(&space_root(id));
        info!("Switched to space {id}");
        true
    }

    /// Adds a space created elsewhere and makes it the active one.
    pub fn add_space(&self, space: Space) -> bool {
        let id = space.id;
        self.state.send_modify(|s| match s.spaces.iter_mut().find(|e| e.id == id) {
            Some(existing) => *existing = space,
            None => s.spaces.push(space),
        });
        self.switch_space(id)
    }

    /// Appends members to the active space, skipping ids already present.
    /// Returns how many were added; without an active space nothing changes.
    pub fn add_members(&self, members: Vec<Member>) -> usize {
        let mut added = 0;
        let mut had_current = true;
        self.state.send_if_modified(|s| {
            let Some(id) = s.current_id else {
                had_current = false;
                return false;
            };
            let Some(space) = s.spaces.iter_mut().find(|sp| sp.id == id) else {
                had_current = false;
                return false;
            };
            for member in members {
                if !space.has_member(member.id) {
                    space.members.push(member);
                    added += 1;
                }
            }
            added > 0
        });

        if !had_current {
            warn!("add_members called with no active space, ignoring");
        }
        added
    }

    /// Drops every space on logout. The persisted hint is kept, and a fetch
    /// still in flight will discard its response.
    pub fn clear(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.state.send_modify(|s| {
            s.spaces.clear();
            s.current_id = None;
            s.error = false;
        });
    }
}

/// Picks the active space. `None` only for an empty list.
pub fn select_initial(
    spaces: &[Space],
    hint: Option<SpaceId>,
    path: &str,
) -> Option<(SpaceId, SelectedVia)> {
    let present = |id: SpaceId| spaces.iter().any(|s| s.id == id);

    if let Some(id) = hint.filter(|id| present(*id)) {
        return Some((id, SelectedVia::Hint));
    }
    if let Some(id) = parse_space_id(path).filter(|id| present(*id)) {
        return Some((id, SelectedVia::Url));
    }
    spaces.first().map(|s| (s.id, SelectedVia::First))
}

fn dedup_by_id(spaces: &mut Vec<Space>) {
    let mut seen = std::collections::HashSet::new();
    spaces.retain(|s| seen.insert(s.id));
}
