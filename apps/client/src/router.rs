//! Route helpers and the navigation side channel.

use std::sync::Mutex;

use tracing::debug;

use crate::models::space::SpaceId;

pub const LOGIN_ROUTE: &str = "/login";

/// Read/write access to the current location. The core reads it to reconcile
/// the active space and writes it on every switch.
pub trait Navigator: Send + Sync {
    fn current_path(&self) -> String;
    fn navigate(&self, path: &str);
}

/// Root route of a space's dashboard.
pub fn space_root(id: SpaceId) -> String {
    format!("/space/{id}")
}

/// Extracts `{id}` from a `/space/{id}/...` path.
pub fn parse_space_id(path: &str) -> Option<SpaceId> {
    let path = strip_query(path);
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    match (segments.next(), segments.next()) {
        (Some("space"), Some(id)) => id.parse().ok(),
        _ => None,
    }
}

pub fn is_login_route(path: &str) -> bool {
    let path = strip_query(path).trim_end_matches('/');
    path == LOGIN_ROUTE || path.starts_with("/login/")
}

/// True when `path` is the root of space `id` or any route below it.
pub fn is_within_space(path: &str, id: SpaceId) -> bool {
    parse_space_id(path) == Some(id)
}

fn strip_query(path: &str) -> &str {
    path.split(['?', '#']).next().unwrap_or(path)
}

/// In-process navigator that records every navigation.
pub struct MemoryNavigator {
    history: Mutex<Vec<String>>,
}

impl MemoryNavigator {
    pub fn new(initial_path: &str) -> Self {
        Self {
            history: Mutex::new(vec![initial_path.to_string()]),
        }
    }

    /// Every path visited, starting with the initial one.
    pub fn history(&self) -> Vec<String> {
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Navigations performed since construction.
    pub fn navigation_count(&self) -> usize {
        self.history().len().saturating_sub(1)
    }
}

impl Navigator for MemoryNavigator {
    fn current_path(&self) -> String {
        self.history().last().cloned().unwrap_or_else(|| "/".to_string())
    }

    fn navigate(&self, path: &str) {
        debug!("Navigating to {path}");
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(path.to_string());
    }
}
