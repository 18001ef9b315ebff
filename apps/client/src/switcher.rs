//! Picker binding over the space directory.

use std::sync::Arc;

use tracing::{info, warn};

use crate::api::SpacesApi;
use crate::directory::SpaceDirectory;
use crate::errors::ClientError;
use crate::models::space::{AddMembersRequest, CreateSpaceRequest, Member, Space, SpaceId, SpaceType};
use crate::session::SessionStore;

/// What a space picker needs: the list, the selection, and the actions that
/// change them. Every change is routed through the directory.
#[derive(Clone)]
pub struct SpaceSwitcher {
    api: Arc<dyn SpacesApi>,
    session: Arc<SessionStore>,
    directory: Arc<SpaceDirectory>,
}

impl SpaceSwitcher {
    pub fn new(
        api: Arc<dyn SpacesApi>,
        session: Arc<SessionStore>,
        directory: Arc<SpaceDirectory>,
    ) -> Self {
        Self {
            api,
            session,
            directory,
        }
    }

    pub fn spaces(&self) -> Vec<Space> {
        self.directory.snapshot().spaces
    }

    pub fn current(&self) -> Option<Space> {
        self.directory.current_space()
    }

    /// Selects `id` from the picker. Re-selecting the active space is a no-op,
    /// so a real change costs exactly one navigation and one hint write.
    pub fn select(&self, id: SpaceId) -> bool {
        if self.directory.snapshot().current_id == Some(id) {
            return false;
        }
        self.directory.switch_space(id)
    }

    pub async fn create_team_space(
        &self,
        name: &str,
        nicknames: Vec<String>,
    ) -> Result<Space, ClientError> {
        self.create(SpaceType::Team, name, nicknames).await
    }

    pub async fn create_personal_space(&self, name: &str) -> Result<Space, ClientError> {
        self.create(SpaceType::Personal, name, Vec::new()).await
    }

    async fn create(
        &self,
        space_type: SpaceType,
        name: &str,
        nicknames: Vec<String>,
    ) -> Result<Space, ClientError> {
        self.ensure_not_guest()?;

        let req = CreateSpaceRequest {
            space_type,
            name: name.trim().to_string(),
            members: clean_nicknames(nicknames),
        };
        let space = self.api.create_space(&req).await?;
        info!("Created {:?} space {} ({})", space.space_type, space.id, space.name);

        self.directory.add_space(space.clone());
        Ok(space)
    }

    /// Invites members into the active space and mirrors the server's answer
    /// into the directory.
    pub async fn invite_members(&self, nicknames: Vec<String>) -> Result<Vec<Member>, ClientError> {
        self.ensure_not_guest()?;

        let space_id = self
            .directory
            .snapshot()
            .current_id
            .ok_or(ClientError::NoActiveSpace)?;

        let nicknames = clean_nicknames(nicknames);
        if nicknames.is_empty() {
            return Ok(Vec::new());
        }

        let added = self
            .api
            .add_members(space_id, &AddMembersRequest { nicknames })
            .await?;
        self.directory.add_members(added.clone());
        Ok(added)
    }

    fn ensure_not_guest(&self) -> Result<(), ClientError> {
        if self.session.snapshot().is_guest() {
            warn!("Rejected backend space action in guest mode");
            return Err(ClientError::GuestMode);
        }
        Ok(())
    }
}

/// Trims, drops blanks and removes repeats while keeping input order.
fn clean_nicknames(nicknames: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(nicknames.len());
    for nick in nicknames {
        let nick = nick.trim();
        if !nick.is_empty() && !cleaned.iter().any(|n| n == nick) {
            cleaned.push(nick.to_string());
        }
    }
    cleaned
}
