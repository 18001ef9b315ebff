//! Backend collaborators consumed by the session store and space directory.
//!
//! Stores depend on these traits, never on `HttpApi` directly, so tests can
//! swap in in-process fakes.

use async_trait::async_trait;

use crate::errors::ClientError;
use crate::models::space::{AddMembersRequest, CreateSpaceRequest, Member, Space, SpaceId};
use crate::models::user::Identity;

pub mod http;

pub use http::HttpApi;

#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Credentialed "who am I". Any failure means "not logged in".
    async fn me(&self) -> Result<Identity, ClientError>;

    async fn logout(&self) -> Result<(), ClientError>;
}

#[async_trait]
pub trait SpacesApi: Send + Sync {
    /// All spaces visible to the current identity, in server order.
    async fn list_spaces(&self) -> Result<Vec<Space>, ClientError>;

    async fn create_space(&self, req: &CreateSpaceRequest) -> Result<Space, ClientError>;

    /// Returns the members the server actually added.
    async fn add_members(
        &self,
        space_id: SpaceId,
        req: &AddMembersRequest,
    ) -> Result<Vec<Member>, ClientError>;
}
