//! Guest mode: a single synthetic, never-persisted space.

use chrono::Utc;
use uuid::Uuid;

use crate::models::space::{Space, SpaceType, GUEST_SPACE_ID};
use crate::models::user::{Identity, UserId};

pub const GUEST_SPACE_NAME: &str = "Guest Space";

pub fn guest_space() -> Space {
    let now = Utc::now();
    Space {
        id: GUEST_SPACE_ID,
        name: GUEST_SPACE_NAME.to_string(),
        space_type: SpaceType::Personal,
        owner: None,
        members: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}

/// Principal used while browsing as a guest. The id is random per session and
/// never sent to the backend.
pub fn guest_identity() -> Identity {
    Identity {
        id: UserId::new(format!("guest-{}", Uuid::new_v4())),
        name: "Guest".to_string(),
        email: None,
        avatar_url: None,
    }
}
