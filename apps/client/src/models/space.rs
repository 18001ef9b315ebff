use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Server-issued space id. Real ids are positive; negative ids are reserved
/// for client-synthesized spaces.
pub type SpaceId = i64;

/// Id of the single synthetic space installed in guest mode.
pub const GUEST_SPACE_ID: SpaceId = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpaceType {
    Personal,
    Team,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberRole {
    Owner,
    Admin,
    #[serde(other)]
    Member,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: i64,
    pub nickname: String,
    #[serde(default = "default_role")]
    pub role: MemberRole,
}

fn default_role() -> MemberRole {
    MemberRole::Member
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaceOwner {
    pub id: i64,
    pub nickname: String,
}

/// One collaboration workspace. Every dashboard resource is scoped to a space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Space {
    pub id: SpaceId,
    pub name: String,
    #[serde(rename = "type")]
    pub space_type: SpaceType,
    #[serde(default)]
    pub owner: Option<SpaceOwner>,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Space {
    pub fn is_guest(&self) -> bool {
        self.id == GUEST_SPACE_ID
    }

    pub fn has_member(&self, member_id: i64) -> bool {
        self.members.iter().any(|m| m.id == member_id)
    }
}

/// Body of the space-creation request.
#[derive(Debug, Clone, Serialize)]
pub struct CreateSpaceRequest {
    #[serde(rename = "type")]
    pub space_type: SpaceType,
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,
}

/// Body of the member-addition request.
#[derive(Debug, Clone, Serialize)]
pub struct AddMembersRequest {
    pub nicknames: Vec<String>,
}

/// Accepts RFC 3339 timestamps as well as zone-less ones, which are read as UTC.
fn lenient_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}
