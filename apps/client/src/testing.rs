//! In-process fakes shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::Notify;

use crate::api::{AuthApi, SpacesApi};
use crate::errors::ClientError;
use crate::models::space::{
    AddMembersRequest, CreateSpaceRequest, Member, MemberRole, Space, SpaceId, SpaceType,
};
use crate::models::user::{Identity, UserId};
use crate::storage::{HintStore, MemoryHintStore};

pub fn space(id: SpaceId) -> Space {
    let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    Space {
        id,
        name: format!("Space {id}"),
        space_type: SpaceType::Personal,
        owner: None,
        members: Vec::new(),
        created_at: ts,
        updated_at: ts,
    }
}

pub fn member(id: i64, nickname: &str) -> Member {
    Member {
        id,
        nickname: nickname.to_string(),
        role: MemberRole::Member,
    }
}

pub fn identity() -> Identity {
    Identity {
        id: UserId::new("7"),
        name: "jdoe".to_string(),
        email: Some("jdoe@example.com".to_string()),
        avatar_url: None,
    }
}

/// Scriptable backend. `list_spaces` answers with `spaces`, or fails when
/// `list_fails` is set; `gate` can hold the listing until released.
pub struct FakeBackend {
    pub identity: Mutex<Option<Identity>>,
    pub spaces: Mutex<Vec<Space>>,
    pub list_fails: Mutex<bool>,
    pub list_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub gate: Option<Notify>,
    pub next_id: AtomicUsize,
}

impl FakeBackend {
    pub fn new(identity: Option<Identity>, spaces: Vec<Space>) -> Self {
        Self {
            identity: Mutex::new(identity),
            spaces: Mutex::new(spaces),
            list_fails: Mutex::new(false),
            list_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            gate: None,
            next_id: AtomicUsize::new(100),
        }
    }

    pub fn signed_in(ids: &[SpaceId]) -> Self {
        Self::new(Some(identity()), ids.iter().copied().map(space).collect())
    }

    pub fn failing() -> Self {
        let backend = Self::new(None, Vec::new());
        *backend.list_fails.lock().unwrap() = true;
        backend
    }

    pub fn gated(mut self) -> Self {
        self.gate = Some(Notify::new());
        self
    }

    pub fn set_list_fails(&self, fails: bool) {
        *self.list_fails.lock().unwrap() = fails;
    }
}

#[async_trait]
impl AuthApi for FakeBackend {
    async fn me(&self) -> Result<Identity, ClientError> {
        self.identity
            .lock()
            .unwrap()
            .clone()
            .ok_or(ClientError::Unauthorized)
    }

    async fn logout(&self) -> Result<(), ClientError> {
        Err(ClientError::Timeout)
    }
}

#[async_trait]
impl SpacesApi for FakeBackend {
    async fn list_spaces(&self) -> Result<Vec<Space>, ClientError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if *self.list_fails.lock().unwrap() {
            return Err(ClientError::Api {
                status: 500,
                message: "boom".to_string(),
            });
        }
        Ok(self.spaces.lock().unwrap().clone())
    }

    async fn create_space(&self, req: &CreateSpaceRequest) -> Result<Space, ClientError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as SpaceId;
        let mut created = space(id);
        created.name = req.name.clone();
        created.space_type = req.space_type;
        created.members = req
            .members
            .iter()
            .enumerate()
            .map(|(i, n)| member(1000 + i as i64, n))
            .collect();
        self.spaces.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn add_members(
        &self,
        _space_id: SpaceId,
        req: &AddMembersRequest,
    ) -> Result<Vec<Member>, ClientError> {
        Ok(req
            .nicknames
            .iter()
            .filter(|n| !n.is_empty())
            .enumerate()
            .map(|(i, n)| member(500 + i as i64, n))
            .collect())
    }
}

/// Memory store that counts writes.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryHintStore,
    pub writes: AtomicUsize,
}

impl CountingStore {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl HintStore for CountingStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), ClientError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.remove(key)
    }
}
