//! Session storage collaborator
//!
//! Sessions and plans are stored by opaque id with last-write-wins
//! semantics. [`MemoryStore`] keeps them in process; [`FileStore`] persists
//! them through `sessionstore`.

use std::path::Path;

use dashmap::DashMap;
use eyre::Result;
use sessionstore::{Record, Store};
use tracing::debug;

use crate::domain::{ConversationSession, TravelPlan};

/// Create/read/update/delete for sessions and plans
pub trait SessionStore: Send + Sync {
    fn put_session(&self, session: &ConversationSession) -> Result<()>;
    fn get_session(&self, id: &str) -> Result<Option<ConversationSession>>;
    fn delete_session(&self, id: &str) -> Result<bool>;
    /// Every stored session, most recently updated first
    fn list_sessions(&self) -> Result<Vec<ConversationSession>>;

    fn put_plan(&self, plan: &TravelPlan) -> Result<()>;
    fn get_plan(&self, id: &str) -> Result<Option<TravelPlan>>;
    fn delete_plan(&self, id: &str) -> Result<bool>;
    /// Every stored plan, most recently compiled first
    fn list_plans(&self) -> Result<Vec<TravelPlan>>;
}

/// In-process store
#[derive(Default)]
pub struct MemoryStore {
    sessions: DashMap<String, ConversationSession>,
    plans: DashMap<String, TravelPlan>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<R: Record + Clone>(map: &DashMap<String, R>) -> Vec<R> {
    let mut records: Vec<R> = map.iter().map(|entry| entry.value().clone()).collect();
    records.sort_by_key(|r| std::cmp::Reverse(r.updated_at()));
    records
}

impl SessionStore for MemoryStore {
    fn put_session(&self, session: &ConversationSession) -> Result<()> {
        debug!(id = %session.id, "MemoryStore::put_session: called");
        self.sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    fn get_session(&self, id: &str) -> Result<Option<ConversationSession>> {
        Ok(self.sessions.get(id).map(|s| s.value().clone()))
    }

    fn delete_session(&self, id: &str) -> Result<bool> {
        Ok(self.sessions.remove(id).is_some())
    }

    fn list_sessions(&self) -> Result<Vec<ConversationSession>> {
        Ok(newest_first(&self.sessions))
    }

    fn put_plan(&self, plan: &TravelPlan) -> Result<()> {
        debug!(id = %plan.id, "MemoryStore::put_plan: called");
        self.plans.insert(plan.id.clone(), plan.clone());
        Ok(())
    }

    fn get_plan(&self, id: &str) -> Result<Option<TravelPlan>> {
        Ok(self.plans.get(id).map(|p| p.value().clone()))
    }

    fn delete_plan(&self, id: &str) -> Result<bool> {
        debug!(%id, "MemoryStore::delete_plan: called");
        Ok(self.plans.remove(id).is_some())
    }

    fn list_plans(&self) -> Result<Vec<TravelPlan>> {
        Ok(newest_first(&self.plans))
    }
}

/// Store backed by one JSON file per record
pub struct FileStore {
    store: Store,
}

impl FileStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        debug!(path = %path.as_ref().display(), "FileStore::open: called");
        Ok(Self {
            store: Store::open(path)?,
        })
    }

    pub fn base_path(&self) -> &Path {
        self.store.base_path()
    }
}

impl SessionStore for FileStore {
    fn put_session(&self, session: &ConversationSession) -> Result<()> {
        self.store.put(session)
    }

    fn get_session(&self, id: &str) -> Result<Option<ConversationSession>> {
        self.store.get(id)
    }

    fn delete_session(&self, id: &str) -> Result<bool> {
        self.store.delete::<ConversationSession>(id)
    }

    fn list_sessions(&self) -> Result<Vec<ConversationSession>> {
        self.store.list()
    }

    fn put_plan(&self, plan: &TravelPlan) -> Result<()> {
        self.store.put(plan)
    }

    fn get_plan(&self, id: &str) -> Result<Option<TravelPlan>> {
        self.store.get(id)
    }

    fn delete_plan(&self, id: &str) -> Result<bool> {
        debug!(%id, "FileStore::delete_plan: called");
        self.store.delete::<TravelPlan>(id)
    }

    fn list_plans(&self) -> Result<Vec<TravelPlan>> {
        self.store.list()
    }
}
