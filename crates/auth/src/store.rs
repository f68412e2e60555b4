use gk_core::Epoch;
use gk_core::Uid;
use serde::Deserialize;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use tokio::sync::RwLock;

/// The only user attributes authentication depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFields {
    pub uid: Uid,
    pub banned: bool,
}

/// User store as seen by the authentication layer.
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// `Ok(None)` when no such user exists.
    async fn fields(&self, uid: Uid) -> anyhow::Result<Option<UserFields>>;
    /// Best-effort "last seen" bookkeeping.
    async fn touch(&self, uid: Uid) -> anyhow::Result<()>;
}

/// In-process user table.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uid, UserFields>>,
    seen: RwLock<HashMap<Uid, Epoch>>,
    lookups: AtomicUsize,
}

impl MemoryStore {
    pub async fn insert(&self, uid: Uid) {
        self.users
            .write()
            .await
            .insert(uid, UserFields { uid, banned: false });
    }
    pub async fn ban(&self, uid: Uid) {
        self.users
            .write()
            .await
            .insert(uid, UserFields { uid, banned: true });
    }
    pub async fn remove(&self, uid: Uid) {
        self.users.write().await.remove(&uid);
    }
    pub async fn last_seen(&self, uid: Uid) -> Option<Epoch> {
        self.seen.read().await.get(&uid).copied()
    }
    /// Number of `fields` calls served so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }
}

#[async_trait::async_trait]
impl UserStore for MemoryStore {
    async fn fields(&self, uid: Uid) -> anyhow::Result<Option<UserFields>> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        Ok(self.users.read().await.get(&uid).copied())
    }
    async fn touch(&self, uid: Uid) -> anyhow::Result<()> {
        if !self.users.read().await.contains_key(&uid) {
            anyhow::bail!("user {} not found", uid);
        }
        self.seen.write().await.insert(uid, gk_core::now());
        Ok(())
    }
}
