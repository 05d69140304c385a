/// In-memory storage
///
/// Implements both [`UserDirectory`] and [`AppRegistry`] over maps guarded by
/// async read/write locks. User IDs are assigned sequentially starting at 1.
/// Nothing survives a restart; this is meant for tests, demos and local
/// experiments.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{AppRegistry, StorageError, StorageResult, UserDirectory};
use crate::models::{App, User};

#[derive(Debug, Default)]
struct Users {
    by_id: HashMap<i64, User>,
    id_by_email: HashMap<String, i64>,
    admins: HashMap<i64, bool>,
    next_id: i64,
}

/// In-process user directory and application registry
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<Users>,
    apps: RwLock<HashMap<i32, App>>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with applications
    pub fn with_apps(apps: impl IntoIterator<Item = App>) -> Self {
        let apps = apps.into_iter().map(|app| (app.id, app)).collect();
        Self {
            users: RwLock::default(),
            apps: RwLock::new(apps),
        }
    }

    /// Registers or replaces an application
    pub async fn insert_app(&self, app: App) {
        self.apps.write().await.insert(app.id, app);
    }

    /// Sets the admin flag of an existing user
    pub async fn set_admin(&self, user_id: i64, is_admin: bool) -> StorageResult<()> {
        let mut users = self.users.write().await;
        if !users.by_id.contains_key(&user_id) {
            return Err(StorageError::UserNotFound);
        }
        users.admins.insert(user_id, is_admin);
        Ok(())
    }

    /// Number of registered users
    pub async fn user_count(&self) -> usize {
        self.users.read().await.by_id.len()
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn save_user(&self, email: &str, pass_hash: Vec<u8>) -> StorageResult<i64> {
        let mut users = self.users.write().await;
        if users.id_by_email.contains_key(email) {
            return Err(StorageError::UserExists);
        }

        users.next_id += 1;
        let id = users.next_id;
        users.id_by_email.insert(email.to_string(), id);
        users.by_id.insert(id, User::new(id, email, pass_hash));
        users.admins.insert(id, false);

        Ok(id)
    }

    async fn find_user_by_email(&self, email: &str) -> StorageResult<User> {
        let users = self.users.read().await;
        users
            .id_by_email
            .get(email)
            .and_then(|id| users.by_id.get(id))
            .cloned()
            .ok_or(StorageError::UserNotFound)
    }

    async fn is_admin(&self, user_id: i64) -> StorageResult<bool> {
        self.users
            .read()
            .await
            .admins
            .get(&user_id)
            .copied()
            .ok_or(StorageError::UserNotFound)
    }
}

#[async_trait]
impl AppRegistry for MemoryStore {
    async fn find_app(&self, app_id: i32) -> StorageResult<App> {
        self.apps
            .read()
            .await
            .get(&app_id)
            .cloned()
            .ok_or(StorageError::AppNotFound)
    }
}
