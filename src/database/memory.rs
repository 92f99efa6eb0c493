use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::user_store::UserStore;
use crate::auth::Role;
use crate::error::{ApiError, Result};
use crate::models::{Address, Avatar, NewUser, ProfileChanges, User};

#[derive(Debug, Clone)]
struct StoredUser {
    user: User,
    password_hash: String,
}

/// Process-local user store, selected with `DATABASE_URL=memory://`.
/// Enforces the same unique-email rule as the Postgres index.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<Uuid, StoredUser>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Promote or demote an account. No route changes roles, so local
    /// setups and tests go through here.
    pub async fn set_role(&self, id: Uuid, role: Role) -> Result<User> {
        let mut users = self.users.write().await;
        let stored = users.get_mut(&id).ok_or_else(|| ApiError::not_found("User"))?;
        stored.user.role = role;
        Ok(stored.user.clone())
    }
}

fn email_taken(users: &HashMap<Uuid, StoredUser>, email: &str, except: Option<Uuid>) -> bool {
    users
        .values()
        .any(|stored| stored.user.email == email && Some(stored.user.id) != except)
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&id).map(|s| s.user.clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|s| s.user.email == email)
            .map(|s| s.user.clone()))
    }

    async fn password_hash(&self, id: Uuid) -> Result<Option<String>> {
        Ok(self
            .users
            .read()
            .await
            .get(&id)
            .map(|s| s.password_hash.clone()))
    }

    async fn create(&self, new_user: NewUser) -> Result<User> {
        let mut users = self.users.write().await;
        if email_taken(&users, &new_user.email, None) {
            return Err(ApiError::already_exists("User"));
        }

        let user = User::from_new(&new_user);
        users.insert(
            user.id,
            StoredUser {
                user: user.clone(),
                password_hash: new_user.password_hash,
            },
        );
        Ok(user)
    }

    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> Result<User> {
        let mut users = self.users.write().await;
        if let Some(email) = &changes.email {
            if email_taken(&users, email, Some(id)) {
                return Err(ApiError::already_exists("User"));
            }
        }

        let stored = users.get_mut(&id).ok_or_else(|| ApiError::not_found("User"))?;
        stored.user.apply_profile(changes);
        Ok(stored.user.clone())
    }

    async fn update_avatar(&self, id: Uuid, avatar: &Avatar) -> Result<User> {
        let mut users = self.users.write().await;
        let stored = users.get_mut(&id).ok_or_else(|| ApiError::not_found("User"))?;
        stored.user.avatar = avatar.clone();
        Ok(stored.user.clone())
    }

    async fn upsert_address(&self, user_id: Uuid, address: &Address) -> Result<Option<User>> {
        let mut users = self.users.write().await;
        Ok(users.get_mut(&user_id).map(|stored| {
            stored.user.upsert_address(address.clone());
            stored.user.clone()
        }))
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<()> {
        let mut users = self.users.write().await;
        let stored = users.get_mut(&id).ok_or_else(|| ApiError::not_found("User"))?;
        stored.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn pull_address(&self, user_id: Uuid, address_id: &str) -> Result<Option<User>> {
        let mut users = self.users.write().await;
        Ok(users.get_mut(&user_id).map(|stored| {
            stored.user.remove_address(address_id);
            stored.user.clone()
        }))
    }

    async fn list_newest_first(&self) -> Result<Vec<User>> {
        let mut all: Vec<User> = self
            .users
            .read()
            .await
            .values()
            .map(|s| s.user.clone())
            .collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.users.write().await.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Test".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            avatar: Avatar::default(),
        }
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_email() {
        let store = InMemoryUserStore::new();
        store.create(new_user("a@x.com")).await.unwrap();

        let err = store.create(new_user("a@x.com")).await.unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::AlreadyExists);
    }

    #[tokio::test]
    async fn test_update_profile_rejects_email_owned_by_another_user() {
        let store = InMemoryUserStore::new();
        store.create(new_user("a@x.com")).await.unwrap();
        let b = store.create(new_user("b@x.com")).await.unwrap();

        let taken = ProfileChanges {
            email: Some("a@x.com".to_string()),
            ..Default::default()
        };
        let err = store.update_profile(b.id, taken).await.unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::AlreadyExists);

        // Keeping its own email is fine
        let rename = ProfileChanges {
            name: Some("Renamed".to_string()),
            email: Some("b@x.com".to_string()),
            phone_number: None,
        };
        let updated = store.update_profile(b.id, rename).await.unwrap();
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.email, "b@x.com");
    }

    #[tokio::test]
    async fn test_profile_and_avatar_writes_keep_addresses() {
        let store = InMemoryUserStore::new();
        let user = store.create(new_user("a@x.com")).await.unwrap();
        let mut home = Address {
            city: Some("Lisbon".to_string()),
            ..Default::default()
        };
        home.ensure_id();
        store.upsert_address(user.id, &home).await.unwrap();

        // A stale copy loaded before the address was removed
        let stale = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stale.addresses.len(), 1);
        store.pull_address(user.id, &home.id).await.unwrap();

        let changes = ProfileChanges {
            name: Some(format!("{} Jr", stale.name)),
            ..Default::default()
        };
        let updated = store.update_profile(user.id, changes).await.unwrap();
        assert_eq!(updated.name, "Test Jr");
        assert!(updated.addresses.is_empty());

        let avatar = Avatar {
            public_id: "avatars/1".to_string(),
            url: "https://img.test/1.png".to_string(),
        };
        let updated = store.update_avatar(user.id, &avatar).await.unwrap();
        assert_eq!(updated.avatar, avatar);
        assert!(updated.addresses.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_address_merges_by_id() {
        let store = InMemoryUserStore::new();
        let user = store.create(new_user("a@x.com")).await.unwrap();
        let home = Address {
            id: "home".to_string(),
            city: Some("Lisbon".to_string()),
            zip_code: Some("1000".to_string()),
            ..Default::default()
        };
        store.upsert_address(user.id, &home).await.unwrap();

        let patch = Address {
            id: "home".to_string(),
            city: Some("Porto".to_string()),
            ..Default::default()
        };
        let updated = store.upsert_address(user.id, &patch).await.unwrap().unwrap();
        assert_eq!(updated.addresses.len(), 1);
        assert_eq!(updated.addresses[0].city.as_deref(), Some("Porto"));
        assert_eq!(updated.addresses[0].zip_code.as_deref(), Some("1000"));

        assert!(store
            .upsert_address(Uuid::new_v4(), &patch)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_set_role() {
        let store = InMemoryUserStore::new();
        let user = store.create(new_user("a@x.com")).await.unwrap();

        let promoted = store.set_role(user.id, Role::Admin).await.unwrap();
        assert_eq!(promoted.role, Role::Admin);
        assert!(store.set_role(Uuid::new_v4(), Role::Admin).await.is_err());
    }

    #[tokio::test]
    async fn test_password_hash_is_kept_separately() {
        let store = InMemoryUserStore::new();
        let user = store.create(new_user("a@x.com")).await.unwrap();

        assert_eq!(store.password_hash(user.id).await.unwrap().as_deref(), Some("hash"));
        store.update_password(user.id, "new-hash").await.unwrap();
        assert_eq!(
            store.password_hash(user.id).await.unwrap().as_deref(),
            Some("new-hash")
        );
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let store = InMemoryUserStore::new();
        let first = store.create(new_user("a@x.com")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = store.create(new_user("b@x.com")).await.unwrap();

        let listed = store.list_newest_first().await.unwrap();
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
    }

    #[tokio::test]
    async fn test_delete_reports_whether_removed() {
        let store = InMemoryUserStore::new();
        let user = store.create(new_user("a@x.com")).await.unwrap();

        assert!(store.delete(user.id).await.unwrap());
        assert!(!store.delete(user.id).await.unwrap());
        assert!(store.find_by_id(user.id).await.unwrap().is_none());
    }
}
