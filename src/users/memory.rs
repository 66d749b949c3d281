use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::users::repo::{StoreError, StoreResult, UserStore};
use crate::users::repo_types::{NewUser, User, UserChanges};

#[derive(Debug, Default)]
struct Inner {
    users: BTreeMap<i64, User>,
    last_id: i64,
}

/// `UserStore` kept in process memory. Ids come from a counter that only
/// moves forward, so deleted ids are not handed out again.
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn list(&self) -> StoreResult<Vec<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn create(&self, new: NewUser) -> StoreResult<User> {
        let mut inner = self.inner.write().await;

        if inner.users.values().any(|u| u.email == new.email) {
            return Err(StoreError::DuplicateEmail(new.email));
        }

        inner.last_id += 1;
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: inner.last_id,
            name: new.name,
            email: new.email,
            password: new.password_hash,
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(user.id, user.clone());

        tracing::debug!(user_id = user.id, "user stored in memory");
        Ok(user)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> StoreResult<User> {
        let mut inner = self.inner.write().await;

        if inner
            .users
            .values()
            .any(|u| u.id != id && u.email == changes.email)
        {
            return Err(StoreError::DuplicateEmail(changes.email));
        }

        let user = inner.users.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        user.name = changes.name;
        user.email = changes.email;
        user.updated_at = OffsetDateTime::now_utc();
        Ok(user.clone())
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner.users.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str, email: &str) -> NewUser {
        NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash: "hashed".to_string(),
        }
    }

    #[tokio::test]
    async fn create_and_find() {
        let store = InMemoryUserStore::new();
        let created = store.create(new_user("Ann", "ann@example.com")).await.unwrap();
        assert_eq!(created.id, 1);
        assert_eq!(created.created_at, created.updated_at);

        let by_id = store.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id, created);

        let by_email = store.find_by_email("ann@example.com").await.unwrap();
        assert_eq!(by_email.map(|u| u.id), Some(created.id));
    }

    #[tokio::test]
    async fn email_lookup_is_case_sensitive() {
        let store = InMemoryUserStore::new();
        store.create(new_user("Ann", "ann@example.com")).await.unwrap();

        assert!(store.find_by_email("ANN@example.com").await.unwrap().is_none());
        store
            .create(new_user("Other Ann", "ANN@example.com"))
            .await
            .expect("different case is a different email");
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = InMemoryUserStore::new();
        store.create(new_user("Ann", "ann@example.com")).await.unwrap();

        let err = store.create(new_user("Bob", "ann@example.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail(e) if e == "ann@example.com"));
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_allows_own_email_but_not_anothers() {
        let store = InMemoryUserStore::new();
        let ann = store.create(new_user("Ann", "ann@example.com")).await.unwrap();
        store.create(new_user("Bob", "bob@example.com")).await.unwrap();

        let renamed = store
            .update(
                ann.id,
                UserChanges {
                    name: "Annie".into(),
                    email: "ann@example.com".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "Annie");
        assert_eq!(renamed.password, ann.password);
        assert!(renamed.updated_at >= ann.updated_at);

        let err = store
            .update(
                ann.id,
                UserChanges {
                    name: "Annie".into(),
                    email: "bob@example.com".into(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail(_)));
    }

    #[tokio::test]
    async fn update_missing_user_is_not_found() {
        let store = InMemoryUserStore::new();
        let err = store
            .update(
                42,
                UserChanges {
                    name: "Nobody".into(),
                    email: "nobody@example.com".into(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(42)));
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let store = InMemoryUserStore::new();
        let first = store.create(new_user("Ann", "ann@example.com")).await.unwrap();
        assert!(store.delete(first.id).await.unwrap());
        assert!(!store.delete(first.id).await.unwrap());

        let second = store.create(new_user("Ann", "ann@example.com")).await.unwrap();
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn list_is_ordered_by_id() {
        let store = InMemoryUserStore::new();
        for (name, email) in [("C", "c@example.com"), ("A", "a@example.com"), ("B", "b@example.com")] {
            store.create(new_user(name, email)).await.unwrap();
        }
        let ids: Vec<i64> = store.list().await.unwrap().into_iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
