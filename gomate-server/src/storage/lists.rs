//! Persisted lists: favorites, bookings and locally registered users.
//!
//! Each list is one JSON array blob, read and written wholesale.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::warn;

use super::error::StorageError;
use super::store::KeyValueStore;
use crate::auth::LocalUser;
use crate::booking::Booking;
use crate::transport::TransportItem;

pub const FAVORITES_KEY: &str = "@favorites";
pub const BOOKINGS_KEY: &str = "@bookings";
pub const LOCAL_USERS_KEY: &str = "@local_users";

/// A JSON array of `T` stored under one key.
///
/// Mutations hold a per-list lock across the whole read-modify-write.
pub struct JsonList<T> {
    store: Arc<dyn KeyValueStore>,
    key: &'static str,
    write_lock: Mutex<()>,
    _item: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> JsonList<T> {
    pub fn new(store: Arc<dyn KeyValueStore>, key: &'static str) -> Self {
        Self {
            store,
            key,
            write_lock: Mutex::new(()),
            _item: PhantomData,
        }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Read the list, or an error if the blob is unreadable or corrupt.
    pub fn try_load(&self) -> Result<Vec<T>, StorageError> {
        match self.store.get(self.key)? {
            Some(blob) => Ok(serde_json::from_str(&blob)?),
            None => Ok(Vec::new()),
        }
    }

    /// Read the list. A missing, unreadable or corrupt blob is empty.
    pub fn load(&self) -> Vec<T> {
        self.try_load().unwrap_or_else(|e| {
            warn!(key = self.key, error = %e, "discarding unreadable list");
            Vec::new()
        })
    }

    /// Replace the whole list.
    pub async fn save(&self, items: &[T]) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        self.write(items)
    }

    /// Apply `f` to the stored list and write the result back.
    ///
    /// An unreadable or corrupt blob is an error and is left untouched.
    pub async fn update<R>(&self, f: impl FnOnce(&mut Vec<T>) -> R) -> Result<(Vec<T>, R), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut items = self.try_load()?;
        let result = f(&mut items);
        self.write(&items)?;
        Ok((items, result))
    }

    fn write(&self, items: &[T]) -> Result<(), StorageError> {
        let blob = serde_json::to_string(items)?;
        self.store.set(self.key, &blob)
    }
}

/// Favorite transport items, in the order they were added.
pub struct Favorites {
    list: JsonList<TransportItem>,
}

impl Favorites {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            list: JsonList::new(store, FAVORITES_KEY),
        }
    }

    pub fn load(&self) -> Vec<TransportItem> {
        self.list.load()
    }

    pub async fn save(&self, items: &[TransportItem]) -> Result<(), StorageError> {
        self.list.save(items).await
    }

    /// Append an item unless one with the same id is already a favorite.
    ///
    /// Returns the updated list.
    pub async fn add(&self, item: TransportItem) -> Result<Vec<TransportItem>, StorageError> {
        let (items, ()) = self
            .list
            .update(|items| {
                if !items.iter().any(|existing| existing.id == item.id) {
                    items.push(item);
                }
            })
            .await?;
        Ok(items)
    }

    /// Remove the item with `id`, if present. Returns the updated list.
    pub async fn remove(&self, id: &str) -> Result<Vec<TransportItem>, StorageError> {
        let (items, ()) = self.list.update(|items| items.retain(|item| item.id != id)).await?;
        Ok(items)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.load().iter().any(|item| item.id == id)
    }
}

/// Bookings, newest first.
pub struct Bookings {
    list: JsonList<Booking>,
}

impl Bookings {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            list: JsonList::new(store, BOOKINGS_KEY),
        }
    }

    pub fn load(&self) -> Vec<Booking> {
        self.list.load()
    }

    pub async fn prepend(&self, booking: Booking) -> Result<(), StorageError> {
        self.list.update(|items| items.insert(0, booking)).await?;
        Ok(())
    }
}

/// Users registered on this device.
pub struct LocalUsers {
    list: JsonList<LocalUser>,
}

impl LocalUsers {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            list: JsonList::new(store, LOCAL_USERS_KEY),
        }
    }

    pub fn load(&self) -> Vec<LocalUser> {
        self.list.load()
    }

    pub fn find(&self, username: &str) -> Option<LocalUser> {
        self.load().into_iter().find(|user| user.username == username)
    }

    /// Store `user` unless the username is taken.
    ///
    /// Returns whether the user was inserted.
    pub async fn insert_if_absent(&self, user: LocalUser) -> Result<bool, StorageError> {
        let (_, inserted) = self
            .list
            .update(|users| {
                if users.iter().any(|existing| existing.username == user.username) {
                    false
                } else {
                    users.push(user);
                    true
                }
            })
            .await?;
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStore, MemoryStore};
    use crate::transport::{mock_items, normalize_item};
    use serde_json::json;
    use tempfile::tempdir;

    fn items(n: usize) -> Vec<TransportItem> {
        (0..n)
            .map(|i| {
                normalize_item(
                    &json!({
                        "atcocode": format!("4900{i:04}"),
                        "name": format!("Stop {i}"),
                        "latitude": 51.0 + i as f64 / 8.0,
                        "longitude": -0.1,
                    }),
                    i,
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn favorites_round_trip() {
        for n in [0, 1, 50] {
            let dir = tempdir().unwrap();
            let favorites = Favorites::new(Arc::new(FileStore::new(dir.path())));
            let original = items(n);

            favorites.save(&original).await.unwrap();

            let reloaded = Favorites::new(Arc::new(FileStore::new(dir.path())));
            assert_eq!(reloaded.load(), original, "n = {n}");
        }
    }

    #[tokio::test]
    async fn add_skips_duplicate_ids() {
        let favorites = Favorites::new(Arc::new(MemoryStore::new()));
        let mock = mock_items();

        favorites.add(mock[0].clone()).await.unwrap();
        favorites.add(mock[1].clone()).await.unwrap();
        let list = favorites.add(mock[0].clone()).await.unwrap();

        let ids: Vec<&str> = list.iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, ["101", "102"]);
        assert!(favorites.contains("102"));
    }

    #[tokio::test]
    async fn remove_drops_only_that_id() {
        let favorites = Favorites::new(Arc::new(MemoryStore::new()));
        favorites.save(&mock_items()).await.unwrap();

        let list = favorites.remove("102").await.unwrap();
        let ids: Vec<&str> = list.iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, ["101", "103"]);

        let list = favorites.remove("missing").await.unwrap();
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn corrupt_blob_loads_as_empty() {
        let store = Arc::new(MemoryStore::new());
        store.set(FAVORITES_KEY, "{not json").unwrap();

        let favorites = Favorites::new(store.clone());
        assert!(favorites.load().is_empty());
        assert!(favorites.list.try_load().is_err());
    }

    #[tokio::test]
    async fn corrupt_blob_is_not_overwritten() {
        let truncated = r#"[{"id":"101","title":"truncated"#;
        let store = Arc::new(MemoryStore::new());
        store.set(FAVORITES_KEY, truncated).unwrap();

        let favorites = Favorites::new(store.clone());
        assert!(favorites.add(items(3).remove(2)).await.is_err());
        assert!(favorites.remove("101").await.is_err());
        assert_eq!(store.get(FAVORITES_KEY).unwrap().as_deref(), Some(truncated));
    }

    #[tokio::test]
    async fn concurrent_adds_are_not_lost() {
        let favorites = Arc::new(Favorites::new(Arc::new(MemoryStore::new())));
        let handles: Vec<_> = items(20)
            .into_iter()
            .map(|item| {
                let favorites = favorites.clone();
                tokio::spawn(async move { favorites.add(item).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(favorites.load().len(), 20);
    }

    #[tokio::test]
    async fn local_users_insert_once() {
        let users = LocalUsers::new(Arc::new(MemoryStore::new()));
        let user = LocalUser::new("ana", "hash", "Ana", "Lopez");

        assert!(users.insert_if_absent(user.clone()).await.unwrap());
        assert!(!users.insert_if_absent(user).await.unwrap());
        assert_eq!(users.load().len(), 1);
        assert_eq!(users.find("ana").unwrap().first_name, "Ana");
        assert!(users.find("bob").is_none());
    }
}
