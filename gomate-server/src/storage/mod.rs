//! Local persistence.
//!
//! State that lives on the device rather than upstream (favorites,
//! bookings, locally registered users) is kept as JSON blobs in a
//! [`KeyValueStore`].

mod error;
mod lists;
mod store;

pub use error::StorageError;
pub use lists::{
    BOOKINGS_KEY, Bookings, FAVORITES_KEY, Favorites, JsonList, LOCAL_USERS_KEY, LocalUsers,
};
pub use store::{FileStore, KeyValueStore, MemoryStore};
