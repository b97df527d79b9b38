//! Application state for the web layer.

use std::sync::Arc;

use crate::auth::{AuthClient, AuthError, AuthService};
use crate::booking::{BookingConfig, BookingService};
use crate::cache::CachedTransportService;
use crate::config::AppConfig;
use crate::storage::{Bookings, Favorites, FileStore, KeyValueStore, LocalUsers};
use crate::transport::{HttpUpstream, TransportError, TransportService};

/// Errors building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Shared application state.
///
/// Contains all the services needed to handle requests.
pub struct AppState<U = HttpUpstream> {
    /// Transport data with the detail cache
    pub transport: Arc<CachedTransportService<U>>,

    /// Favorite items
    pub favorites: Arc<Favorites>,

    /// Booking stub and booking history
    pub bookings: Arc<BookingService>,

    /// Login and registration
    pub auth: Arc<AuthService>,
}

impl<U> Clone for AppState<U> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            favorites: self.favorites.clone(),
            bookings: self.bookings.clone(),
            auth: self.auth.clone(),
        }
    }
}

impl<U> AppState<U> {
    /// Create a new app state from its services.
    pub fn new(
        transport: CachedTransportService<U>,
        store: Arc<dyn KeyValueStore>,
        bookings: BookingConfig,
        auth: AuthClient,
    ) -> Self {
        let favorites = Favorites::new(store.clone());
        let booking_list = Arc::new(Bookings::new(store.clone()));
        let users = Arc::new(LocalUsers::new(store));

        Self {
            transport: Arc::new(transport),
            favorites: Arc::new(favorites),
            bookings: Arc::new(BookingService::new(bookings, booking_list)),
            auth: Arc::new(AuthService::new(auth, users)),
        }
    }
}

impl AppState<HttpUpstream> {
    /// Build the production state: HTTP clients and a file store.
    pub fn from_config(config: &AppConfig) -> Result<Self, StartupError> {
        let service = TransportService::from_config(&config.transport)?;
        let transport = CachedTransportService::new(service, &config.cache);
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(&config.data_dir));
        let auth = AuthClient::new(&config.auth)?;

        Ok(Self::new(transport, store, config.booking.clone(), auth))
    }
}
