//! Web layer for the GoMate backend.
//!
//! A JSON API over the transport service, favorites, bookings and auth.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::{AppState, StartupError};
