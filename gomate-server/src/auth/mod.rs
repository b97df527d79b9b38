//! User authentication.

mod client;
mod error;
mod service;

pub use client::{AuthClient, AuthClientConfig, DEFAULT_AUTH_BASE_URL, RegisterRequest, RemoteProfile};
pub use error::AuthError;
pub use service::{AuthService, LocalUser, Session, SessionSource};
