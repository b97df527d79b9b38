//! Login and registration.
//!
//! Users registered through this server are stored locally and can log in
//! without the auth API; everyone else is checked remotely.

use std::sync::Arc;

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::client::{AuthClient, RegisterRequest, RemoteProfile};
use super::error::AuthError;
use crate::storage::LocalUsers;

/// A user registered on this server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalUser {
    pub username: String,
    /// Argon2id PHC string.
    pub password_hash: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl LocalUser {
    pub fn new(
        username: impl Into<String>,
        password_hash: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password_hash: password_hash.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }
}

/// Where a session was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionSource {
    Local,
    Remote,
}

/// A logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// `local-{millis}` for local sessions; the API's token otherwise.
    pub token: Option<String>,
    pub source: SessionSource,
}

impl Session {
    fn local(username: &str, first_name: &str, last_name: &str) -> Self {
        Self {
            username: username.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            token: Some(format!("local-{}", Utc::now().timestamp_millis())),
            source: SessionSource::Local,
        }
    }

    fn remote(profile: RemoteProfile) -> Self {
        Self {
            username: profile.username,
            first_name: profile.first_name,
            last_name: profile.last_name,
            token: profile.token,
            source: SessionSource::Remote,
        }
    }
}

/// Run CPU-heavy hashing on the blocking pool.
async fn off_runtime<T: Send + 'static>(
    f: impl FnOnce() -> Result<T, AuthError> + Send + 'static,
) -> Result<T, AuthError> {
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AuthError::Hash(e.to_string()))?
}

async fn hash_password(password: &str) -> Result<String, AuthError> {
    let password = password.to_owned();
    off_runtime(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Hash(e.to_string()))
    })
    .await
}

async fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let password = password.to_owned();
    let hash = hash.to_owned();
    off_runtime(move || {
        let parsed = PasswordHash::new(&hash).map_err(|e| AuthError::Hash(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
}

/// Keep the fields of `later` that are set, falling back to `earlier`.
fn merge_profiles(earlier: RemoteProfile, later: RemoteProfile) -> RemoteProfile {
    let pick = |a: String, b: String| if a.is_empty() { b } else { a };
    RemoteProfile {
        id: later.id.or(earlier.id),
        username: pick(later.username, earlier.username),
        first_name: pick(later.first_name, earlier.first_name),
        last_name: pick(later.last_name, earlier.last_name),
        email: later.email.or(earlier.email),
        token: later.token.or(earlier.token),
    }
}

/// Login and registration against local users and the auth API.
pub struct AuthService {
    client: AuthClient,
    users: Arc<LocalUsers>,
}

impl AuthService {
    pub fn new(client: AuthClient, users: Arc<LocalUsers>) -> Self {
        Self { client, users }
    }

    /// Log in. Local users are checked first; a local user with a wrong
    /// password still gets a chance against the auth API.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        if let Some(user) = self.users.find(username) {
            match verify_password(password, &user.password_hash).await {
                Ok(true) => {
                    info!(username, "local login");
                    return Ok(Session::local(&user.username, &user.first_name, &user.last_name));
                }
                Ok(false) => debug!(username, "local password mismatch"),
                Err(e) => warn!(username, error = %e, "unreadable local password hash"),
            }
        }

        let profile = self.client.login(username, password).await?;
        info!(username, "remote login");
        Ok(Session::remote(profile))
    }

    /// Register a user.
    ///
    /// The user is stored locally first, so they can log in even when the
    /// auth API refuses them. Remote registration and auto-login are tried
    /// next; if either fails the caller still gets a local session.
    pub async fn register(&self, request: &RegisterRequest) -> Result<Session, AuthError> {
        let user = LocalUser::new(
            request.username.as_str(),
            hash_password(&request.password).await?,
            request.first_name.as_str(),
            request.last_name.as_str(),
        );
        match self.users.insert_if_absent(user).await {
            Ok(true) => info!(username = %request.username, "stored local user"),
            Ok(false) => debug!(username = %request.username, "local user already exists"),
            Err(e) => warn!(username = %request.username, error = %e, "failed to store local user"),
        }

        let local =
            || Session::local(&request.username, &request.first_name, &request.last_name);

        let registered = match self.client.register(request).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!(username = %request.username, error = %e, "remote registration failed");
                return Ok(local());
            }
        };

        match self.client.login(&request.username, &request.password).await {
            Ok(profile) => Ok(Session::remote(merge_profiles(registered, profile))),
            Err(e) => {
                debug!(username = %request.username, error = %e, "remote login after registration failed");
                Ok(local())
            }
        }
    }
}
