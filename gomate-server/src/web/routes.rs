//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::auth::{AuthError, RegisterRequest, Session};
use crate::booking::{Booking, BookingError, BookingOptions};
use crate::storage::StorageError;
use crate::transport::{ItemDetail, ScheduleEntry, TransportItem, Upstream};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router<U: Upstream + 'static>(state: AppState<U>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/status", get(status::<U>))
        .route("/api/items", get(list_items::<U>))
        .route("/api/items/:id", get(get_item::<U>))
        .route("/api/items/:id/schedule", get(item_schedule::<U>))
        .route("/api/cache", delete(clear_cache::<U>))
        .route(
            "/api/favorites",
            get(list_favorites::<U>).post(add_favorite::<U>),
        )
        .route("/api/favorites/:id", delete(remove_favorite::<U>))
        .route(
            "/api/bookings",
            get(list_bookings::<U>).post(create_booking::<U>),
        )
        .route("/api/auth/login", post(login::<U>))
        .route("/api/auth/register", post(register::<U>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Credential, fallback and quota state.
async fn status<U: Upstream>(State(state): State<AppState<U>>) -> Json<StatusResponse> {
    let service = state.transport.service();
    Json(StatusResponse {
        credentials: service.has_credentials(),
        mock_fallback: service.mock_fallback(),
        quota_exceeded: service.quota_exceeded(),
        cached_details: state.transport.cache_entry_count(),
    })
}

/// Fetch the listing. Also refreshes the snapshot used for schedules.
async fn list_items<U: Upstream>(State(state): State<AppState<U>>) -> Json<Vec<TransportItem>> {
    let items = state.transport.fetch_list().await;
    Json(items.as_ref().clone())
}

async fn get_item<U: Upstream>(
    State(state): State<AppState<U>>,
    Path(id): Path<String>,
) -> Result<Json<ItemDetail>, AppError> {
    let detail = state
        .transport
        .get_detail(&id)
        .await
        .ok_or_else(|| AppError::NotFound {
            message: format!("No details available for {id}"),
        })?;
    Ok(Json(detail.as_ref().clone()))
}

/// Timetable for an item from the latest listing.
async fn item_schedule<U: Upstream>(
    State(state): State<AppState<U>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ScheduleEntry>>, AppError> {
    let schedule = state
        .transport
        .schedule_for(&id)
        .await
        .ok_or_else(|| AppError::NotFound {
            message: format!("{id} is not in the current listing"),
        })?;
    Ok(Json(schedule))
}

async fn clear_cache<U: Upstream>(State(state): State<AppState<U>>) -> StatusCode {
    state.transport.clear().await;
    StatusCode::NO_CONTENT
}

async fn list_favorites<U: Upstream>(State(state): State<AppState<U>>) -> Json<Vec<TransportItem>> {
    Json(state.favorites.load())
}

async fn add_favorite<U: Upstream>(
    State(state): State<AppState<U>>,
    Json(item): Json<TransportItem>,
) -> Result<Json<Vec<TransportItem>>, AppError> {
    if item.id.trim().is_empty() {
        return Err(AppError::BadRequest {
            message: "Favorite needs an item id".to_string(),
        });
    }
    Ok(Json(state.favorites.add(item).await?))
}

async fn remove_favorite<U: Upstream>(
    State(state): State<AppState<U>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<TransportItem>>, AppError> {
    Ok(Json(state.favorites.remove(&id).await?))
}

async fn list_bookings<U: Upstream>(State(state): State<AppState<U>>) -> Json<Vec<Booking>> {
    Json(state.bookings.list())
}

async fn create_booking<U: Upstream>(
    State(state): State<AppState<U>>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let options = BookingOptions { user: req.user };
    let booking = state.bookings.book(&req.item_id, options).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

async fn login<U: Upstream>(
    State(state): State<AppState<U>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Session>, AppError> {
    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::BadRequest {
            message: "Username and password are required".to_string(),
        });
    }
    Ok(Json(state.auth.login(&req.username, &req.password).await?))
}

async fn register<U: Upstream>(
    State(state): State<AppState<U>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Session>), AppError> {
    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::BadRequest {
            message: "Username and password are required".to_string(),
        });
    }
    let session = state.auth.register(&req).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    Unauthorized { message: String },
    NotFound { message: String },
    Internal { message: String },
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        AppError::Internal {
            message: e.to_string(),
        }
    }
}

impl From<BookingError> for AppError {
    fn from(e: BookingError) -> Self {
        match e {
            BookingError::InvalidItem => AppError::BadRequest {
                message: e.to_string(),
            },
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials(message) => AppError::Unauthorized { message },
            _ => AppError::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::Unauthorized { message } => (StatusCode::UNAUTHORIZED, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!(%status, %message, "request failed");
        } else {
            warn!(%status, %message, "request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::auth::{AuthClient, AuthClientConfig};
    use crate::booking::BookingConfig;
    use crate::cache::{CacheConfig, CachedTransportService};
    use crate::storage::MemoryStore;
    use crate::transport::testing::FakeUpstream;
    use crate::transport::{SystemClock, TransportApiConfig, TransportService};
    use axum::body::Body;
    use axum::http::{Method, Request};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app(upstream: FakeUpstream, config: TransportApiConfig) -> Router {
        let service = TransportService::new(Arc::new(upstream), SystemClock, &config);
        let transport = CachedTransportService::new(service, &CacheConfig::default());
        // Nothing listens on the discard port, so remote auth calls fail fast.
        let auth = AuthClient::new(
            &AuthClientConfig::new()
                .with_base_url("http://127.0.0.1:9")
                .with_timeout(2),
        )
        .unwrap();
        let state = AppState::new(
            transport,
            Arc::new(MemoryStore::new()),
            BookingConfig::new(Duration::ZERO),
            auth,
        );
        create_router(state)
    }

    fn mock_app() -> Router {
        app(FakeUpstream::new(), TransportApiConfig::new())
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, value)
    }

    #[tokio::test]
    async fn health_check() {
        let (status, body) = send(&mock_app(), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn status_reports_configuration() {
        let (status, body) = send(&mock_app(), Method::GET, "/api/status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["credentials"], false);
        assert_eq!(body["mockFallback"], true);
        assert_eq!(body["quotaExceeded"], false);
    }

    #[tokio::test]
    async fn items_without_credentials_are_mock() {
        let (status, body) = send(&mock_app(), Method::GET, "/api/items", None).await;
        assert_eq!(status, StatusCode::OK);
        let items = body.as_array().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0]["id"], "101");
        assert_eq!(items[0]["type"], "Bus");
    }

    #[tokio::test]
    async fn item_detail_and_not_found() {
        let (status, body) = send(&mock_app(), Method::GET, "/api/items/101", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "City Express Bus");
        assert!(body["schedule"].is_array());

        let live = app(
            FakeUpstream::new(),
            TransportApiConfig::new().with_credentials("id", "key"),
        );
        let (status, body) = send(&live, Method::GET, "/api/items/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("missing"));
    }

    #[tokio::test]
    async fn schedule_needs_a_listing() {
        let app = mock_app();

        let (status, _) = send(&app, Method::GET, "/api/items/101/schedule", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        send(&app, Method::GET, "/api/items", None).await;
        let (status, body) = send(&app, Method::GET, "/api/items/101/schedule", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn clear_cache_is_no_content() {
        let (status, _) = send(&mock_app(), Method::DELETE, "/api/cache", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn favorites_add_and_remove() {
        let app = mock_app();
        let (_, items) = send(&app, Method::GET, "/api/items", None).await;
        let item = items[1].clone();

        send(&app, Method::POST, "/api/favorites", Some(item.clone())).await;
        let (status, body) = send(&app, Method::POST, "/api/favorites", Some(item)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (_, body) = send(&app, Method::GET, "/api/favorites", None).await;
        assert_eq!(body[0]["id"], "102");

        let (status, body) = send(&app, Method::DELETE, "/api/favorites/102", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn bookings_are_created_and_listed() {
        let app = mock_app();

        let (status, booking) = send(
            &app,
            Method::POST,
            "/api/bookings",
            Some(json!({"itemId": "x123"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(booking["itemId"], "x123");
        assert_eq!(booking["status"], "confirmed");
        assert_eq!(booking["user"]["username"], "guest");

        let (_, list) = send(&app, Method::GET, "/api/bookings", None).await;
        assert_eq!(list, json!([booking]));

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/bookings",
            Some(json!({"itemId": " "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn registered_users_log_in_locally() {
        let app = mock_app();
        let user = json!({
            "firstName": "Ana",
            "lastName": "Lopez",
            "username": "ana",
            "password": "s3cret"
        });

        let (status, session) = send(&app, Method::POST, "/api/auth/register", Some(user)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(session["source"], "local");
        assert_eq!(session["firstName"], "Ana");

        let (status, session) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            Some(json!({"username": "ana", "password": "s3cret"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(session["username"], "ana");
        assert!(session["token"].as_str().unwrap().starts_with("local-"));
    }

    #[tokio::test]
    async fn blank_login_is_bad_request() {
        let (status, _) = send(
            &mock_app(),
            Method::POST,
            "/api/auth/login",
            Some(json!({"username": "", "password": ""})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn auth_rejection_is_unauthorized() {
        let response = AppError::from(AuthError::InvalidCredentials("Invalid credentials".into()))
            .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AppError::from(AuthError::Hash("bad".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
