//! # dadaba-api
//!
//! HTTP surface of the dadaba admin notification subsystem:
//! - Pull API over the caller's notifications
//! - Push channel over WebSocket (`/api/ws`) and SSE (`/api/notifications/stream`)
//! - The order transitions that trigger the fan-out
//! - Health check and OpenAPI document

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

pub use auth::AuthUser;
pub use config::{ApiConfig, RateLimitConfig};
pub use error::{ApiError, ErrorBody};
pub use state::AppState;

use handlers::{health, notifications, orders, push};

const REQUEST_BODY_LIMIT: usize = 64 * 1024;

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// OPENAPI
// =============================================================================

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Dadaba Notifications API",
        description = "Real-time administrator notifications for order activity"
    ),
    paths(
        health::health_check,
        notifications::list_notifications,
        notifications::unread_count,
        notifications::mark_read,
        notifications::mark_all_read,
        orders::create_order,
        orders::confirm_order,
        orders::get_order,
    ),
    components(schemas(
        dadaba_core::Notification,
        dadaba_core::NotificationType,
        dadaba_core::Order,
        dadaba_core::OrderItem,
        dadaba_core::OrderItemInput,
        dadaba_core::OrderStatus,
        notifications::UnreadCount,
        notifications::MarkAllReadResponse,
        orders::CreateOrderBody,
        health::HealthResponse,
        ErrorBody,
    )),
    tags(
        (name = "Notifications", description = "Per-user notification inbox"),
        (name = "Orders", description = "Order transitions that notify administrators"),
        (name = "System", description = "Health checks and system info")
    )
)]
pub struct ApiDoc;

// =============================================================================
// RATE LIMITING MIDDLEWARE
// =============================================================================

async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorBody>)> {
    if let Some(limiter) = &state.rate_limiter {
        if limiter.check().is_err() {
            tracing::warn!(subsystem = "api", "Rate limit exceeded");
            return Err((
                StatusCode::TOO_MANY_REQUESTS,
                Json(ErrorBody {
                    error: "Too many requests. Please wait before retrying.".to_string(),
                }),
            ));
        }
    }
    Ok(next.run(request).await)
}

// =============================================================================
// ROUTER
// =============================================================================

/// Build the application router.
pub fn router(state: AppState, config: &ApiConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(config.allowed_origins.clone()))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Pull API
        .route("/api/notifications", get(notifications::list_notifications))
        .route(
            "/api/notifications/unread-count",
            get(notifications::unread_count),
        )
        .route(
            "/api/notifications/read-all",
            patch(notifications::mark_all_read),
        )
        .route(
            "/api/notifications/:id/read",
            patch(notifications::mark_read).put(notifications::mark_read),
        )
        // Push channel
        .route("/api/notifications/stream", get(push::sse_stream))
        .route("/api/ws", get(push::ws_handler))
        // Orders
        .route("/api/orders", post(orders::create_order))
        .route("/api/orders/:id", get(orders::get_order))
        .route("/api/orders/:id/confirm", post(orders::confirm_order))
        // Middleware
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(REQUEST_BODY_LIMIT))
        .with_state(state)
}
