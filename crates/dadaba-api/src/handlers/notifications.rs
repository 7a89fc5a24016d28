//! Pull API over the caller's notifications.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use dadaba_core::defaults::NOTIFICATION_LIST_MAX_LIMIT;
use dadaba_core::Notification;

use crate::error::ErrorBody;
use crate::{ApiError, AppState, AuthUser};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListNotificationsQuery {
    /// Maximum number of rows (1..=500). All rows when omitted.
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UnreadCount {
    pub unread: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MarkAllReadResponse {
    pub updated: u64,
}

/// List the caller's notifications, newest first.
#[utoipa::path(get, path = "/api/notifications", tag = "Notifications",
    params(ListNotificationsQuery),
    responses(
        (status = 200, description = "Notifications, newest first", body = [Notification]),
        (status = 400, description = "Invalid limit", body = ErrorBody),
        (status = 401, description = "Missing or invalid credential", body = ErrorBody),
    ))]
pub async fn list_notifications(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Query(query): Query<ListNotificationsQuery>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    if let Some(limit) = query.limit {
        if !(1..=NOTIFICATION_LIST_MAX_LIMIT).contains(&limit) {
            return Err(ApiError::BadRequest(format!(
                "limit must be between 1 and {}",
                NOTIFICATION_LIST_MAX_LIMIT
            )));
        }
    }
    let rows = state
        .notifications
        .list_for_user(identity.user_id, query.limit)
        .await?;
    Ok(Json(rows))
}

#[utoipa::path(get, path = "/api/notifications/unread-count", tag = "Notifications",
    responses(
        (status = 200, description = "Unread notifications of the caller", body = UnreadCount),
        (status = 401, description = "Missing or invalid credential", body = ErrorBody),
    ))]
pub async fn unread_count(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<UnreadCount>, ApiError> {
    let unread = state.notifications.unread_count(identity.user_id).await?;
    Ok(Json(UnreadCount { unread }))
}

/// Mark one notification read. Only its recipient may do so.
#[utoipa::path(patch, path = "/api/notifications/{id}/read", tag = "Notifications",
    params(("id" = Uuid, Path, description = "Notification id")),
    responses(
        (status = 200, description = "The updated notification", body = Notification),
        (status = 401, description = "Missing or invalid credential", body = ErrorBody),
        (status = 403, description = "Caller is not the recipient", body = ErrorBody),
        (status = 404, description = "Unknown notification", body = ErrorBody),
    ))]
pub async fn mark_read(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Notification>, ApiError> {
    let notification = state.notifications.mark_read(id, identity.user_id).await?;
    Ok(Json(notification))
}

#[utoipa::path(patch, path = "/api/notifications/read-all", tag = "Notifications",
    responses(
        (status = 200, description = "Number of notifications marked read", body = MarkAllReadResponse),
        (status = 401, description = "Missing or invalid credential", body = ErrorBody),
    ))]
pub async fn mark_all_read(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<MarkAllReadResponse>, ApiError> {
    let updated = state.notifications.mark_all_read(identity.user_id).await?;
    Ok(Json(MarkAllReadResponse { updated }))
}
