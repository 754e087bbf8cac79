//! The message surface: post into a room (persist + fan out) and history
//! read-back from the durable log.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use courier_common::payload::MessagePayload;
use courier_common::{RoomId, UserId};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiErrorBody};
use crate::store::MessageRecord;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/message", get(list_messages).post(post_message))
}

// ---------------------------------------------------------------------------
// POST /api/v1/message
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessagePostRequest {
    pub room_id: String,
    pub message: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/message",
    tag = "Messages",
    security(("bearer" = [])),
    request_body = MessagePostRequest,
    responses(
        (status = 201, description = "Message persisted; body is the canonical encoded payload"),
        (status = 400, description = "Validation error", body = ApiErrorBody),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
        (status = 404, description = "Room not found", body = ApiErrorBody),
    ),
)]
pub async fn post_message(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<MessagePostRequest>,
) -> Result<(StatusCode, Json<MessagePayload>), ApiError> {
    let room_id: RoomId = body
        .room_id
        .parse()
        .map_err(|_| ApiError::bad_request("roomId must be a uuid"))?;

    if body.message.is_empty() {
        return Err(ApiError::bad_request("message is required"));
    }

    let room = state
        .store
        .room_by_id(room_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Room not found"))?;

    let now = Utc::now();
    state
        .store
        .append_message(&MessageRecord {
            id: Uuid::new_v4(),
            room_id,
            user_id,
            timestamp: now,
            content: body.message.clone(),
        })
        .await?;

    // The canonical bytes: the fan-out payload and the response body are
    // the same encoding of the same value.
    let payload = MessagePayload::new(room_id, user_id, now, body.message);
    let bytes = payload.encode().map_err(|err| {
        tracing::error!(%err, "unable to encode payload");
        ApiError::internal("An internal error occurred")
    })?;

    let recipients: Vec<UserId> = room
        .members
        .iter()
        .copied()
        .filter(|member| *member != user_id)
        .collect();

    // Rooms with exactly two members are DMs; skip the broadcast machinery.
    if room.members.len() == 2 {
        if let Some(recipient) = recipients.first() {
            state.coordinator.unicast(*recipient, &bytes).await;
        }
    } else {
        state.coordinator.broadcast(&recipients, &bytes).await;
    }

    Ok((StatusCode::CREATED, Json(payload)))
}

// ---------------------------------------------------------------------------
// GET /api/v1/message
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub room: String,
    pub from: String,
    #[serde(default)]
    pub to: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListMessagesResponse {
    pub messages: Vec<MessageRecord>,
}

#[utoipa::path(
    get,
    path = "/api/v1/message",
    tag = "Messages",
    security(("bearer" = [])),
    params(
        ("room" = String, Query, description = "Room ID"),
        ("from" = String, Query, description = "Window start, RFC3339"),
        ("to" = Option<String>, Query, description = "Window end, RFC3339; defaults to now"),
    ),
    responses(
        (status = 200, description = "Messages in the window, newest first", body = ListMessagesResponse),
        (status = 400, description = "Validation error", body = ApiErrorBody),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
    ),
)]
pub async fn list_messages(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ListMessagesResponse>, ApiError> {
    let room_id: RoomId = query
        .room
        .parse()
        .map_err(|_| ApiError::bad_request("room must be a uuid"))?;

    let from: DateTime<Utc> = query
        .from
        .parse()
        .map_err(|_| ApiError::bad_request("from must be an RFC3339 timestamp"))?;

    // An absent or unparseable window end means "up to now".
    let to: DateTime<Utc> = query
        .to
        .as_deref()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or_else(Utc::now);

    let messages = state.store.messages_between(room_id, from, to).await?;

    Ok(Json(ListMessagesResponse { messages }))
}
