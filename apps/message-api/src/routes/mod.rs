pub mod health;
pub mod messages;

use axum::Router;
use utoipa::OpenApi;

use crate::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(messages::post_message, messages::list_messages),
    components(schemas(
        messages::MessagePostRequest,
        messages::ListMessagesResponse,
        crate::store::MessageRecord,
        crate::error::ApiErrorBody,
        crate::error::ApiErrorDetail,
    ))
)]
pub struct ApiDoc;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/api/v1", messages::router())
}
