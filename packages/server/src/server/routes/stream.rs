//! SSE streaming endpoint.
//!
//! GET /chat/:chat_id/stream?token=JWT
//!
//! Forwards the conversation's hub topic (`chat:{chat_id}`) as SSE events.
//!
//! Auth strategy: JWT passed as `?token=` query param, falling back to the
//! Authorization header. EventSource can't send custom headers.

use std::convert::Infallible;

use axum::{
    extract::{Extension, Path, Query},
    http::HeaderMap,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;

use crate::common::ConversationId;
use crate::domains::chatrooms::actions::{authorize, chat_topic};
use crate::server::app::AxumAppState;
use crate::server::error::ApiError;
use crate::server::middleware::{authenticate, extract_claims};

#[derive(Deserialize)]
pub struct StreamQuery {
    /// JWT token for authentication
    token: Option<String>,
}

/// SSE stream handler.
///
/// Only the session matched into the conversation may subscribe.
pub async fn chat_stream_handler(
    Extension(state): Extension<AxumAppState>,
    Path(chat_id): Path<String>,
    Query(query): Query<StreamQuery>,
    headers: HeaderMap,
) -> Result<Sse<impl futures::Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let claims = match query.token {
        Some(token) => state.deps.jwt_service.verify_token(&token).ok(),
        None => extract_claims(&headers, &state.deps.jwt_service),
    }
    .ok_or(ApiError::Unauthorized)?;

    let user = authenticate(claims, &state.deps.sessions)
        .await
        .ok_or(ApiError::Unauthorized)?;

    let chat_id = ConversationId::new(chat_id);
    authorize(user.session_id, &chat_id, &state.deps).await?;

    let rx = state.deps.stream_hub.subscribe(&chat_topic(&chat_id)).await;

    let hello =
        stream::once(async { Ok::<_, Infallible>(Event::default().event("connected").data("ok")) });
    let updates =
        BroadcastStream::new(rx).filter_map(|update| async move { chat_event(update).map(Ok) });

    Ok(Sse::new(hello.chain(updates)).keep_alive(KeepAlive::default()))
}

/// Hub payloads carry their SSE event name in `type` ("message", "unmatched").
fn chat_event(update: Result<serde_json::Value, BroadcastStreamRecvError>) -> Option<Event> {
    match update {
        Ok(value) => {
            let name = value.get("type").and_then(|t| t.as_str()).unwrap_or("message");
            Event::default().event(name).json_data(&value).ok()
        }
        // Slow client: tell it how much history to refetch from /chat/log
        Err(BroadcastStreamRecvError::Lagged(missed)) => Event::default()
            .event("lagged")
            .json_data(serde_json::json!({ "missed": missed }))
            .ok(),
    }
}
