use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use based_persist::{Conversation, Message};

use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult},
    service::ProcessedMessage,
    state::AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct MessageCreate {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ChatStatus {
    pub is_pending: bool,
}

pub async fn list_chats(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Vec<Conversation>>> {
    let chats = state
        .chat
        .list_conversations(auth.user_id, query.limit, query.offset)
        .await?;
    Ok(Json(chats))
}

pub async fn create_chat(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> ApiResult<Json<Conversation>> {
    Ok(Json(state.chat.create_conversation(auth.user_id).await?))
}

pub async fn task_types(State(state): State<Arc<AppState>>, _auth: AuthUser) -> Json<Vec<String>> {
    Json(state.chat.task_types())
}

pub async fn chat_status(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(chat_id): Path<i64>,
) -> Json<ChatStatus> {
    Json(ChatStatus {
        is_pending: state.chat.is_pending(chat_id),
    })
}

pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(chat_id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Vec<Message>>> {
    let messages = state
        .chat
        .list_messages(auth.user_id, chat_id, query.limit, query.offset)
        .await?;
    Ok(Json(messages))
}

pub async fn process_message(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(chat_id): Path<i64>,
    Json(req): Json<MessageCreate>,
) -> ApiResult<Json<ProcessedMessage>> {
    process(&state, auth, chat_id, req, None).await
}

pub async fn process_message_task(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path((chat_id, task_name)): Path<(i64, String)>,
    Json(req): Json<MessageCreate>,
) -> ApiResult<Json<ProcessedMessage>> {
    process(&state, auth, chat_id, req, Some(&task_name)).await
}

async fn process(
    state: &AppState,
    auth: AuthUser,
    chat_id: i64,
    req: MessageCreate,
    task_name: Option<&str>,
) -> ApiResult<Json<ProcessedMessage>> {
    if req.content.trim().is_empty() {
        return Err(ApiError::BadRequest("Message content must not be empty".to_string()));
    }
    let processed = state
        .chat
        .process_user_message(auth.user_id, chat_id, &req.content, task_name)
        .await?;
    Ok(Json(processed))
}

pub async fn get_chat(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(chat_id): Path<i64>,
) -> ApiResult<Json<Conversation>> {
    Ok(Json(state.chat.get_conversation(auth.user_id, chat_id).await?))
}

pub async fn delete_chat(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(chat_id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.chat.delete_conversation(auth.user_id, chat_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
