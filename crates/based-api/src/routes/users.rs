use axum::{extract::State, Json};
use std::sync::Arc;

use based_persist::User;

use crate::{auth::AuthUser, error::ApiResult, state::AppState};

pub async fn current_user(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> ApiResult<Json<User>> {
    Ok(Json(state.chat.get_user(auth.user_id).await?))
}
