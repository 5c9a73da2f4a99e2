//! 用户 API
//!
//! 包含 /api/1/users/:name 端点

use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::get,
    Router,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use super::public::{public_error, public_json, write_expires_in, PublicParams};
use crate::config::env::constants::USER_MAX_AGE_SECS;
use crate::domain::User;
use crate::error::ApiError;
use crate::services::user::UserError;
use crate::state::AppState;

/// 用户列表响应
#[derive(Debug, Serialize)]
struct UsersResponse {
    users: Vec<UserResponse>,
}

#[derive(Debug, Serialize)]
struct UserResponse {
    id: String,
    links: PetLinksResponse,
}

#[derive(Debug, Serialize)]
struct PetLinksResponse {
    pets: Vec<String>,
}

impl From<User> for UsersResponse {
    fn from(user: User) -> Self {
        Self {
            users: vec![UserResponse {
                id: user.name,
                links: PetLinksResponse {
                    pets: user.pet_names,
                },
            }],
        }
    }
}

/// 创建用户路由
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/1/users/:name", get(get_user))
}

/// 查询用户及其宠物
///
/// GET /api/1/users/:name
async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(params): Query<PublicParams>,
) -> Response {
    let callback = params.callback();

    match state.users.get_user(&name).await {
        Ok(Some(user)) => {
            let mut response = public_json(callback, &UsersResponse::from(user));
            write_expires_in(
                response.headers_mut(),
                Duration::from_secs(USER_MAX_AGE_SECS),
                Utc::now(),
            );
            response
        }
        Ok(None) => public_error(callback, &UserError::not_found(&name).into()),
        Err(e) => {
            warn!(user = %name, source = state.users.name(), error = %e, "User lookup failed");
            public_error(callback, &ApiError::from(e))
        }
    }
}
