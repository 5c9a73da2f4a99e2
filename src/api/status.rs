//! 状态 API

use axum::{
    extract::{Query, State},
    response::Response,
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::Arc;

use super::public::{public_json, PublicParams};
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: bool,
}

/// 创建状态路由
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/1/status", get(status))
}

/// Neopets 是否可用
///
/// GET /api/1/status
async fn status(State(state): State<Arc<AppState>>, Query(params): Query<PublicParams>) -> Response {
    let response = StatusResponse {
        status: state.gateway_status.is_up(),
    };
    public_json(params.callback(), &response)
}
