//! API 模块
//!
//! HTTP handlers 和路由组装

pub mod customization;
pub mod public;
pub mod status;
pub mod users;

use axum::{
    http::{header, HeaderValue},
    Router,
};
use std::sync::Arc;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::state::AppState;

/// 构建完整的 API 路由
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Status
        .merge(status::router())
        // Customization
        .merge(customization::router())
        // Users
        .merge(users::router())
        // Middleware：公开 JSON，允许任意站点访问
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
