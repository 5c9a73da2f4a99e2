//! 统一错误处理
//!
//! `ApiError` 对应公开 API 的错误响应，响应体统一为 `{"error": "<message>"}`，
//! 由 `api::public::public_error` 按 JSON 或 JSONP 输出

use axum::http::StatusCode;
use serde::Serialize;

use crate::infra::amfphp::RemoteError;
use crate::services::user::UserError;

/// API 错误响应结构
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// 统一 API 错误类型
#[derive(Debug)]
pub enum ApiError {
    /// 404 - 资源未找到
    NotFound(String),
    /// 400 - 请求无效
    BadRequest(String),
    /// 500 - 内部错误（含上游网关错误）
    Internal(String),
    /// 503 - 上游网关超时
    ServiceUnavailable(String),
}

impl ApiError {
    /// 创建未找到错误
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// 创建请求无效错误
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::NotFound(m)
            | ApiError::BadRequest(m)
            | ApiError::Internal(m)
            | ApiError::ServiceUnavailable(m) => m,
        }
    }

    pub fn body(&self) -> ErrorResponse {
        ErrorResponse::new(self.message())
    }
}

impl From<RemoteError> for ApiError {
    fn from(e: RemoteError) -> Self {
        if e.is_timeout() {
            Self::ServiceUnavailable(e.to_string())
        } else {
            Self::Internal(e.to_string())
        }
    }
}

impl From<UserError> for ApiError {
    fn from(e: UserError) -> Self {
        match e {
            UserError::NotFound(name) => Self::NotFound(format!("user \"{}\" not found", name)),
            UserError::Gateway(e) => e.into(),
            UserError::Network(e) if e.is_timeout() => Self::ServiceUnavailable(e.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}
