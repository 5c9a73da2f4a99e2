//! 宠物装扮 API
//!
//! 包含 /api/1/pet/customization 与 /api/1/pets/:name/customization 端点

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap},
    response::Response,
    routing::get,
    Router,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use super::public::{
    encode_query, public_error, public_json, redirect_back_with_error, temporary_redirect,
    write_expires_in, PublicParams,
};
use crate::config::env::constants::CUSTOMIZATION_MAX_AGE_SECS;
use crate::domain::Submission;
use crate::error::ApiError;
use crate::services::customization::has_leading_digit;
use crate::state::AppState;

/// 创建装扮路由
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/1/pet/customization",
            get(customization_by_query).post(customization_by_query),
        )
        .route(
            "/api/1/pets/:name/customization",
            get(customization_by_path).post(customization_by_path),
        )
}

/// GET|POST /api/1/pet/customization?name=<pet>
///
/// POST 可以用表单提交参数
async fn customization_by_query(
    State(state): State<Arc<AppState>>,
    Query(mut params): Query<PublicParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    params.merge_form(&headers, &body);
    let pet_name = params.name.clone().unwrap_or_default();
    serve_customization(&state, &params, &headers, &pet_name).await
}

/// GET|POST /api/1/pets/:name/customization
async fn customization_by_path(
    State(state): State<Arc<AppState>>,
    Path(pet_name): Path<String>,
    Query(mut params): Query<PublicParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    params.merge_form(&headers, &body);
    serve_customization(&state, &params, &headers, &pet_name).await
}

/// 获取装扮并以 JSON 或重定向返回，成功后放入转发队列
async fn serve_customization(
    state: &AppState,
    params: &PublicParams,
    headers: &HeaderMap,
    pet_name: &str,
) -> Response {
    let fail = |err: ApiError| customization_error(params, headers, pet_name, err);

    if pet_name.is_empty() {
        return fail(ApiError::bad_request("name blank"));
    }

    if has_leading_digit(pet_name) {
        // 网关会把数字开头的名字当成整数并超时；
        // 来自 Impress 的请求交回 Impress 的旧加载器处理
        let impress = state.config.impress_host.trim_end_matches('/');
        let destination = match params.redirect() {
            Some(r) if r == format!("{}/wardrobe#{{q}}", impress) => Some("wardrobe"),
            Some(r) if r == format!("{}/#{{q}}", impress) => Some(""),
            _ => None,
        };
        return match destination {
            Some(destination) => redirect_to_impress(impress, pet_name, destination)
                .unwrap_or_else(|| fail(ApiError::bad_request("invalid redirect"))),
            None => fail(ApiError::bad_request(
                "pet names with leading digits are unsupported",
            )),
        };
    }

    let customization = match state.customizations.get_customization(pet_name).await {
        Ok(customization) => customization,
        Err(e) => {
            warn!(pet = %pet_name, error = %e, "Failed to load customization");
            return fail(e.into());
        }
    };

    let max_age = Duration::from_secs(CUSTOMIZATION_MAX_AGE_SECS);

    let customization = match customization {
        Some(customization) => customization,
        None => {
            let mut response = fail(ApiError::not_found("pet not found"));
            write_expires_in(response.headers_mut(), max_age, Utc::now());
            return response;
        }
    };

    let response = match params.redirect() {
        None => Some(public_json(params.callback(), &customization)),
        Some(template) => {
            let query = encode_query(customization.redirect_params());
            temporary_redirect(&template.replace("{q}", &query))
        }
    };
    let response = match response {
        Some(mut response) => {
            write_expires_in(response.headers_mut(), max_age, Utc::now());
            response
        }
        None => {
            warn!(pet = %pet_name, "Redirect template is not a valid location");
            public_error(params.callback(), &ApiError::bad_request("invalid redirect"))
        }
    };

    let user_id = Submission::parse_user_id(params.impress_user.as_deref());
    if let Err(e) = state
        .submissions
        .enqueue(Submission::new(customization, user_id))
        .await
    {
        warn!(pet = %pet_name, error = %e, "Dropping submission");
    }

    response
}

/// 错误响应：有 `redirect` 参数时带着错误回到来源页面，否则输出 JSON
fn customization_error(
    params: &PublicParams,
    headers: &HeaderMap,
    pet_name: &str,
    err: ApiError,
) -> Response {
    if params.redirect().is_some() {
        let referer = headers
            .get(header::REFERER)
            .and_then(|v| v.to_str().ok());
        if let Some(response) =
            referer.and_then(|r| redirect_back_with_error(r, pet_name, err.message()))
        {
            return response;
        }
    }
    public_error(params.callback(), &err)
}

/// 交给 Impress 的旧版宠物加载器
fn redirect_to_impress(impress: &str, pet_name: &str, destination: &str) -> Option<Response> {
    let name: String = url::form_urlencoded::byte_serialize(pet_name.as_bytes()).collect();
    temporary_redirect(&format!(
        "{}/pets/load?name={}&destination={}",
        impress, name, destination
    ))
}
