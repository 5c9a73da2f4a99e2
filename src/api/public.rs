//! 公开 JSON 响应
//!
//! 所有公开接口都支持 JSONP（`callback` 参数）并附带缓存头

use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::error;
use url::{form_urlencoded, Url};

use crate::error::ApiError;

/// 公开接口的通用查询参数
#[derive(Debug, Default, Deserialize)]
pub struct PublicParams {
    /// JSONP 回调函数名
    pub callback: Option<String>,
    /// 重定向模板，`{q}` 会被替换为查询串
    pub redirect: Option<String>,
    /// 宠物名（`/api/1/pet/customization` 使用）
    pub name: Option<String>,
    /// Impress 用户 ID
    pub impress_user: Option<String>,
}

impl PublicParams {
    pub fn callback(&self) -> Option<&str> {
        self.callback.as_deref().filter(|c| !c.is_empty())
    }

    pub fn redirect(&self) -> Option<&str> {
        self.redirect.as_deref().filter(|r| !r.is_empty())
    }

    /// 合并表单 POST 的参数，表单中的值优先于查询串
    ///
    /// 只处理 `application/x-www-form-urlencoded`，其他请求体忽略
    pub fn merge_form(&mut self, headers: &HeaderMap, body: &[u8]) {
        let is_form = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.starts_with("application/x-www-form-urlencoded"))
            .unwrap_or(false);
        if !is_form {
            return;
        }

        let mut seen: Vec<String> = Vec::new();
        for (key, value) in form_urlencoded::parse(body) {
            // 同名参数只取第一个
            if seen.iter().any(|k| *k == key) {
                continue;
            }
            let field = match key.as_ref() {
                "callback" => &mut self.callback,
                "redirect" => &mut self.redirect,
                "name" => &mut self.name,
                "impress_user" => &mut self.impress_user,
                _ => continue,
            };
            *field = Some(value.into_owned());
            seen.push(key.into_owned());
        }
    }
}

/// 输出 JSON 字节，有回调时包装为 `callback(<json>);`
pub fn json_bytes(callback: Option<&str>, status: StatusCode, body: Vec<u8>) -> Response {
    match callback {
        None => (
            status,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        Some(callback) => {
            let mut wrapped = Vec::with_capacity(callback.len() + body.len() + 3);
            wrapped.extend_from_slice(callback.as_bytes());
            wrapped.push(b'(');
            wrapped.extend_from_slice(&body);
            wrapped.extend_from_slice(b");");
            (
                status,
                [(header::CONTENT_TYPE, "application/javascript")],
                wrapped,
            )
                .into_response()
        }
    }
}

/// 序列化并输出 JSON
pub fn public_json<T: Serialize>(callback: Option<&str>, value: &T) -> Response {
    match serde_json::to_vec(value) {
        Ok(body) => json_bytes(callback, StatusCode::OK, body),
        Err(e) => {
            error!(error = %e, "Failed to serialize response");
            public_error(callback, &ApiError::internal(e.to_string()))
        }
    }
}

/// 输出错误 JSON
pub fn public_error(callback: Option<&str>, err: &ApiError) -> Response {
    // ErrorResponse 只包含字符串，序列化不会失败
    let body = serde_json::to_vec(&err.body()).unwrap_or_default();
    json_bytes(callback, err.status(), body)
}

/// 写入缓存头：`cache-control` 与 RFC 1123 格式的 `expires`
pub fn write_expires_in(headers: &mut HeaderMap, max_age: Duration, now: DateTime<Utc>) {
    let expiry = now + chrono::Duration::seconds(max_age.as_secs() as i64);
    let cache_control = format!("public, max-age={}", max_age.as_secs());
    let expires = expiry.format("%a, %d %b %Y %H:%M:%S GMT").to_string();

    if let Ok(value) = HeaderValue::from_str(&cache_control) {
        headers.insert(header::CACHE_CONTROL, value);
    }
    if let Ok(value) = HeaderValue::from_str(&expires) {
        headers.insert(header::EXPIRES, value);
    }
}

/// 按 key 排序后编码查询串，同 key 的值保持原顺序
pub fn encode_query<K: AsRef<str>, V: AsRef<str>>(mut pairs: Vec<(K, V)>) -> String {
    pairs.sort_by(|a, b| a.0.as_ref().cmp(b.0.as_ref()));
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in &pairs {
        serializer.append_pair(key.as_ref(), value.as_ref());
    }
    serializer.finish()
}

/// 307 临时重定向
///
/// `location` 不是合法的 header 值时返回 `None`
pub fn temporary_redirect(location: &str) -> Option<Response> {
    let location = HeaderValue::from_str(location).ok()?;
    Some((StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION, location)]).into_response())
}

/// 把错误带回来源页面
///
/// 在 referer 的查询串中设置 `name` 和 `neopia[error]`；referer 无法解析时返回 `None`。
/// 支持绝对地址和以 `/` 开头的路径。
pub fn redirect_back_with_error(referer: &str, pet_name: &str, message: &str) -> Option<Response> {
    let (mut url, path_only) = match Url::parse(referer) {
        Ok(url) => (url, false),
        Err(url::ParseError::RelativeUrlWithoutBase)
            if referer.starts_with('/') && !referer.starts_with("//") =>
        {
            (Url::parse("http://localhost/").ok()?.join(referer).ok()?, true)
        }
        Err(_) => return None,
    };

    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "name" && key != "neopia[error]")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    pairs.push(("name".to_string(), pet_name.to_string()));
    pairs.push(("neopia[error]".to_string(), message.to_string()));

    url.set_query(Some(&encode_query(pairs)));

    if !path_only {
        return temporary_redirect(url.as_str());
    }
    let mut location = format!("{}?{}", url.path(), url.query().unwrap_or_default());
    if let Some(fragment) = url.fragment() {
        location.push('#');
        location.push_str(fragment);
    }
    temporary_redirect(&location)
}
