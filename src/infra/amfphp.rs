//! AMFPHP JSON 网关客户端
//!
//! 上游没有正式 schema，只有约定式 URL：
//! `{gateway}/{Service}.{method}/{arg1}/{arg2}/...`
//!
//! 响应体要么是"无数据"标记（空响应体或字面量 `false`，因方法而异），
//! 要么是 JSON 文档。

use reqwest::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;
use url::form_urlencoded;

/// 网关调用错误
#[derive(Debug, Error)]
pub enum RemoteError {
    /// 网络错误或超时
    #[error("gateway request to {method} failed: {source}")]
    Transport {
        method: String,
        #[source]
        source: reqwest::Error,
    },

    /// 有数据但无法解析
    #[error("gateway returned malformed {method} response: {source}")]
    Decode {
        method: String,
        #[source]
        source: serde_json::Error,
    },
}

impl RemoteError {
    /// 网关在超时时间内没有响应
    pub fn is_timeout(&self) -> bool {
        matches!(self, RemoteError::Transport { source, .. } if source.is_timeout())
    }
}

/// 判断响应体是否代表"有数据"
///
/// 上游用不同的标记表示"无数据"，每个方法各自选择一种
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Presence {
    /// 空响应体表示无数据
    NonEmptyBody,
    /// 响应体为 `false` 表示无数据
    NotLiteralFalse,
}

impl Presence {
    pub fn is_present(self, body: &[u8]) -> bool {
        match self {
            Presence::NonEmptyBody => !body.is_empty(),
            Presence::NotLiteralFalse => body != b"false",
        }
    }
}

/// 网关地址
#[derive(Clone, Debug)]
pub struct RemoteGateway {
    url: String,
    client: Client,
}

impl RemoteGateway {
    /// 创建网关
    ///
    /// 请求超时由传入的 `client` 决定
    pub fn new(url: impl Into<String>, client: Client) -> Self {
        let url = url.into().trim_end_matches('/').to_string();
        Self { url, client }
    }

    pub fn service(&self, name: impl Into<String>) -> RemoteService {
        RemoteService {
            gateway: self.clone(),
            name: name.into(),
        }
    }
}

/// 网关上的一个服务，只负责拼接路径
#[derive(Clone, Debug)]
pub struct RemoteService {
    gateway: RemoteGateway,
    name: String,
}

impl RemoteService {
    pub fn method(&self, name: impl Into<String>, presence: Presence) -> RemoteMethod {
        RemoteMethod {
            service: self.clone(),
            name: name.into(),
            presence,
        }
    }
}

/// 可调用的远程方法
#[derive(Clone, Debug)]
pub struct RemoteMethod {
    service: RemoteService,
    name: String,
    presence: Presence,
}

impl RemoteMethod {
    /// `Service.method` 形式的完整名称
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.service.name, self.name)
    }

    /// 构建请求 URL，每个参数单独转义
    pub fn url(&self, args: &[&str]) -> String {
        let mut url = format!("{}/{}", self.service.gateway.url, self.qualified_name());
        for arg in args {
            url.push('/');
            url.extend(form_urlencoded::byte_serialize(arg.as_bytes()));
        }
        url
    }

    /// 调用远程方法
    ///
    /// - `Ok(None)`：上游明确表示无数据，不尝试解码
    /// - `Ok(Some(_))`：有数据且解码成功
    /// - `Err(Decode)`：有数据但格式错误
    /// - `Err(Transport)`：网络失败
    pub async fn call<T: DeserializeOwned>(&self, args: &[&str]) -> Result<Option<T>, RemoteError> {
        let url = self.url(args);
        let transport = |source| RemoteError::Transport {
            method: self.qualified_name(),
            source,
        };

        let response = self
            .service
            .gateway
            .client
            .get(&url)
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();
        let body = response.bytes().await.map_err(transport)?;

        if !self.presence.is_present(&body) {
            debug!(url = %url, status = %status, "Gateway reported no data");
            return Ok(None);
        }

        serde_json::from_slice(&body)
            .map(Some)
            .map_err(|source| RemoteError::Decode {
                method: self.qualified_name(),
                source,
            })
    }
}
