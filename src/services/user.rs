//! 用户查询
//!
//! 两种来源，统一为 `UserSource`：
//! - 网关：`MobileService.getPets` 直接返回宠物列表
//! - 页面：抓取 `userlookup.phtml`，从宠物链接中提取宠物名
//!
//! 两者都用 `Ok(None)` 表示用户不存在，与网络/解析错误区分

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use url::{form_urlencoded, Url};

use crate::domain::User;
use crate::infra::amfphp::{Presence, RemoteError, RemoteGateway, RemoteMethod};

/// 用户查询错误
#[derive(Debug, Error)]
pub enum UserError {
    #[error("user {0} not found")]
    NotFound(String),

    #[error(transparent)]
    Gateway(#[from] RemoteError),

    #[error("user lookup request failed: {0}")]
    Network(#[from] reqwest::Error),
}

impl UserError {
    /// 把 `Ok(None)` 转成带类型的未找到错误
    pub fn not_found(name: &str) -> Self {
        Self::NotFound(name.to_string())
    }
}

/// 用户查询来源
#[async_trait]
pub trait UserSource: Send + Sync {
    /// 查询用户，`Ok(None)` 表示用户不存在
    async fn get_user(&self, name: &str) -> Result<Option<User>, UserError>;

    /// 来源名称，用于日志
    fn name(&self) -> &'static str;
}

/// 网关返回的宠物条目，可能是名字字符串，也可能是带 `name` 字段的对象
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GatewayPet {
    Name(String),
    Entry { name: String },
}

impl GatewayPet {
    fn into_name(self) -> String {
        match self {
            GatewayPet::Name(name) | GatewayPet::Entry { name } => name,
        }
    }
}

/// 通过 AMFPHP 网关查询用户
#[derive(Clone, Debug)]
pub struct GatewayUserSource {
    get_pets: RemoteMethod,
}

impl GatewayUserSource {
    pub fn new(gateway: &RemoteGateway) -> Self {
        Self {
            get_pets: gateway
                .service("MobileService")
                .method("getPets", Presence::NotLiteralFalse),
        }
    }
}

#[async_trait]
impl UserSource for GatewayUserSource {
    async fn get_user(&self, name: &str) -> Result<Option<User>, UserError> {
        let pets: Option<Vec<GatewayPet>> = self.get_pets.call(&[name]).await?;

        Ok(pets.map(|pets| {
            let pet_names = pets
                .into_iter()
                .map(GatewayPet::into_name)
                .filter(|n| !n.is_empty())
                .collect();
            User::new(name, pet_names)
        }))
    }

    fn name(&self) -> &'static str {
        "gateway"
    }
}

/// 通过用户页面查询用户
#[derive(Clone, Debug)]
pub struct LookupPageUserSource {
    client: Client,
    host: String,
}

impl LookupPageUserSource {
    /// # Arguments
    /// * `host` - Neopets 站点地址，如 `http://www.neopets.com`
    pub fn new(client: Client, host: impl Into<String>) -> Self {
        let host = host.into().trim_end_matches('/').to_string();
        Self { client, host }
    }

    pub fn lookup_url(&self, name: &str) -> String {
        let escaped: String = form_urlencoded::byte_serialize(name.as_bytes()).collect();
        format!("{}/userlookup.phtml?user={}", self.host, escaped)
    }
}

#[async_trait]
impl UserSource for LookupPageUserSource {
    async fn get_user(&self, name: &str) -> Result<Option<User>, UserError> {
        let url = self.lookup_url(name);
        let body = self
            .client
            .get(&url)
            .send()
            .await?
            .text()
            .await?;

        let pet_names = parse_lookup_page(&body);
        if pet_names.is_none() {
            debug!(user = %name, "User lookup page has no pets container");
        }
        Ok(pet_names.map(|pet_names| User::new(name, pet_names)))
    }

    fn name(&self) -> &'static str {
        "lookup"
    }
}

/// 解析用户页面
///
/// 没有 `#userneopets` 容器时返回 `None`。宠物从最后一个容器中读取，
/// 保持文档顺序，重复链接原样保留。
pub fn parse_lookup_page(html: &str) -> Option<Vec<String>> {
    // 选择器是常量，解析不会失败
    let container_selector = Selector::parse("#userneopets").ok()?;
    let pet_link_selector = Selector::parse(r#"a[href^="/petlookup.phtml?pet="]"#).ok()?;

    let document = Html::parse_document(html);
    let container = document.select(&container_selector).last()?;

    let pet_names = container
        .select(&pet_link_selector)
        .filter_map(|link| link.value().attr("href"))
        .filter_map(pet_name_from_href)
        .collect();

    Some(pet_names)
}

/// 从 `/petlookup.phtml?pet=<name>` 中取出 `pet` 参数
fn pet_name_from_href(href: &str) -> Option<String> {
    // 相对链接需要一个基准地址才能解析
    let base = Url::parse("http://www.neopets.com/").ok()?;
    let url = base.join(href).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "pet")
        .map(|(_, value)| value.into_owned())
        .filter(|name| !name.is_empty())
}
