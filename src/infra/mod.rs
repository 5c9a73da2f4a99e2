//! 基础设施模块
//!
//! 封装外部 HTTP 依赖：AMFPHP 网关、Dress to Impress

pub mod amfphp;
pub mod impress;

pub use amfphp::{Presence, RemoteError, RemoteGateway, RemoteMethod, RemoteService};
pub use impress::{ImpressClient, SubmitError, SubmitOutcome};

use reqwest::Client;
use std::time::Duration;

/// 创建带超时的 HTTP client，复用连接池
pub fn http_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .pool_max_idle_per_host(5)
        .pool_idle_timeout(Duration::from_secs(90))
        .user_agent(concat!("neopia/", env!("CARGO_PKG_VERSION")))
        .build()
}
