//! Neopets 可用性检测
//!
//! 定期请求 Neopets 首页，页面中出现 "login" / "log in" 视为正常。
//! 结果写入 `GatewayStatus`，只有轮询任务写，handler 只读。

use regex::Regex;
use reqwest::Client;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Neopets 当前状态
#[derive(Debug)]
pub struct GatewayStatus {
    up: AtomicBool,
}

impl Default for GatewayStatus {
    fn default() -> Self {
        // 首次检测之前假定正常
        Self {
            up: AtomicBool::new(true),
        }
    }
}

impl GatewayStatus {
    pub fn is_up(&self) -> bool {
        self.up.load(Ordering::Relaxed)
    }

    pub fn set(&self, up: bool) {
        self.up.store(up, Ordering::Relaxed);
    }
}

/// 首页检测器
#[derive(Clone, Debug)]
pub struct Pinger {
    client: Client,
    url: String,
    login_pattern: Regex,
}

impl Pinger {
    /// # Arguments
    /// * `client` - 带超时的 HTTP client，超时即视为不可用
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            login_pattern: login_pattern(),
        }
    }

    /// 执行一次检测
    pub async fn ping(&self) -> bool {
        let response = match self.client.get(&self.url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Neopets.com status: false. Network request failed.");
                return false;
            }
        };

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "Neopets.com status: false. Reading body failed.");
                return false;
            }
        };

        if !self.login_pattern.is_match(&body) {
            warn!("Neopets.com status: false. Body exists, but didn't contain \"login\".");
            return false;
        }

        info!("Neopets.com status: true. All OK!");
        true
    }
}

fn login_pattern() -> Regex {
    Regex::new("(?i)log ?in").expect("login pattern is a valid regex")
}

/// 启动定期检测任务
///
/// 每个周期结束时检测一次，首个周期不检测
pub fn spawn(
    pinger: Pinger,
    status: Arc<GatewayStatus>,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(url = %pinger.url, interval_secs = interval.as_secs(), "Starting Neopets status poller");

        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    status.set(pinger.ping().await);
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn pinger(url: String) -> Pinger {
        let client = Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();
        Pinger::new(client, url)
    }

    #[test]
    fn test_status_defaults_up() {
        let status = GatewayStatus::default();
        assert!(status.is_up());
        status.set(false);
        assert!(!status.is_up());
    }

    #[test]
    fn test_login_pattern() {
        let pattern = login_pattern();
        assert!(pattern.is_match("Please LOG IN to continue"));
        assert!(pattern.is_match("<a href=\"/login/\">Login</a>"));
        assert!(!pattern.is_match("Site maintenance"));
    }

    #[tokio::test]
    async fn test_ping_healthy_page() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/");
            then.status(200).body("<html><a href=\"/login/\">Log in</a></html>");
        });

        assert!(pinger(server.url("/")).ping().await);
    }

    #[tokio::test]
    async fn test_ping_unexpected_page() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/");
            then.status(200).body("<html>We'll be back soon</html>");
        });

        assert!(!pinger(server.url("/")).ping().await);
    }

    #[tokio::test]
    async fn test_ping_unreachable() {
        assert!(!pinger("http://127.0.0.1:1/".to_string()).ping().await);
    }

    #[tokio::test]
    async fn test_poller_updates_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/");
            then.status(200).body("down for maintenance");
        });

        let status = Arc::new(GatewayStatus::default());
        let shutdown = CancellationToken::new();
        let handle = spawn(
            pinger(server.url("/")),
            status.clone(),
            Duration::from_millis(50),
            shutdown.clone(),
        );

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(!status.is_up());

        shutdown.cancel();
        handle.await.unwrap();
    }
}
