//! Neopia - Neopets 宠物装扮代理
//!
//! 从 Neopets AMFPHP 网关读取宠物装扮和用户宠物列表，以 JSON/JSONP 公开，
//! 并把成功读取的装扮转发给 Dress to Impress

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod infra;
pub mod services;
pub mod state;

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::env::constants::{SUBMISSION_QUEUE_CAPACITY, VERSION};
use crate::config::env::at_least_one_second;
use crate::config::EnvConfig;
use crate::infra::ImpressClient;
use crate::services::{status, submitter};
use crate::state::{get_shutdown_token, trigger_shutdown, AppState};

/// 命令行覆盖项，未设置的使用环境变量
#[derive(Debug, Default, Clone)]
pub struct RuntimeConfig {
    pub port_override: Option<u16>,
    pub gateway_url: Option<String>,
    pub impress_host: Option<String>,
    pub ping_url: Option<String>,
    pub ping_interval: Option<Duration>,
    pub ping_timeout: Option<Duration>,
}

impl RuntimeConfig {
    /// 把覆盖项写入环境配置
    pub fn apply(&self, config: &mut EnvConfig) {
        if let Some(port) = self.port_override {
            config.port = port;
        }
        if let Some(url) = &self.gateway_url {
            config.gateway_url = url.clone();
        }
        if let Some(host) = &self.impress_host {
            config.impress_host = host.clone();
        }
        if let Some(url) = &self.ping_url {
            config.ping.url = url.clone();
        }
        if let Some(interval) = self.ping_interval {
            config.ping.interval = at_least_one_second(interval);
        }
        if let Some(timeout) = self.ping_timeout {
            config.ping.timeout = at_least_one_second(timeout);
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("neopia=info,tower_http=info"));
    // 测试或重复初始化时忽略错误
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// 初始化并运行服务，直到收到 Ctrl+C
pub async fn init_and_run_with_config(runtime: RuntimeConfig) -> anyhow::Result<()> {
    init_tracing();

    let mut config = EnvConfig::from_env();
    runtime.apply(&mut config);

    info!(version = VERSION, "Starting neopia");

    let shutdown = get_shutdown_token();

    // 转发队列与 worker
    let (queue, receiver) = submitter::SubmissionQueue::channel(SUBMISSION_QUEUE_CAPACITY);
    let impress = ImpressClient::new(
        infra::http_client(config.submit_timeout).context("building impress client")?,
        config.impress_host.clone(),
        config.submit_timeout,
    );

    let ping = config.ping.clone();
    let port = config.port;
    let state = Arc::new(AppState::new(config, queue).context("building gateway client")?);

    let submitter_handle = submitter::spawn(impress, receiver, shutdown.clone());

    // Neopets 可用性检测
    let pinger = status::Pinger::new(
        infra::http_client(ping.timeout).context("building ping client")?,
        ping.url.clone(),
    );
    let poller_handle = status::spawn(
        pinger,
        state.gateway_status.clone(),
        ping.interval,
        shutdown.clone(),
    );

    let app = api::router(state);
    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!(addr = %addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving http")?;

    trigger_shutdown();
    if let Err(e) = submitter_handle.await {
        warn!(error = %e, "Impress submitter task failed");
    }
    if let Err(e) = poller_handle.await {
        warn!(error = %e, "Status poller task failed");
    }

    info!("Neopia stopped");
    Ok(())
}

/// 等待 Ctrl+C 或全局 shutdown
async fn shutdown_signal() {
    let shutdown = get_shutdown_token();
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!(error = %e, "Failed to listen for ctrl-c");
            }
            info!("Received ctrl-c, shutting down");
            trigger_shutdown();
        }
        _ = shutdown.cancelled() => {}
    }
}
