//! 应用状态

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// 全局 shutdown token，用于优雅关闭所有后台任务
static GLOBAL_SHUTDOWN: std::sync::OnceLock<CancellationToken> = std::sync::OnceLock::new();

/// 获取全局 shutdown token
pub fn get_shutdown_token() -> CancellationToken {
    GLOBAL_SHUTDOWN
        .get_or_init(CancellationToken::new)
        .clone()
}

/// 触发全局 shutdown
pub fn trigger_shutdown() {
    if let Some(token) = GLOBAL_SHUTDOWN.get() {
        token.cancel();
    }
}

use crate::config::env::{EnvConfig, UserSourceKind};
use crate::infra::{self, RemoteGateway};
use crate::services::{
    customization::CustomizationService,
    status::GatewayStatus,
    submitter::SubmissionQueue,
    user::{GatewayUserSource, LookupPageUserSource, UserSource},
};

/// 应用状态
///
/// handler 之间共享，只有 `gateway_status` 会被后台任务更新
pub struct AppState {
    // ========== 核心配置 ==========
    /// 环境配置
    pub config: EnvConfig,

    // ========== 上游 ==========
    /// 宠物装扮服务
    pub customizations: CustomizationService,
    /// 用户查询来源
    pub users: Arc<dyn UserSource>,
    /// Neopets 可用性
    pub gateway_status: Arc<GatewayStatus>,

    // ========== 下游 ==========
    /// 转发到 Impress 的队列
    pub submissions: SubmissionQueue,
}

impl AppState {
    /// 创建新的应用状态
    ///
    /// 网关和用户页面共用一个带超时的 HTTP client
    pub fn new(config: EnvConfig, submissions: SubmissionQueue) -> reqwest::Result<Self> {
        let client = infra::http_client(config.gateway_timeout)?;
        let gateway = RemoteGateway::new(config.gateway_url.clone(), client.clone());

        let users: Arc<dyn UserSource> = match config.user_source {
            UserSourceKind::Gateway => Arc::new(GatewayUserSource::new(&gateway)),
            UserSourceKind::Lookup => {
                Arc::new(LookupPageUserSource::new(client, config.neopets_host.clone()))
            }
        };

        tracing::info!(
            port = config.port,
            gateway_url = %config.gateway_url,
            impress_host = %config.impress_host,
            user_source = users.name(),
            gateway_timeout_secs = config.gateway_timeout.as_secs(),
            "Loaded configuration"
        );

        Ok(Self {
            customizations: CustomizationService::new(&gateway),
            users,
            gateway_status: Arc::new(GatewayStatus::default()),
            submissions,
            config,
        })
    }
}
