//! 环境变量配置加载

use std::env;
use std::time::Duration;
use tracing::warn;

/// 用户查询来源
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserSourceKind {
    /// AMFPHP 网关
    Gateway,
    /// 用户页面抓取
    Lookup,
}

impl UserSourceKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "gateway" | "amfphp" => Some(Self::Gateway),
            "lookup" | "html" => Some(Self::Lookup),
            _ => None,
        }
    }
}

/// 环境配置
#[derive(Clone, Debug)]
pub struct EnvConfig {
    /// 服务监听端口
    pub port: u16,
    /// AMFPHP JSON 网关地址
    pub gateway_url: String,
    /// Neopets 站点地址（用户页面查询）
    pub neopets_host: String,
    /// Dress to Impress 地址
    pub impress_host: String,
    /// 用户查询来源
    pub user_source: UserSourceKind,
    /// 网关请求超时
    pub gateway_timeout: Duration,
    /// 转发到 Impress 的超时
    pub submit_timeout: Duration,
    /// 可用性检测配置
    pub ping: PingConfig,
}

/// 可用性检测配置
#[derive(Clone, Debug)]
pub struct PingConfig {
    pub url: String,
    pub interval: Duration,
    pub timeout: Duration,
}

impl EnvConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Self {
        let port = load_with_fallback("NEOPIA_PORT", "PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(8888);

        let gateway_url = env::var("NEOPETS_GATEWAY_URL")
            .unwrap_or_else(|_| "http://www.neopets.com/amfphp/json.php".to_string());

        let neopets_host =
            env::var("NEOPETS_HOST").unwrap_or_else(|_| "http://www.neopets.com".to_string());

        let impress_host =
            env::var("IMPRESS_HOST").unwrap_or_else(|_| "https://impress.openneo.net".to_string());

        let user_source = match env::var("USER_SOURCE") {
            Ok(v) => UserSourceKind::from_str(&v).unwrap_or_else(|| {
                warn!(value = %v, "Unknown USER_SOURCE, falling back to gateway");
                UserSourceKind::Gateway
            }),
            Err(_) => UserSourceKind::Gateway,
        };

        let gateway_timeout = secs_from_env("GATEWAY_TIMEOUT_SECS", 15);
        let submit_timeout = secs_from_env("SUBMIT_TIMEOUT_SECS", 20);

        Self {
            port,
            gateway_url,
            neopets_host,
            impress_host,
            user_source,
            gateway_timeout,
            submit_timeout,
            ping: PingConfig::from_env(),
        }
    }
}

impl PingConfig {
    pub fn from_env() -> Self {
        let url = env::var("PING_URL").unwrap_or_else(|_| "http://www.neopets.com/".to_string());

        Self {
            url,
            interval: secs_from_env("PING_INTERVAL_SECS", 60),
            timeout: secs_from_env("PING_TIMEOUT_SECS", 10),
        }
    }
}

/// 读取秒数，缺失或非法时使用默认值，最小 1 秒
fn secs_from_env(key: &str, default: u64) -> Duration {
    let secs = env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default);
    at_least_one_second(Duration::from_secs(secs))
}

/// 间隔和超时不能为 0
pub fn at_least_one_second(duration: Duration) -> Duration {
    duration.max(Duration::from_secs(1))
}

/// 加载环境变量，支持 fallback
fn load_with_fallback(primary: &str, fallback: &str) -> Option<String> {
    env::var(primary).ok().or_else(|| env::var(fallback).ok())
}

/// 常量
pub mod constants {
    /// 提交队列容量
    pub const SUBMISSION_QUEUE_CAPACITY: usize = 32;

    /// 宠物装扮缓存时间（秒）
    pub const CUSTOMIZATION_MAX_AGE_SECS: u64 = 5 * 60;

    /// 用户信息缓存时间（秒）
    pub const USER_MAX_AGE_SECS: u64 = 60 * 60;

    /// 版本号
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
}
