//! Neopia - Neopets 宠物装扮代理
//!
//! Usage:
//! - Normal mode: `neopia`
//! - With custom port: `neopia --port 8889`
//! - Local Impress: `neopia --impress http://localhost:3000`

use neopia::RuntimeConfig;
use std::time::Duration;

/// 解析命令行参数
fn parse_args() -> RuntimeConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut config = RuntimeConfig::default();

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1).cloned();
        match (args[i].as_str(), value) {
            ("--port", Some(v)) => {
                config.port_override = v.parse().ok();
                i += 2;
            }
            ("--neopetsGateway", Some(v)) => {
                config.gateway_url = Some(v);
                i += 2;
            }
            ("--impress", Some(v)) => {
                config.impress_host = Some(v);
                i += 2;
            }
            ("--pingUrl", Some(v)) => {
                config.ping_url = Some(v);
                i += 2;
            }
            ("--pingInterval", Some(v)) => {
                config.ping_interval = v.parse().ok().map(Duration::from_secs);
                i += 2;
            }
            ("--pingTimeout", Some(v)) => {
                config.ping_timeout = v.parse().ok().map(Duration::from_secs);
                i += 2;
            }
            ("--help" | "-h", _) => {
                print_help();
                std::process::exit(0);
            }
            _ => {
                i += 1;
            }
        }
    }

    config
}

fn print_help() {
    println!("Neopia - Neopets pet customization proxy");
    println!();
    println!("USAGE:");
    println!("    neopia [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --port <PORT>              Override the listening port (default 8888)");
    println!("    --neopetsGateway <URL>     AMFPHP gateway URL");
    println!("    --impress <URL>            Dress to Impress host");
    println!("    --pingUrl <URL>            Page checked by the status poller");
    println!("    --pingInterval <SECS>      Seconds between status checks");
    println!("    --pingTimeout <SECS>       Timeout for each status check");
    println!("    -h, --help                 Print help information");
    println!();
    println!("ENVIRONMENT:");
    println!("    NEOPIA_PORT, PORT, NEOPETS_GATEWAY_URL, NEOPETS_HOST, IMPRESS_HOST,");
    println!("    USER_SOURCE, GATEWAY_TIMEOUT_SECS, SUBMIT_TIMEOUT_SECS,");
    println!("    PING_URL, PING_INTERVAL_SECS, PING_TIMEOUT_SECS, RUST_LOG");
}

fn main() {
    let config = parse_args();

    let rt = tokio::runtime::Runtime::new().expect("Failed to create runtime");
    let result = rt.block_on(neopia::init_and_run_with_config(config));

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
