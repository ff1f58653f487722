//! Doubao client demo entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config (falls back to built-in defaults when the file is missing)
//!   3. Init logger (falls back to stderr at `info` when the configured setup fails)
//!   4. Run a plain text generation and a knowledge-network generation
//!
//! A failing API call or logger setup is reported and the process still
//! exits normally.

use doubao_client::config::{self, Overrides};
use doubao_client::{AppError, Config, DoubaoClient, logger};
use tracing::{error, info, warn};

/// Used when `DOUBAO_API_KEY` is not set.
const PLACEHOLDER_API_KEY: &str = "your-doubao-api-key";

const SIMPLE_PROMPT: &str = "解释一下什么是人工智能";

const COURSE_CONTENT: &str = "\
计算机网络是计算机科学的一个分支，主要研究计算机之间如何相互连接和通信。
主要内容包括：
1. 网络基础：OSI七层模型、TCP/IP四层模型、网络协议
2. 网络设备：路由器、交换机、防火墙、网关
3. 网络安全：加密技术、防火墙、入侵检测系统、VPN
4. 网络应用：HTTP、FTP、SMTP、DNS等协议";

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    // Load .env if present; the file is optional.
    let _ = dotenvy::dotenv();

    let config = match config::load() {
        Ok(config) => config,
        Err(e) => {
            // Logger is not up yet; report on stderr and continue with defaults.
            eprintln!("warning: {e}; using built-in defaults");
            config::from_overrides(Overrides::from_env())
        }
    };

    let log_file = config.logging.log_file.as_deref();
    if let Some(e) = logger::init_best_effort(&config.logging.log_level, true, log_file) {
        warn!(error = %e, "logger setup failed; logging to stderr at info");
    }

    info!(
        endpoint = %config.client.api_base_url,
        model = %config.client.model,
        log_level = %config.logging.log_level,
        "config loaded"
    );

    if let Err(e) = demo(config) {
        error!(error = %e, "demo failed");
    }

    Ok(())
}

fn demo(mut config: Config) -> Result<(), AppError> {
    if config.client.api_key.is_empty() {
        warn!("DOUBAO_API_KEY is not set; using placeholder key");
        config.client.api_key = PLACEHOLDER_API_KEY.to_string();
    }

    let client = DoubaoClient::with_config(config.client)?.with_knowledge_config(config.knowledge);

    println!("=== Doubao API demo ===");

    println!("\n1. Text generation:");
    let text = client.generate_text(SIMPLE_PROMPT, None, None)?;
    println!("{text}");

    println!("\n2. Knowledge network:");
    let network = client.generate_knowledge_network(COURSE_CONTENT)?;
    let pretty = serde_json::to_string_pretty(&network).unwrap_or_else(|_| network.to_string());
    println!("{pretty}");

    println!("\n=== Demo finished ===");
    Ok(())
}
