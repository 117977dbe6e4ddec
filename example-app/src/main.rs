//! # 示例应用程序
//!
//! 启动用户管理示例并依次分发命令行给出的请求。

use anyhow::{bail, Context};
use clap::Parser;
use example_app::store::UserStore;
use example_app::{classes, BASE_PACKAGE};
use infrastructure_aop::LoggingTransactionManager;
use infrastructure_common::Param;
use infrastructure_composition::{Application, LoggingConfig};
use infrastructure_mvc::InboundRequest;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "example-app")]
#[command(about = "Lorn MVC 用户管理示例")]
struct Args {
    /// 配置文件路径（.toml 或 .json）
    #[arg(short, long, default_value = "config/app.toml")]
    config: PathBuf,

    /// 环境变量前缀
    #[arg(long, default_value = "LORN")]
    env_prefix: String,

    /// 覆盖配置中的基础命名空间
    #[arg(long)]
    base_package: Option<String>,

    /// 日志级别
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 使用 JSON 格式输出日志
    #[arg(long)]
    json_logs: bool,

    /// 要分发的请求，例如 "GET /userInfo?id=1"
    #[arg(short, long = "request")]
    requests: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let transactions = Arc::new(LoggingTransactionManager::new());
    let app = build_application(&args, Arc::clone(&transactions)).await?;
    info!("已注册 {} 条路由", app.routes().len());

    let requests = if args.requests.is_empty() {
        default_requests()
    } else {
        args.requests.clone()
    };

    for line in &requests {
        let request = parse_request(line)?;
        match app.dispatch(&request).await {
            Ok(Some(reply)) => println!("{} -> {}", line, serde_json::to_string(&reply)?),
            Ok(None) => println!("{} -> 404", line),
            Err(e) => {
                error!("请求处理失败: {}: {}", line, e);
                println!("{} -> 500 {}", line, e);
            }
        }
    }

    let stats = transactions.stats();
    info!(
        "事务统计: 开始 {}, 提交 {}, 回滚 {}",
        stats.begun, stats.committed, stats.rolled_back
    );
    Ok(())
}

/// 构建应用
async fn build_application(
    args: &Args,
    transactions: Arc<LoggingTransactionManager>,
) -> anyhow::Result<Application> {
    let mut builder = Application::builder().with_logging(logging_config(args));

    let has_config = args.config.exists();
    if has_config {
        builder = add_config_file(builder, &args.config)?;
    } else {
        info!(
            "配置文件不存在，使用默认配置: {}",
            args.config.display()
        );
    }
    builder = builder.add_config_env_vars(args.env_prefix.as_str());

    match (&args.base_package, has_config) {
        (Some(base_package), _) => builder = builder.with_base_package(base_package.as_str()),
        (None, false) => builder = builder.with_base_package(BASE_PACKAGE),
        (None, true) => {}
    }

    let app = builder
        .register_classes(classes(Arc::new(UserStore::seeded())))
        .with_transaction_manager(transactions)
        .build()
        .await
        .context("应用启动失败")?;
    Ok(app)
}

fn add_config_file(
    builder: infrastructure_composition::ApplicationBuilder,
    path: &Path,
) -> anyhow::Result<infrastructure_composition::ApplicationBuilder> {
    let builder = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => builder.add_config_toml(path)?,
        Some("json") => builder.add_config_json(path)?,
        _ => bail!("不支持的配置文件格式: {}", path.display()),
    };
    Ok(builder)
}

fn logging_config(args: &Args) -> LoggingConfig {
    let base = if args.json_logs {
        LoggingConfig::production()
    } else {
        LoggingConfig::default()
    };
    LoggingConfig {
        level: parse_log_level(&args.log_level),
        ..base
    }
}

/// 解析日志级别
fn parse_log_level(level: &str) -> tracing::Level {
    level.parse().unwrap_or(tracing::Level::INFO)
}

fn default_requests() -> Vec<String> {
    [
        "GET /userList",
        "GET /userInfo?id=2",
        "GET /userEdit?id=2&name=robert",
        "GET /userEdit?id=9&name=nobody",
        "GET /userInfo?id=2",
        "POST /userList",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// 解析 "VERB /path?a=1&b=2" 形式的请求
fn parse_request(line: &str) -> anyhow::Result<InboundRequest> {
    let (verb, target) = line
        .trim()
        .split_once(char::is_whitespace)
        .with_context(|| format!("请求格式应为 \"METHOD /path\": {line}"))?;
    let target = target.trim();

    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    let request = InboundRequest::new(verb, path);

    let params: Param = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            (name.to_string(), serde_json::Value::from(value))
        })
        .collect();

    Ok(if params.is_empty() {
        request
    } else {
        request.with_params(params)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request() {
        let request = parse_request("GET /userEdit?id=2&name=robert").unwrap();
        assert_eq!(request.verb, "GET");
        assert_eq!(request.path, "/userEdit");
        let params = request.params.unwrap();
        assert_eq!(params.get_as::<u64>("id"), Some(2));
        assert_eq!(params.get_str("name"), Some("robert"));

        let plain = parse_request("post /userList").unwrap();
        assert_eq!(plain.verb, "post");
        assert!(plain.params.is_none());

        assert!(parse_request("/userList").is_err());
    }
}
