//! 认证服务主入口

use panel_auth::{
    auth::jwt::TokenService,
    config::AppConfig,
    middleware::AppState,
    repository::InMemoryUserStore,
    routes,
    services::AuthService,
    telemetry,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "--version" => {
                println!("panel-auth {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("未知参数: {}", args[1]);
                print_help();
                std::process::exit(1);
            }
        }
    }

    // 按优先级加载：.env.local > .env
    // 生产环境应该直接设置环境变量
    dotenv::from_filename(".env.local").ok();
    dotenv::dotenv().ok();

    // 1. 加载配置
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        anyhow::anyhow!("Failed to load configuration: {}", e)
    })?;

    // 2. 初始化日志
    telemetry::init_telemetry(&config);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Panel auth starting...");

    // 3. 构建服务，存储由这里创建并注入
    let token_service = Arc::new(TokenService::from_config(&config)?);
    let user_store = Arc::new(InMemoryUserStore::new());
    let auth_service = Arc::new(AuthService::from_config(
        user_store,
        token_service.clone(),
        &config,
    ));

    let app_state = Arc::new(AppState {
        config: config.clone(),
        auth_service,
        token_service,
        started_at: Instant::now(),
    });

    // 4. 构建路由
    let app = routes::create_router(app_state);

    // 5. 启动服务器
    let addr = &config.server.addr;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// 优雅关闭信号处理
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl+C received, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Terminate signal received, starting graceful shutdown");
        },
    }
}

/// 打印帮助信息
fn print_help() {
    println!("panel-auth {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("用法: panel-auth [选项]");
    println!();
    println!("选项:");
    println!("  --version     打印版本信息并退出");
    println!("  --help        打印此帮助信息并退出");
    println!();
    println!("环境变量 (前缀 PANEL_，层级分隔符 __):");
    println!("  PANEL_SERVER__ADDR              监听地址 (默认 127.0.0.1:3000)");
    println!("  PANEL_SERVER__MAX_BODY_BYTES    请求体上限 (默认 1000000)");
    println!("  PANEL_LOGGING__LEVEL            日志级别 (默认 info)");
    println!("  PANEL_LOGGING__FORMAT           json 或 pretty (默认 json)");
    println!("  PANEL_SECURITY__JWT_SECRET      令牌签名密钥 (至少 32 字符)");
    println!("  PANEL_SECURITY__TOKEN_TTL_SECS  令牌有效期 (默认 3600)");
}
