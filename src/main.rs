use std::net::SocketAddr;
use std::sync::Arc;

use quake_proxy::{
    AppState, config::Config, middleware::RateLimiter, router::create_router,
    upstream::UsgsClient,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env();
    tracing::debug!("Resolved configuration: {:?}", config);

    // 设置应用状态
    let upstream = Arc::new(UsgsClient::from_config(&config));
    let state = AppState::new(config.clone(), upstream);

    // 设置限流器
    let rate_limiter = Arc::new(RateLimiter::from_config(&config));
    rate_limiter.spawn_pruner();

    let app = create_router(state, rate_limiter);

    // 启动服务器
    let addr = config.socket_addr();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("Server is running on {}", addr);

    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    {
        tracing::error!("Server stopped: {}", e);
        std::process::exit(1);
    }
}
