mod broker;
mod config;
mod dispatch;
mod error;
mod logging;
mod registry;
mod session;
mod users;

use std::sync::Arc;

use axum::{routing::get, Router};
use tracing::{error, info};

use broker::Broker;
use config::ServerConfig;
use registry::Registry;
use users::UserStore;

// 服务器全局状态。房间各自加锁，互不阻塞
pub struct AppState {
    pub registry: Registry,
    pub users: UserStore,
    pub broker: Broker,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(config: ServerConfig) -> AppState {
        AppState {
            registry: Registry::new(config.max_rooms),
            users: UserStore::new(),
            broker: Broker::new(config.channel_capacity),
            config,
        }
    }
}

pub type SharedState = Arc<AppState>;

#[tokio::main]
async fn main() {
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("配置错误: {e}");
            std::process::exit(2);
        }
    };
    logging::init(&config.log_level);

    let state = SharedState::new(AppState::new(config));
    let app = Router::new()
        .route("/ws", get(session::websocket_handler))
        .with_state(state.clone());

    let addr = state.config.bind;
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("无法监听 {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    info!("服务器正在监听 {}", addr);

    if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await {
        error!("服务器异常退出: {}", e);
    }
    info!("服务器已关闭");
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // 无法监听信号时一直运行
        std::future::pending::<()>().await;
    }
    info!("收到退出信号");
}
