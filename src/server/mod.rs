//! HTTP接口层：把流水线暴露为 /generate、/find-citations、/health

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::Request,
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::Config;
use crate::storm::StormRunnerFactory;

pub mod error;
pub mod handlers;
pub mod types;

pub use error::ApiError;

const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
pub struct AppState {
    pub factory: Arc<StormRunnerFactory>,
}

impl AppState {
    pub fn new(factory: StormRunnerFactory) -> Self {
        Self {
            factory: Arc::new(factory),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(StormRunnerFactory::from_config(config))
    }
}

pub fn build_app(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/generate", post(handlers::generate))
        .route("/find-citations", post(handlers::find_citations))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(request_span))
        .with_state(state)
}

/// 每个请求一个span，携带生成的请求ID，并回写到响应头
async fn request_span(req: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let span = tracing::info_span!(
        "request",
        id = %request_id,
        method = %req.method(),
        path = %req.uri().path()
    );

    let mut response = next.run(req).instrument(span.clone()).await;
    span.in_scope(|| tracing::debug!("status {}", response.status()));
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// 绑定配置中的地址并运行服务，直到进程退出
pub async fn serve(config: &Config) -> Result<()> {
    let app = build_app(AppState::from_config(config), config.server.max_body_bytes);
    let address = config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    tracing::info!("🌐 服务已启动: http://{}", listener.local_addr()?);
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

pub mod test {
    use std::net::SocketAddr;

    use tokio::net::TcpListener;

    use super::AppState;

    /// 在随机端口上启动服务，返回地址和保持服务存活的句柄
    pub async fn spawn(state: AppState) -> (SocketAddr, tokio::task::JoinHandle<()>) {
        let app = super::build_app(state, 1024 * 1024);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (addr, handle)
    }
}
