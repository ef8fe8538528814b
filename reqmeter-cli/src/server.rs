use anyhow::Result;
use axum::{
    extract::Path,
    routing::{get, post},
    Json, Router,
};
use reqmeter_core::{MetricsConfig, Settings};
use reqmeter_layer::{build_metrics_layer, metrics_routes, PrometheusRecorder};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// 创建带指标中间件的演示路由
pub fn create_app(settings: &Settings) -> Result<Router> {
    settings.validate()?;

    let recorder = Arc::new(
        PrometheusRecorder::builder()
            .namespace(settings.metrics.namespace.clone())
            .build()?,
    );

    let config = MetricsConfig::builder()
        .options(settings.metrics.options())
        .recorder(recorder.clone())
        .build();

    let app = Router::new()
        .route("/", get(index))
        .route("/users/{id}", get(get_user))
        .route("/echo", post(echo))
        .layer(build_metrics_layer(settings.server.name.clone(), config)?)
        // 指标端点不经过中间件
        .merge(metrics_routes(&settings.metrics.path, recorder))
        .layer(TraceLayer::new_for_http());

    Ok(app)
}

/// 启动演示服务器
pub async fn serve(settings: Settings, bind_address: Option<String>) -> Result<()> {
    let app = create_app(&settings)?;

    let bind_addr = bind_address.unwrap_or_else(|| settings.server.bind_address.clone());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    let addr = listener.local_addr()?;

    info!("Server '{}' listening on http://{}", settings.server.name, addr);
    info!("Available endpoints:");
    info!("  GET  /              - Index");
    info!("  GET  /users/{{id}}    - Sample resource");
    info!("  POST /echo          - Echo request body");
    info!("  GET  {:<14}  - Prometheus metrics", settings.metrics.path);

    // 设置优雅关闭
    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
        }
        info!("Shutdown signal received");
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
    {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}

async fn index() -> &'static str {
    "reqmeter - HTTP request metrics demo"
}

async fn get_user(Path(id): Path<u64>) -> Json<Value> {
    Json(json!({ "id": id, "name": format!("user-{id}") }))
}

async fn echo(body: String) -> String {
    body
}
