//! Review API 서버 진입점.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::http::{header, Method, StatusCode};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use review_api::repository::{CredentialStore, MemoryCredentialStore, PgCredentialStore};
use review_api::{build_router, setup_metrics_recorder, AppState};
use review_core::{init_logging, AppConfig, DatabaseConfig, KeySource, ServerConfig, SigningKey};

/// CORS 레이어 생성.
///
/// `cors_origins`가 비어 있으면 개발 모드로 간주하여 모든 origin을 허용합니다.
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    let restricted = !origins.is_empty();
    let allow_origin = if restricted {
        info!("CORS configured with {} allowed origins", origins.len());
        AllowOrigin::list(origins)
    } else {
        if !config.cors_origins.is_empty() {
            warn!("cors_origins contains no valid origins, allowing any");
        } else {
            warn!("cors_origins not set, allowing any origin (development mode)");
        }
        AllowOrigin::any()
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        // any origin과 credentials는 함께 쓸 수 없다
        .allow_credentials(restricted)
        .max_age(Duration::from_secs(3600))
}

/// 자격증명 저장소 선택.
///
/// DB URL이 있으면 PostgreSQL(마이그레이션 포함), 없으면 메모리 저장소.
async fn create_store(config: &DatabaseConfig) -> anyhow::Result<Arc<dyn CredentialStore>> {
    let Some(url) = config.url.as_deref() else {
        warn!("database.url not set, using in-memory credential store (data is lost on restart)");
        return Ok(Arc::new(MemoryCredentialStore::new()));
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .connect(url)
        .await
        .context("failed to connect to database")?;
    info!(max_connections = config.max_connections, "Database pool created");

    let store = PgCredentialStore::new(pool);
    store.migrate().await.context("failed to run migrations")?;

    Ok(Arc::new(store))
}

/// OpenAPI 스펙 내보내기.
///
/// `--export-openapi` 플래그가 있으면 스펙을 stdout으로 출력하고 `true`를 반환합니다.
fn export_openapi_requested() -> anyhow::Result<bool> {
    use review_api::openapi::ApiDoc;
    use utoipa::OpenApi as _;

    if !std::env::args().any(|arg| arg == "--export-openapi") {
        return Ok(false);
    }

    let json = serde_json::to_string_pretty(&ApiDoc::openapi())?;
    println!("{}", json);
    Ok(true)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    if export_openapi_requested()? {
        return Ok(());
    }

    let config = AppConfig::load_default().context("failed to load configuration")?;
    init_logging(&config.logging)?;

    info!("Starting Review API server...");

    let metrics_handle = setup_metrics_recorder().context("failed to install metrics recorder")?;
    info!("Prometheus metrics recorder initialized");

    let signing_key = SigningKey::from_setting(config.auth.signing_key.as_deref())
        .context("invalid auth.signing_key")?;
    if signing_key.source() == KeySource::Generated {
        warn!("auth.signing_key not set, generated a per-process key (tokens are invalidated on restart)");
    }

    let store = create_store(&config.database).await?;
    let state = Arc::new(
        AppState::new(&config.auth, &signing_key, store).context("invalid auth configuration")?,
    );
    info!(
        rules = state.policy.rules().len(),
        token_ttl_secs = config.auth.token_ttl_secs,
        store = state.store.backend(),
        "Auth configured"
    );

    let app = build_router(state, Some(metrics_handle))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.server.request_timeout_secs),
        ))
        .layer(cors_layer(&config.server));

    let addr: SocketAddr = config
        .server
        .bind_address()
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.server.bind_address()))?;

    info!("Server listening on {}", addr);
    info!("Swagger UI available at http://{}/swagger-ui", addr);
    info!("Metrics available at http://{}/metrics", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM 시그널을 수신하면 반환합니다.
/// 시그널 핸들러 설치에 실패한 쪽은 대기하지 않습니다.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
