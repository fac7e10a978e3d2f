use std::net::SocketAddr;
use std::time::Duration;

use secrecy::ExposeSecret;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use venuedesk::{
    config::Config, db::ConnectionManager, routes::create_router,
    services::PasswordResetService, state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env があれば読み込む（本番では環境変数を直接設定）
    dotenvy::dotenv().ok();

    // ログ初期化（JSON形式、環境変数でレベル制御）
    init_tracing();

    tracing::info!("venuedesk 起動中...");

    // 設定読み込み
    let config = Config::load().map_err(|e| {
        tracing::error!(error = ?e, "設定の読み込みに失敗");
        anyhow::anyhow!("Failed to load config: {}", e)
    })?;
    config.validate().map_err(|e| {
        tracing::error!(error = %e, "設定が不正です");
        anyhow::anyhow!("Invalid config: {}", e)
    })?;

    tracing::info!(host = %config.host, port = %config.port, "設定読み込み完了");

    // サーバーアドレスを先に構築（config が move される前に）
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| {
            tracing::error!(error = ?e, "アドレスのパースに失敗");
            anyhow::anyhow!("Failed to parse address: {}", e)
        })?;
    let sweep_interval = Duration::from_secs(config.reset_token_sweep_interval_secs);

    // データベース接続（起動時に一度確立しておく）
    let db = ConnectionManager::new(
        config.database_url.expose_secret(),
        config.database_max_connections,
        config.database_acquire_timeout(),
    );
    let pool = db.acquire().await.map_err(|e| {
        anyhow::anyhow!("Failed to connect to database: {}", e)
    })?;

    sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
        tracing::error!(error = ?e, "マイグレーションに失敗");
        anyhow::anyhow!("Failed to run migrations: {}", e)
    })?;

    tracing::info!("マイグレーション完了");

    // AppState 構築
    let state = AppState::new(db.clone(), config).map_err(|e| {
        tracing::error!(error = ?e, "AppState の構築に失敗");
        anyhow::anyhow!("Failed to create AppState: {}", e)
    })?;

    let sweeper = spawn_reset_token_sweeper(state.password_reset_service.clone(), sweep_interval);

    // Router 構築
    let app = create_router(state);

    // サーバー起動
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        tracing::error!(error = ?e, addr = %addr, "ポートのバインドに失敗");
        anyhow::anyhow!("Failed to bind to {}: {}", addr, e)
    })?;

    tracing::info!(addr = %addr, "サーバー起動");

    // Graceful shutdown 対応
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    sweeper.abort();
    db.close().await;

    served.map_err(|e| {
        tracing::error!(error = ?e, "サーバーエラー");
        anyhow::anyhow!("Server error: {}", e)
    })?;

    tracing::info!("サーバー終了");

    Ok(())
}

/// tracing の初期化（JSON形式）
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,venuedesk=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}

/// 期限切れリセットトークンの定期削除
fn spawn_reset_token_sweeper(service: PasswordResetService, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            if let Err(e) = service.purge_expired().await {
                tracing::warn!(error = %e, "期限切れリセットトークンの削除に失敗");
            }
        }
    })
}

/// Graceful shutdown シグナル待機
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = ?e, "Ctrl+C ハンドラーのインストールに失敗");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = ?e, "SIGTERM ハンドラーのインストールに失敗");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl+C received, starting graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("SIGTERM received, starting graceful shutdown");
        }
    }
}
