//! # User Service サーバー
//!
//! ユーザーとカードの CRUD を提供する REST API サーバー。
//!
//! ## 構成
//!
//! ```text
//! ┌──────────┐  Bearer  ┌──────────────┐  validate-token  ┌──────────────┐
//! │  Client  │─────────→│ User Service │─────────────────→│ Auth Service │
//! └──────────┘          └──────────────┘                  └──────────────┘
//!                          │        │
//!                          ↓        ↓
//!                   ┌──────────┐ ┌───────┐
//!                   │PostgreSQL│ │ Redis │
//!                   └──────────┘ └───────┘
//! ```
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `USER_SERVICE_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `USER_SERVICE_PORT` | **Yes** | ポート番号 |
//! | `DATABASE_URL` | **Yes** | PostgreSQL 接続 URL |
//! | `AUTH_SERVICE_URL` | No | Auth Service の URL（デフォルト: `http://localhost:8080`） |
//! | `CACHE_BACKEND` | No | `redis` / `noop`（デフォルト: `redis`） |
//! | `REDIS_URL` | No | Redis 接続 URL（デフォルト: `redis://localhost:6379`） |
//! | `CACHE_TTL_SECONDS` | No | キャッシュの有効期限（デフォルト: `600`） |
//! | `LOG_FORMAT` | No | `json` / `pretty`（デフォルト: `pretty`） |
//!
//! ## 起動方法
//!
//! ```bash
//! USER_SERVICE_PORT=8081 DATABASE_URL=postgres://... cargo run -p userhub-user-service
//! ```

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tokio::net::TcpListener;
use userhub_domain::clock::SystemClock;
use userhub_infra::{
    NoopUserCache,
    RedisUserCache,
    UserCache,
    db::{self, PgTransactionManager},
    redis,
    repository::{PostgresCardRepository, PostgresUserRepository},
};
use userhub_shared::observability::TracingConfig;
use userhub_user_service::{
    app_builder::{AppDependencies, build_app},
    client::AuthServiceTokenValidator,
    config::{CacheBackend, ServiceConfig},
};

/// User Service サーバーのエントリーポイント
///
/// 以下の順序で初期化を行う:
///
/// 1. 環境変数の読み込み（.env ファイル）
/// 2. トレーシングの初期化
/// 3. アプリケーション設定の読み込み
/// 4. DB 接続とマイグレーション、キャッシュの初期化
/// 5. ルーターの構築と HTTP サーバーの起動
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    // トレーシング初期化
    let tracing_config = TracingConfig::from_env("user-service");
    userhub_shared::observability::init_tracing(tracing_config);
    let _tracing_guard = tracing::info_span!("app", service = "user-service").entered();

    // 設定読み込み
    let config = ServiceConfig::from_env().context("設定の読み込みに失敗しました")?;

    tracing::info!(
        "User Service サーバーを起動します: {}:{}",
        config.host,
        config.port
    );

    // データベース接続プールを作成し、マイグレーションを適用
    let pool = db::create_pool(&config.database_url)
        .await
        .context("データベース接続に失敗しました")?;
    db::run_migrations(&pool)
        .await
        .context("マイグレーションの適用に失敗しました")?;
    tracing::info!("データベースに接続しました");

    // キャッシュの初期化
    let cache: Arc<dyn UserCache> = match config.cache.backend {
        CacheBackend::Redis => {
            let conn = redis::create_connection_manager(&config.cache.redis_url)
                .await
                .context("Redis への接続に失敗しました")?;
            tracing::info!(ttl_secs = config.cache.ttl.as_secs(), "Redis キャッシュを使用します");
            Arc::new(RedisUserCache::new(conn, config.cache.ttl))
        }
        CacheBackend::Noop => {
            tracing::warn!("キャッシュは無効です（CACHE_BACKEND=noop）");
            Arc::new(NoopUserCache)
        }
    };

    let app = build_app(AppDependencies {
        pool:            pool.clone(),
        user_repository: Arc::new(PostgresUserRepository::new(pool.clone())),
        card_repository: Arc::new(PostgresCardRepository::new(pool.clone())),
        tx_manager:      Arc::new(PgTransactionManager::new(pool)),
        cache,
        token_validator: Arc::new(AuthServiceTokenValidator::new(&config.auth_service_url)),
        clock:           Arc::new(SystemClock),
    });

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("アドレスのパースに失敗しました")?;

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("User Service サーバーが起動しました: {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
