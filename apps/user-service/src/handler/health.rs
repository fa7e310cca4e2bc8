//! # ヘルスチェックハンドラ
//!
//! User Service の稼働状態を確認するためのエンドポイント。
//!
//! - `/health`: Liveness Check（常に `"healthy"` を返す）
//! - `/health/ready`: Readiness Check（DB / キャッシュの接続状態を確認）
//!
//! レスポンス型は [`userhub_shared::HealthResponse`] / [`userhub_shared::ReadinessResponse`] を参照。

use std::{future::Future, sync::Arc, time::Duration};

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sqlx::PgPool;
use userhub_infra::{InfraError, UserCache, db};
use userhub_shared::{CheckStatus, HealthResponse, ReadinessChecks, ReadinessResponse};

/// 各チェックのタイムアウト
const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// User Service のヘルスチェックエンドポイント
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy(env!("CARGO_PKG_VERSION")))
}

/// Readiness Check 用の State
pub struct ReadinessState {
    pub pool:  PgPool,
    pub cache: Arc<dyn UserCache>,
}

/// User Service の Readiness Check エンドポイント
///
/// DB とキャッシュの接続状態を並行チェックする。
/// 全チェック OK → 200、1 つでも失敗 → 503。
#[tracing::instrument(skip_all)]
pub async fn readiness_check(State(state): State<Arc<ReadinessState>>) -> impl IntoResponse {
    let (database, cache) = tokio::join!(
        check("database", db::ping(&state.pool)),
        check("cache", state.cache.ping()),
    );

    let response = ReadinessResponse::from_checks(ReadinessChecks { database, cache });
    let http_status = if response.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (http_status, Json(response))
}

/// 接続確認をタイムアウト付きで実行する
async fn check(
    name: &'static str,
    probe: impl Future<Output = Result<(), InfraError>>,
) -> CheckStatus {
    match tokio::time::timeout(CHECK_TIMEOUT, probe).await {
        Ok(Ok(())) => CheckStatus::Ok,
        Ok(Err(e)) => {
            tracing::warn!(check = name, error = %e, "readiness check failed");
            CheckStatus::Error
        }
        Err(_) => {
            tracing::warn!(check = name, "readiness check timed out");
            CheckStatus::Error
        }
    }
}
