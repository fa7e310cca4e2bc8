//! # ヘルスチェック共通型
//!
//! `/health`（Liveness）と `/health/ready`（Readiness）のレスポンス型。
//! Readiness は User Service が依存する PostgreSQL とユーザーキャッシュの
//! 2 つをチェックする。

use serde::Serialize;

/// Liveness レスポンス
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status:  &'static str,
    pub version: &'static str,
}

impl HealthResponse {
    /// 稼働中を表すレスポンスを作る
    ///
    /// `version` には呼び出し側の `env!("CARGO_PKG_VERSION")` を渡す。
    pub fn healthy(version: &'static str) -> Self {
        Self {
            status: "healthy",
            version,
        }
    }
}

/// 個別チェックの結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Ok,
    Error,
}

/// Readiness 全体のステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessStatus {
    Ready,
    NotReady,
}

/// 依存先ごとのチェック結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReadinessChecks {
    pub database: CheckStatus,
    pub cache:    CheckStatus,
}

/// Readiness レスポンス
///
/// ```
/// use userhub_shared::{CheckStatus, ReadinessChecks, ReadinessResponse, ReadinessStatus};
///
/// let response = ReadinessResponse::from_checks(ReadinessChecks {
///     database: CheckStatus::Ok,
///     cache:    CheckStatus::Error,
/// });
/// assert_eq!(response.status, ReadinessStatus::NotReady);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReadinessResponse {
    pub status: ReadinessStatus,
    pub checks: ReadinessChecks,
}

impl ReadinessResponse {
    /// すべて `Ok` のときだけ `Ready` とする
    pub fn from_checks(checks: ReadinessChecks) -> Self {
        let status = if checks.database == CheckStatus::Ok && checks.cache == CheckStatus::Ok {
            ReadinessStatus::Ready
        } else {
            ReadinessStatus::NotReady
        };
        Self { status, checks }
    }

    pub fn is_ready(&self) -> bool {
        self.status == ReadinessStatus::Ready
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_livenessはステータスとバージョンを返す() {
        let json = serde_json::to_value(HealthResponse::healthy("1.2.3")).unwrap();

        assert_eq!(json, serde_json::json!({ "status": "healthy", "version": "1.2.3" }));
    }

    #[test]
    fn test_全チェックが成功ならready() {
        let response = ReadinessResponse::from_checks(ReadinessChecks {
            database: CheckStatus::Ok,
            cache:    CheckStatus::Ok,
        });

        assert!(response.is_ready());
        assert_eq!(
            serde_json::to_value(response).unwrap(),
            serde_json::json!({
                "status": "ready",
                "checks": { "database": "ok", "cache": "ok" }
            })
        );
    }

    #[test]
    fn test_キャッシュだけ失敗してもnot_ready() {
        let response = ReadinessResponse::from_checks(ReadinessChecks {
            database: CheckStatus::Ok,
            cache:    CheckStatus::Error,
        });

        assert!(!response.is_ready());
        let json = serde_json::to_value(response).unwrap();
        assert_eq!(json["status"], "not_ready");
        assert_eq!(json["checks"]["cache"], "error");
    }
}
