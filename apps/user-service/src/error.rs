//! # User Service エラー定義
//!
//! ユースケース層のエラーと、HTTP レスポンスへの変換を定義する。
//!
//! | バリアント | HTTP ステータス |
//! |-----------|----------------|
//! | `Validation` / `BadRequest` | 400 |
//! | `Unauthorized` | 401 |
//! | `Forbidden` | 403 |
//! | `NotFound` | 404 |
//! | `Conflict` | 409 |
//! | `UnsupportedMediaType` | 415 |
//! | `Database` / `Internal` | 500（詳細はログのみ） |
//! | `ServiceUnavailable` | 503 |

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use userhub_domain::DomainError;
use userhub_infra::InfraError;
use userhub_shared::ErrorResponse;

/// User Service で発生するエラー
#[derive(Debug, Error)]
pub enum CoreError {
    /// リソースが見つからない
    #[error("リソースが見つかりません: {0}")]
    NotFound(String),

    /// 入力値の検証失敗
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    /// 不正なリクエスト（JSON やパスの形式不正）
    #[error("不正なリクエスト: {0}")]
    BadRequest(String),

    /// 未認証
    #[error("認証が必要です: {0}")]
    Unauthorized(String),

    /// 権限不足
    #[error("権限がありません: {0}")]
    Forbidden(String),

    /// 重複（一意制約違反）
    #[error("競合が発生しました: {0}")]
    Conflict(String),

    /// Content-Type が JSON ではない
    #[error("サポートされていないメディアタイプ: {0}")]
    UnsupportedMediaType(String),

    /// 依存サービスが利用不可
    #[error("サービスが利用できません: {0}")]
    ServiceUnavailable(String),

    /// データベースエラー
    #[error("データベースエラー: {0}")]
    Database(#[from] InfraError),

    /// 内部エラー
    #[error("内部エラー: {0}")]
    Internal(String),
}

impl From<DomainError> for CoreError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => CoreError::Validation(msg),
        }
    }
}

impl CoreError {
    /// 一意制約違反を Conflict に読み替える
    ///
    /// 事前チェックをすり抜けた同時書き込みは DB の UNIQUE 制約で検出される。
    pub(crate) fn from_unique_violation(err: InfraError, message: &str) -> Self {
        if let Some(constraint) = err.as_unique_violation() {
            tracing::info!(constraint, "一意制約違反を検出しました");
            return CoreError::Conflict(message.to_string());
        }
        CoreError::Database(err)
    }

    fn to_error_response(&self) -> ErrorResponse {
        match self {
            CoreError::NotFound(msg) => ErrorResponse::not_found(msg),
            CoreError::Validation(msg) => ErrorResponse::validation_error(msg),
            CoreError::BadRequest(msg) => ErrorResponse::bad_request(msg),
            CoreError::Unauthorized(msg) => ErrorResponse::unauthorized(msg),
            CoreError::Forbidden(msg) => ErrorResponse::forbidden(msg),
            CoreError::Conflict(msg) => ErrorResponse::conflict(msg),
            CoreError::UnsupportedMediaType(msg) => ErrorResponse::unsupported_media_type(msg),
            CoreError::ServiceUnavailable(msg) => ErrorResponse::service_unavailable(msg),
            CoreError::Database(e) => {
                tracing::error!(
                    error.category = "infrastructure",
                    error.kind = e.category(),
                    span_trace = %e.span_trace(),
                    "データベースエラー: {}",
                    e
                );
                ErrorResponse::internal_error()
            }
            CoreError::Internal(msg) => {
                tracing::error!(
                    error.category = "infrastructure",
                    error.kind = "internal",
                    "内部エラー: {}",
                    msg
                );
                ErrorResponse::internal_error()
            }
        }
    }
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        let body = self.to_error_response();
        let status =
            StatusCode::from_u16(body.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(CoreError::NotFound("x".to_string()), StatusCode::NOT_FOUND)]
    #[case(CoreError::Validation("x".to_string()), StatusCode::BAD_REQUEST)]
    #[case(CoreError::BadRequest("x".to_string()), StatusCode::BAD_REQUEST)]
    #[case(CoreError::Unauthorized("x".to_string()), StatusCode::UNAUTHORIZED)]
    #[case(CoreError::Forbidden("x".to_string()), StatusCode::FORBIDDEN)]
    #[case(CoreError::Conflict("x".to_string()), StatusCode::CONFLICT)]
    #[case(
        CoreError::UnsupportedMediaType("x".to_string()),
        StatusCode::UNSUPPORTED_MEDIA_TYPE
    )]
    #[case(
        CoreError::ServiceUnavailable("x".to_string()),
        StatusCode::SERVICE_UNAVAILABLE
    )]
    #[case(CoreError::Internal("x".to_string()), StatusCode::INTERNAL_SERVER_ERROR)]
    fn test_各エラーが対応するステータスコードになる(
        #[case] error: CoreError,
        #[case] expected: StatusCode,
    ) {
        let response = error.into_response();

        assert_eq!(response.status(), expected);
    }

    #[tokio::test]
    async fn test_内部エラーの詳細はレスポンスに含めない() {
        let response = CoreError::Internal("接続文字列 postgres://secret".to_string()).into_response();

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["status"], 500);
        assert_eq!(json["detail"], "内部エラーが発生しました");
    }

    #[test]
    fn test_一意制約違反はconflictに変換される() {
        let error = CoreError::from_unique_violation(
            InfraError::unique_violation("users_email_key"),
            "このメールアドレスは既に使用されています",
        );

        assert!(matches!(error, CoreError::Conflict(_)));
    }

    #[test]
    fn test_一意制約以外のインフラエラーはdatabaseのまま() {
        let error = CoreError::from_unique_violation(
            InfraError::unexpected("接続断"),
            "このメールアドレスは既に使用されています",
        );

        assert!(matches!(error, CoreError::Database(_)));
    }

    #[test]
    fn test_ドメインの検証エラーはvalidationに変換される() {
        let error: CoreError = DomainError::Validation("名前は必須です".to_string()).into();

        assert!(matches!(error, CoreError::Validation(msg) if msg == "名前は必須です"));
    }
}
