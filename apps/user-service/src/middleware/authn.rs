//! # 認証ミドルウェア
//!
//! `Authorization: Bearer <token>` を Auth Service で検証し、呼び出し元
//! [`Identity`] をリクエストの extension に格納する。
//!
//! | 状況 | レスポンス |
//! |------|-----------|
//! | ヘッダーなし・Bearer 以外・空トークン | 401 |
//! | Auth Service がトークンを拒否 | 401 |
//! | Auth Service に接続できない | 503 |
//! | 検証成功 | 後続ハンドラへ（`Extension<Identity>` で取得可能） |
//!
//! ## 使い方
//!
//! ```rust,ignore
//! use axum::middleware::from_fn_with_state;
//!
//! let authn_state = AuthnState { token_validator };
//!
//! Router::new()
//!     .route("/api/users/{id}", get(get_user))
//!     .route_layer(from_fn_with_state(authn_state, require_authentication))
//! ```

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use userhub_domain::identity::Identity;

use crate::{
    client::{AuthServiceError, TokenValidator},
    error::CoreError,
};

/// 認証ミドルウェアの状態
#[derive(Clone)]
pub struct AuthnState {
    pub token_validator: Arc<dyn TokenValidator>,
}

/// 認証ミドルウェア
pub async fn require_authentication(
    State(state): State<AuthnState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = extract_bearer_token(request.headers()) else {
        return CoreError::Unauthorized("Bearer トークンが必要です".to_string()).into_response();
    };

    let identity: Identity = match state.token_validator.validate(token).await {
        Ok(identity) => identity,
        Err(AuthServiceError::InvalidToken) => {
            return CoreError::Unauthorized("トークンが無効です".to_string()).into_response();
        }
        Err(AuthServiceError::ServiceUnavailable) => {
            tracing::warn!(
                error.category = "external_service",
                "Auth Service に接続できません"
            );
            return CoreError::ServiceUnavailable(
                "認証サービスが一時的に利用できません".to_string(),
            )
            .into_response();
        }
        Err(e) => {
            return CoreError::Internal(format!("トークン検証に失敗しました: {e}"))
                .into_response();
        }
    };

    tracing::debug!(is_admin = identity.is_admin(), "トークンを検証しました");
    request.extensions_mut().insert(identity);
    next.run(request).await
}

/// `Authorization` ヘッダーから Bearer トークンを取り出す
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::{
        Extension,
        Router,
        http::{Method, StatusCode},
        middleware::from_fn_with_state,
        routing::get,
    };
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use tower::ServiceExt;
    use userhub_domain::{identity::Role, user::Email};

    use super::*;

    /// 呼び出し元のメールアドレスを返すダミーハンドラ
    async fn whoami(Extension(identity): Extension<Identity>) -> String {
        identity.subject().to_string()
    }

    /// 固定の結果を返すスタブ TokenValidator
    struct StubTokenValidator {
        result: Result<Identity, AuthServiceError>,
    }

    #[async_trait]
    impl TokenValidator for StubTokenValidator {
        async fn validate(&self, token: &str) -> Result<Identity, AuthServiceError> {
            assert_eq!(token, "valid-token");
            self.result.clone()
        }
    }

    fn create_test_app(result: Result<Identity, AuthServiceError>) -> Router {
        let state = AuthnState {
            token_validator: Arc::new(StubTokenValidator { result }),
        };
        Router::new()
            .route("/whoami", get(whoami))
            .route_layer(from_fn_with_state(state, require_authentication))
    }

    fn tom() -> Identity {
        Identity::new(
            Email::new("tom@example.com").unwrap(),
            vec![Role::parse("ROLE_USER").unwrap()],
        )
    }

    fn request_with(authorization: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(Method::GET).uri("/whoami");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_有効なトークンでidentityがハンドラに渡る() {
        let sut = create_test_app(Ok(tom()));

        let response = sut
            .oneshot(request_with(Some("Bearer valid-token")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"tom@example.com");
    }

    #[rstest]
    #[case::ヘッダーなし(None)]
    #[case::bearer以外(Some("Basic dG9tOnNlY3JldA=="))]
    #[case::空トークン(Some("Bearer "))]
    #[tokio::test]
    async fn test_bearerトークンがなければ401(#[case] authorization: Option<&str>) {
        let sut = create_test_app(Ok(tom()));

        let response = sut.oneshot(request_with(authorization)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_無効なトークンは401() {
        let sut = create_test_app(Err(AuthServiceError::InvalidToken));

        let response = sut
            .oneshot(request_with(Some("Bearer valid-token")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_auth_serviceに接続できなければ503() {
        let sut = create_test_app(Err(AuthServiceError::ServiceUnavailable));

        let response = sut
            .oneshot(request_with(Some("Bearer valid-token")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_スキーム名は大文字小文字を区別しない() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "bearer abc".parse().unwrap());

        assert_eq!(extract_bearer_token(&headers), Some("abc"));
    }
}
