//! # Auth Service クライアント
//!
//! User Service から Auth Service へのトークン検証を担当する。
//!
//! ## エンドポイント
//!
//! - `POST /api/auth/validate-token` - Bearer トークンの検証
//!
//! リクエストは受け取った `Authorization: Bearer <token>` ヘッダーを
//! そのまま転送する。レスポンスは以下の形:
//!
//! ```json
//! { "valid": true, "email": "tom@example.com", "role": "ROLE_USER" }
//! ```

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use userhub_domain::{
    identity::{Identity, Role},
    user::Email,
};

/// Auth Service クライアントエラー
#[derive(Debug, Clone, Error)]
pub enum AuthServiceError {
    /// トークンが無効（期限切れ・改ざん・未知の主体）
    #[error("トークンが無効です")]
    InvalidToken,

    /// ネットワークエラー
    #[error("ネットワークエラー: {0}")]
    Network(String),

    /// Auth Service が利用不可（接続失敗・タイムアウト・503）
    #[error("Auth Service が一時的に利用できません")]
    ServiceUnavailable,

    /// 予期しないエラー
    #[error("予期しないエラー: {0}")]
    Unexpected(String),
}

impl From<reqwest::Error> for AuthServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            AuthServiceError::ServiceUnavailable
        } else {
            AuthServiceError::Network(err.to_string())
        }
    }
}

/// トークン検証レスポンス
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateTokenResponse {
    pub valid: bool,
    pub email: Option<String>,
    pub role:  Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl ValidateTokenResponse {
    /// 検証結果を [`Identity`] に変換する
    ///
    /// `valid` が偽、またはメールアドレスが欠落・不正な場合は無効トークン扱い。
    /// ロールは単一の `role` と配列の `roles` の両方を受け付け、正規化する。
    pub fn into_identity(self) -> Result<Identity, AuthServiceError> {
        if !self.valid {
            return Err(AuthServiceError::InvalidToken);
        }
        let email = self
            .email
            .as_deref()
            .and_then(|email| Email::new(email).ok())
            .ok_or(AuthServiceError::InvalidToken)?;

        let mut roles: Vec<Role> = Vec::new();
        for role in self.role.iter().chain(self.roles.iter()) {
            if let Some(role) = Role::parse(role)
                && !roles.contains(&role)
            {
                roles.push(role);
            }
        }

        Ok(Identity::new(email, roles))
    }
}

/// トークン検証トレイト
///
/// テスト時にスタブを使用できるようトレイトで定義。
#[async_trait]
pub trait TokenValidator: Send + Sync {
    /// Bearer トークンを検証し、呼び出し元を返す
    async fn validate(&self, token: &str) -> Result<Identity, AuthServiceError>;
}

/// Auth Service を使うトークン検証の実装
pub struct AuthServiceTokenValidator {
    base_url: String,
    client:   reqwest::Client,
}

impl AuthServiceTokenValidator {
    /// 新しい AuthServiceTokenValidator を作成する
    ///
    /// # 引数
    ///
    /// - `base_url`: Auth Service のベース URL（例: `http://localhost:8080`）
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client:   reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl TokenValidator for AuthServiceTokenValidator {
    #[tracing::instrument(skip_all)]
    async fn validate(&self, token: &str) -> Result<Identity, AuthServiceError> {
        let url = format!("{}/api/auth/validate-token", self.base_url);

        let response = self.client.post(&url).bearer_auth(token).send().await?;

        match response.status() {
            status if status.is_success() => {
                let body = response.json::<ValidateTokenResponse>().await?;
                body.into_identity()
            }
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                Err(AuthServiceError::InvalidToken)
            }
            reqwest::StatusCode::SERVICE_UNAVAILABLE => Err(AuthServiceError::ServiceUnavailable),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(AuthServiceError::Unexpected(format!(
                    "予期しないステータス {}: {}",
                    status, body
                )))
            }
        }
    }
}
