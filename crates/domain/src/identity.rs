//! # 呼び出し元（Identity）
//!
//! 認証サービスが検証したトークンから得られる呼び出し元情報。
//! リクエスト境界（認証ミドルウェア）で一度だけ生成し、ユースケースへ
//! 明示的に渡す。グローバルなセキュリティコンテキストは持たない。
//!
//! ## ロールの正規化
//!
//! 認証サービスは `ADMIN` / `ROLE_ADMIN` のどちらの表記も返しうる。
//! `ROLE_` プレフィックスがなければ付与し、大文字に揃えて保持する。

use serde::{Deserialize, Serialize};

use crate::user::Email;

/// 管理者ロール
pub const ROLE_ADMIN: &str = "ROLE_ADMIN";

/// 正規化済みロール名
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    /// ロール名を正規化して作成する
    ///
    /// 空白のみの場合は `None` を返す。
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_uppercase();
        if value.is_empty() {
            return None;
        }
        if value.starts_with("ROLE_") {
            Some(Self(value))
        } else {
            Some(Self(format!("ROLE_{value}")))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_admin(&self) -> bool {
        self.0 == ROLE_ADMIN
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 認証済みの呼び出し元
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    subject: Email,
    roles:   Vec<Role>,
}

impl Identity {
    pub fn new(subject: Email, roles: Vec<Role>) -> Self {
        Self { subject, roles }
    }

    /// 呼び出し元のメールアドレス（トークンの主体）
    pub fn subject(&self) -> &Email {
        &self.subject
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(Role::is_admin)
    }
}
