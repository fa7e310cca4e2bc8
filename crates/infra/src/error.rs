//! # インフラ層エラー定義
//!
//! PostgreSQL・Redis とのやり取りで発生するエラーを表現する。
//!
//! ## 設計方針
//!
//! - **一意制約違反の識別**: PostgreSQL の `23505` を専用の種別に変換し、
//!   ユースケース層で 409 Conflict に写像できるようにする
//! - **壊れた行の識別**: DB の値がドメインの検証を通らない場合はテーブル名付きで返す
//! - **SpanTrace 自動捕捉**: `From` 実装や constructor でエラー生成時の呼び出し経路を記録する
//!
//! ## 構造
//!
//! - [`InfraError`]: 種別（[`InfraErrorKind`]）と [`SpanTrace`] を保持するラッパー
//! - [`InfraErrorKind`]: Database / UniqueViolation / Redis / CorruptRow / Unexpected

use std::fmt;

use derive_more::Display;
use thiserror::Error;
use tracing_error::SpanTrace;

/// インフラ層で発生するエラー
///
/// ```ignore
/// match error.as_unique_violation() {
///     Some(constraint) => { /* 重複処理 */ }
///     None => { /* その他 */ }
/// }
/// ```
#[derive(Display)]
#[display("{kind}")]
pub struct InfraError {
    kind:       InfraErrorKind,
    span_trace: SpanTrace,
}

/// インフラ層エラーの種別
#[derive(Debug, Error)]
pub enum InfraErrorKind {
    /// SQL の実行失敗や接続エラー（一意制約違反は含まない）
    #[error("データベースエラー: {0}")]
    Database(#[source] sqlx::Error),

    /// 一意制約違反
    ///
    /// 事前チェックをすり抜けた同時書き込みで発生する。
    /// `constraint` は違反した制約名（例: `users_email_key`）。
    #[error("一意制約違反: {constraint}")]
    UniqueViolation { constraint: String },

    /// ユーザーキャッシュ用 Redis のエラー
    #[error("Redis エラー: {0}")]
    Redis(#[source] redis::RedisError),

    /// DB に保存された値がドメインの検証を通らない
    #[error("{table} の行を復元できません: {detail}")]
    CorruptRow { table: &'static str, detail: String },

    #[error("予期しないエラー: {0}")]
    Unexpected(String),
}

impl InfraError {
    pub fn kind(&self) -> &InfraErrorKind {
        &self.kind
    }

    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    /// ログの `error.kind` に使う種別名
    pub fn category(&self) -> &'static str {
        match &self.kind {
            InfraErrorKind::Database(_) => "database",
            InfraErrorKind::UniqueViolation { .. } => "unique_violation",
            InfraErrorKind::Redis(_) => "cache",
            InfraErrorKind::CorruptRow { .. } => "corrupt_row",
            InfraErrorKind::Unexpected(_) => "unexpected",
        }
    }

    /// UniqueViolation の場合、制約名を返す
    pub fn as_unique_violation(&self) -> Option<&str> {
        match &self.kind {
            InfraErrorKind::UniqueViolation { constraint } => Some(constraint),
            _ => None,
        }
    }

    pub fn unique_violation(constraint: impl Into<String>) -> Self {
        Self::with_kind(InfraErrorKind::UniqueViolation {
            constraint: constraint.into(),
        })
    }

    /// 壊れた行のエラーを生成する
    ///
    /// `detail` にはドメインの検証エラーを渡す（値そのものは含めない）。
    pub fn corrupt_row(table: &'static str, detail: impl fmt::Display) -> Self {
        Self::with_kind(InfraErrorKind::CorruptRow {
            table,
            detail: detail.to_string(),
        })
    }

    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::with_kind(InfraErrorKind::Unexpected(msg.into()))
    }

    fn with_kind(kind: InfraErrorKind) -> Self {
        Self {
            kind,
            span_trace: SpanTrace::capture(),
        }
    }
}

impl fmt::Debug for InfraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfraError")
            .field("kind", &self.kind)
            .field("span_trace", &self.span_trace)
            .finish()
    }
}

impl std::error::Error for InfraError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.kind.source()
    }
}

impl From<sqlx::Error> for InfraError {
    fn from(source: sqlx::Error) -> Self {
        if let Some(db_error) = source.as_database_error()
            && db_error.is_unique_violation()
        {
            let constraint = db_error.constraint().unwrap_or("unknown").to_string();
            return Self::unique_violation(constraint);
        }

        Self::with_kind(InfraErrorKind::Database(source))
    }
}

impl From<redis::RedisError> for InfraError {
    fn from(source: redis::RedisError) -> Self {
        Self::with_kind(InfraErrorKind::Redis(source))
    }
}
